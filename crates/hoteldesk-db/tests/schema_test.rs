//! Integration tests for schema initialization using in-memory SurrealDB.

use surrealdb::Surreal;
use surrealdb::engine::local::Mem;

#[tokio::test]
async fn schema_migration_applies_successfully() {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();

    hoteldesk_db::run_migrations(&db).await.unwrap();

    let mut result = db.query("INFO FOR DB").await.unwrap();
    let info: Option<surrealdb_types::Value> = result.take(0).unwrap();
    let info = info.expect("INFO FOR DB should return a value");
    let info_str = format!("{:?}", info);

    assert!(info_str.contains("identity"), "missing identity table");
    assert!(info_str.contains("session"), "missing session table");
    assert!(info_str.contains("bootstrap"), "missing bootstrap table");
}

#[tokio::test]
async fn migrations_are_idempotent() {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();

    hoteldesk_db::run_migrations(&db).await.unwrap();
    hoteldesk_db::run_migrations(&db).await.unwrap();
}

#[tokio::test]
async fn schema_rejects_unknown_role() {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    hoteldesk_db::run_migrations(&db).await.unwrap();

    let result = db
        .query(
            "CREATE identity SET name = 'Mallory', email = 'm@hotel.test', \
             password_hash = 'x', role = 'owner', department = 'IT', \
             lifecycle_state = 'active'",
        )
        .await
        .unwrap()
        .check();

    assert!(result.is_err(), "role outside the enumeration must be rejected");
}
