//! Integration tests for the Identity repository using in-memory SurrealDB.

use argon2::{Argon2, PasswordHash, PasswordVerifier};
use hoteldesk_core::error::DeskError;
use hoteldesk_core::models::identity::{
    CreateIdentity, LifecycleState, Role, TechnicianCategory, UpdateIdentity,
};
use hoteldesk_core::repository::{IdentityFilter, IdentityRepository, Pagination};
use hoteldesk_db::repository::SurrealIdentityRepository;
use surrealdb::Surreal;
use surrealdb::engine::local::{Db, Mem};

/// Helper: spin up in-memory DB and run migrations.
async fn setup() -> Surreal<Db> {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    hoteldesk_db::run_migrations(&db).await.unwrap();
    db
}

fn new_identity(name: &str, email: &str, role: Role) -> CreateIdentity {
    CreateIdentity {
        name: name.into(),
        email: email.into(),
        password: "housekeeping".into(),
        role,
        technician_category: (role == Role::Technician).then_some(TechnicianCategory::Plumber),
        department: "Maintenance".into(),
        lifecycle_state: LifecycleState::Pending,
    }
}

fn verifies(password: &str, hash: &str, pepper: Option<&str>) -> bool {
    let input = match pepper {
        Some(p) => format!("{p}{password}"),
        None => password.to_string(),
    };
    let parsed = PasswordHash::new(hash).unwrap();
    Argon2::default()
        .verify_password(input.as_bytes(), &parsed)
        .is_ok()
}

#[tokio::test]
async fn create_and_get_identity() {
    let repo = SurrealIdentityRepository::new(setup().await);

    let identity = repo
        .create(new_identity("Bob", "bob@hotel.test", Role::Technician))
        .await
        .unwrap();

    assert_eq!(identity.name, "Bob");
    assert_eq!(identity.email, "bob@hotel.test");
    assert_eq!(identity.role, Role::Technician);
    assert_eq!(
        identity.technician_category,
        Some(TechnicianCategory::Plumber)
    );
    assert_eq!(identity.lifecycle_state, LifecycleState::Pending);

    let fetched = repo.get_by_id(identity.id).await.unwrap();
    assert_eq!(fetched, identity);

    let by_email = repo.get_by_email("bob@hotel.test").await.unwrap();
    assert_eq!(by_email.id, identity.id);
}

#[tokio::test]
async fn password_is_hashed() {
    let repo = SurrealIdentityRepository::new(setup().await);

    repo.create(new_identity("Carol", "carol@hotel.test", Role::Hod))
        .await
        .unwrap();

    let creds = repo.get_credentials("carol@hotel.test").await.unwrap();
    assert_ne!(creds.password_hash, "housekeeping");
    assert!(creds.password_hash.starts_with("$argon2id$"));
    assert!(verifies("housekeeping", &creds.password_hash, None));
    assert!(!verifies("wrong", &creds.password_hash, None));
}

#[tokio::test]
async fn password_with_pepper() {
    let repo = SurrealIdentityRepository::with_pepper(setup().await, "lobby-pepper".into());

    repo.create(new_identity("Dave", "dave@hotel.test", Role::Supervisor))
        .await
        .unwrap();

    let creds = repo.get_credentials("dave@hotel.test").await.unwrap();
    assert!(verifies("housekeeping", &creds.password_hash, Some("lobby-pepper")));
    assert!(!verifies("housekeeping", &creds.password_hash, None));
}

#[tokio::test]
async fn duplicate_email_rejected_by_index() {
    let repo = SurrealIdentityRepository::new(setup().await);

    repo.create(new_identity("Eve", "eve@hotel.test", Role::Supervisor))
        .await
        .unwrap();

    let err = repo
        .create(new_identity("Eve Again", "eve@hotel.test", Role::Hod))
        .await
        .unwrap_err();

    assert!(
        matches!(err, DeskError::DuplicateEmail),
        "expected DuplicateEmail, got: {err:?}"
    );
    assert_eq!(repo.count(IdentityFilter::default()).await.unwrap(), 1);
}

#[tokio::test]
async fn concurrent_inserts_for_same_email_yield_one_record() {
    let repo = SurrealIdentityRepository::new(setup().await);

    let (a, b) = tokio::join!(
        repo.create(new_identity("Frank", "frank@hotel.test", Role::Supervisor)),
        repo.create(new_identity("Frank", "frank@hotel.test", Role::Supervisor)),
    );

    let outcomes = [a, b];
    let created = outcomes.iter().filter(|r| r.is_ok()).count();
    assert_eq!(created, 1);
    assert!(
        outcomes
            .iter()
            .filter_map(|r| r.as_ref().err())
            .all(|e| matches!(e, DeskError::DuplicateEmail))
    );
    assert_eq!(repo.count(IdentityFilter::default()).await.unwrap(), 1);
}

#[tokio::test]
async fn update_identity() {
    let repo = SurrealIdentityRepository::new(setup().await);

    let identity = repo
        .create(new_identity("Grace", "grace@hotel.test", Role::Technician))
        .await
        .unwrap();

    let updated = repo
        .update(
            identity.id,
            UpdateIdentity {
                role: Some(Role::Hod),
                technician_category: Some(None),
                lifecycle_state: Some(LifecycleState::Active),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(updated.role, Role::Hod);
    assert_eq!(updated.technician_category, None);
    assert_eq!(updated.lifecycle_state, LifecycleState::Active);
    assert_eq!(updated.department, "Maintenance"); // unchanged
    assert_eq!(updated.created_at, identity.created_at);
}

#[tokio::test]
async fn update_missing_identity_is_not_found() {
    let repo = SurrealIdentityRepository::new(setup().await);

    let err = repo
        .update(
            uuid::Uuid::new_v4(),
            UpdateIdentity {
                department: Some("Spa".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();

    assert!(matches!(err, DeskError::NotFound { .. }));
}

#[tokio::test]
async fn delete_removes_record() {
    let repo = SurrealIdentityRepository::new(setup().await);

    let identity = repo
        .create(new_identity("Heidi", "heidi@hotel.test", Role::Supervisor))
        .await
        .unwrap();

    repo.delete(identity.id).await.unwrap();

    assert!(matches!(
        repo.get_by_id(identity.id).await,
        Err(DeskError::NotFound { .. })
    ));
    assert!(matches!(
        repo.delete(identity.id).await,
        Err(DeskError::NotFound { .. })
    ));

    // The email is free again.
    repo.create(new_identity("Heidi", "heidi@hotel.test", Role::Supervisor))
        .await
        .unwrap();
}

#[tokio::test]
async fn list_with_filters_and_pagination() {
    let repo = SurrealIdentityRepository::new(setup().await);

    for i in 0..4 {
        repo.create(new_identity(
            &format!("Tech {i}"),
            &format!("tech-{i}@hotel.test"),
            Role::Technician,
        ))
        .await
        .unwrap();
    }
    let ivan = repo
        .create(new_identity("Ivan Supervisor", "ivan@hotel.test", Role::Supervisor))
        .await
        .unwrap();
    repo.update(
        ivan.id,
        UpdateIdentity {
            lifecycle_state: Some(LifecycleState::Active),
            ..Default::default()
        },
    )
    .await
    .unwrap();

    let page1 = repo
        .list(
            IdentityFilter::default(),
            Pagination {
                offset: 0,
                limit: 3,
            },
        )
        .await
        .unwrap();
    assert_eq!(page1.items.len(), 3);
    assert_eq!(page1.total, 5);

    let page2 = repo
        .list(
            IdentityFilter::default(),
            Pagination {
                offset: 3,
                limit: 3,
            },
        )
        .await
        .unwrap();
    assert_eq!(page2.items.len(), 2);

    let technicians = repo
        .list(
            IdentityFilter {
                role: Some(Role::Technician),
                ..Default::default()
            },
            Pagination::default(),
        )
        .await
        .unwrap();
    assert_eq!(technicians.total, 4);

    let active = repo
        .list(
            IdentityFilter::state(LifecycleState::Active),
            Pagination::default(),
        )
        .await
        .unwrap();
    assert_eq!(active.total, 1);
    assert_eq!(active.items[0].id, ivan.id);

    let search = repo
        .list(
            IdentityFilter {
                search: Some("SUPERVISOR".into()),
                ..Default::default()
            },
            Pagination::default(),
        )
        .await
        .unwrap();
    assert_eq!(search.total, 1);

    let by_email = repo
        .count(IdentityFilter {
            search: Some("tech-2@".into()),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(by_email, 1);
}

fn first_admin(name: &str, email: &str) -> CreateIdentity {
    CreateIdentity {
        lifecycle_state: LifecycleState::Active,
        ..new_identity(name, email, Role::SuperAdmin)
    }
}

#[tokio::test]
async fn bootstrap_admin_is_created_once() {
    let repo = SurrealIdentityRepository::new(setup().await);

    let admin = repo
        .create_bootstrap(first_admin("Judy", "judy@hotel.test"))
        .await
        .unwrap()
        .expect("first call takes the slot");
    assert_eq!(admin.role, Role::SuperAdmin);
    assert_eq!(admin.lifecycle_state, LifecycleState::Active);
    assert_eq!(repo.get_by_id(admin.id).await.unwrap(), admin);

    let second = repo
        .create_bootstrap(first_admin("Ken", "ken@hotel.test"))
        .await
        .unwrap();
    assert!(second.is_none());
    assert_eq!(repo.count(IdentityFilter::default()).await.unwrap(), 1);

    // Deleting the admin does not reopen the slot.
    repo.delete(admin.id).await.unwrap();
    assert!(
        repo.create_bootstrap(first_admin("Ken", "ken@hotel.test"))
            .await
            .unwrap()
            .is_none()
    );
}

#[tokio::test]
async fn failed_bootstrap_insert_leaves_slot_free() {
    let repo = SurrealIdentityRepository::new(setup().await);
    repo.create(new_identity("Liam", "liam@hotel.test", Role::Supervisor))
        .await
        .unwrap();

    let err = repo
        .create_bootstrap(first_admin("Liam", "liam@hotel.test"))
        .await
        .unwrap_err();
    assert!(
        matches!(err, DeskError::DuplicateEmail),
        "expected DuplicateEmail, got: {err:?}"
    );
    assert_eq!(repo.count(IdentityFilter::default()).await.unwrap(), 1);

    // The cancelled transaction did not keep the claim.
    let admin = repo
        .create_bootstrap(first_admin("Mia", "mia@hotel.test"))
        .await
        .unwrap();
    assert!(admin.is_some());
}

#[tokio::test]
async fn concurrent_bootstrap_yields_one_admin() {
    let repo = SurrealIdentityRepository::new(setup().await);

    let (a, b) = tokio::join!(
        repo.create_bootstrap(first_admin("Nina", "nina@hotel.test")),
        repo.create_bootstrap(first_admin("Omar", "omar@hotel.test")),
    );
    let created = [a.unwrap(), b.unwrap()]
        .into_iter()
        .filter(Option::is_some)
        .count();
    assert_eq!(created, 1);
    assert_eq!(repo.count(IdentityFilter::default()).await.unwrap(), 1);
}
