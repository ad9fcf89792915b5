//! Schema definitions and migration runner for SurrealDB.
//!
//! All table definitions use SCHEMAFULL mode. UUIDs are used as record
//! keys. Enums are stored as strings with ASSERT constraints.

use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use tracing::info;

use crate::error::DbError;

// -----------------------------------------------------------------------
// Migration tracking
// -----------------------------------------------------------------------

const MIGRATION_TABLE_DDL: &str = "\
DEFINE TABLE IF NOT EXISTS _migration SCHEMAFULL;
DEFINE FIELD IF NOT EXISTS version ON TABLE _migration TYPE int;
DEFINE FIELD IF NOT EXISTS name ON TABLE _migration TYPE string;
DEFINE FIELD IF NOT EXISTS applied_at ON TABLE _migration TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX IF NOT EXISTS idx_migration_version ON TABLE _migration \
    COLUMNS version UNIQUE;
";

#[derive(Debug, SurrealValue)]
struct MigrationRecord {
    version: u32,
    #[allow(dead_code)]
    name: String,
}

struct Migration {
    version: u32,
    name: &'static str,
    sql: &'static str,
}

static MIGRATIONS: &[Migration] = &[Migration {
    version: 1,
    name: "initial_schema",
    sql: SCHEMA_V1,
}];

// -----------------------------------------------------------------------
// Schema v1
// -----------------------------------------------------------------------

const SCHEMA_V1: &str = "\
-- =======================================================================
-- Identities
-- =======================================================================
DEFINE TABLE identity SCHEMAFULL;
DEFINE FIELD name ON TABLE identity TYPE string;
DEFINE FIELD email ON TABLE identity TYPE string;
DEFINE FIELD password_hash ON TABLE identity TYPE string;
DEFINE FIELD role ON TABLE identity TYPE string \
    ASSERT $value IN ['supervisor', 'technician', 'hod', 'super_admin'];
DEFINE FIELD technician_category ON TABLE identity TYPE option<string> \
    ASSERT $value = NONE OR $value IN ['plumber', 'electrician', 'ict', \
    'carpenter', 'ac_fridge'];
DEFINE FIELD department ON TABLE identity TYPE string;
DEFINE FIELD lifecycle_state ON TABLE identity TYPE string \
    ASSERT $value IN ['pending', 'active', 'deactivated'];
DEFINE FIELD created_at ON TABLE identity TYPE datetime \
    DEFAULT time::now() READONLY;
DEFINE FIELD updated_at ON TABLE identity TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_identity_email ON TABLE identity \
    COLUMNS email UNIQUE;
DEFINE INDEX idx_identity_state ON TABLE identity \
    COLUMNS lifecycle_state;

-- =======================================================================
-- Bootstrap marker (at most one record, `bootstrap:admin`)
-- =======================================================================
DEFINE TABLE bootstrap SCHEMAFULL;
DEFINE FIELD claimed_at ON TABLE bootstrap TYPE datetime \
    DEFAULT time::now();

-- =======================================================================
-- Sessions
-- =======================================================================
DEFINE TABLE session SCHEMAFULL;
DEFINE FIELD identity_id ON TABLE session TYPE string;
DEFINE FIELD token_hash ON TABLE session TYPE string;
DEFINE FIELD expires_at ON TABLE session TYPE datetime;
DEFINE FIELD created_at ON TABLE session TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_session_token ON TABLE session \
    COLUMNS token_hash UNIQUE;
DEFINE INDEX idx_session_identity ON TABLE session \
    COLUMNS identity_id;
";

/// Run all pending migrations against the database.
///
/// Creates a `_migration` tracking table on first run, then applies
/// each migration whose version exceeds the current maximum.
pub async fn run_migrations<C: Connection>(db: &Surreal<C>) -> Result<(), DbError> {
    db.query(MIGRATION_TABLE_DDL)
        .await?
        .check()
        .map_err(|e| DbError::Migration(e.to_string()))?;

    let mut result = db
        .query("SELECT * FROM _migration ORDER BY version DESC LIMIT 1")
        .await?;
    let records: Vec<MigrationRecord> = result.take(0)?;
    let current_version = records.first().map(|m| m.version).unwrap_or(0);

    for migration in MIGRATIONS {
        if migration.version > current_version {
            info!(
                version = migration.version,
                name = migration.name,
                "Applying migration"
            );
            db.query(migration.sql).await?.check().map_err(|e| {
                DbError::Migration(format!(
                    "Migration v{} '{}' failed: {}",
                    migration.version, migration.name, e,
                ))
            })?;

            db.query(
                "CREATE _migration SET version = $version, \
                 name = $name",
            )
            .bind(("version", migration.version))
            .bind(("name", migration.name))
            .await?
            .check()
            .map_err(|e| {
                DbError::Migration(format!(
                    "Failed to record migration v{}: {}",
                    migration.version, e,
                ))
            })?;

            info!(version = migration.version, "Migration applied");
        }
    }

    Ok(())
}

/// Returns the raw schema DDL for version 1.
pub fn schema_v1() -> &'static str {
    SCHEMA_V1
}
