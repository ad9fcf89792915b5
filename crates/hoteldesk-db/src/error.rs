//! Database-specific error types and conversions.

use hoteldesk_core::error::DeskError;

/// Database-layer error type.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("SurrealDB error: {0}")]
    Surreal(#[from] surrealdb::Error),

    #[error("Migration failed: {0}")]
    Migration(String),

    /// A statement the store refused, e.g. a failed ASSERT.
    #[error("Statement rejected: {0}")]
    Rejected(String),

    #[error("Record not found: {entity} with id {id}")]
    NotFound { entity: String, id: String },

    #[error("Malformed record: {0}")]
    Decode(String),

    #[error("Password hashing failed: {0}")]
    Hash(String),
}

impl From<DbError> for DeskError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => DeskError::NotFound { entity, id },
            DbError::Hash(msg) => DeskError::Crypto(msg),
            DbError::Decode(msg) | DbError::Rejected(msg) => DeskError::Internal(msg),
            other => DeskError::Unavailable(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_is_preserved() {
        let err: DeskError = DbError::NotFound {
            entity: "identity".into(),
            id: "abc".into(),
        }
        .into();
        assert!(matches!(err, DeskError::NotFound { ref entity, .. } if entity == "identity"));
    }

    #[test]
    fn store_faults_are_transient() {
        let err: DeskError = DbError::Migration("boom".into()).into();
        assert!(err.is_transient());
    }

    #[test]
    fn rejected_statements_are_not_retried() {
        let err: DeskError = DbError::Rejected("assert failed".into()).into();
        assert!(!err.is_transient());
    }
}
