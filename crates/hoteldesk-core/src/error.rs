//! Error types for the hoteldesk system.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DeskError {
    #[error("Validation error on {field}: {message}")]
    Validation { field: String, message: String },

    #[error("An identity with this email already exists")]
    DuplicateEmail,

    /// Covers unknown email, wrong password, and non-active accounts
    /// alike. Carries no reason so callers cannot tell them apart.
    #[error("Authentication failed")]
    AuthenticationFailed,

    #[error("Not authorized: {reason}")]
    NotAuthorized { reason: String },

    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: String, id: String },

    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[error("Cryptography error: {0}")]
    Crypto(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type DeskResult<T> = Result<T, DeskError>;

/// Coarse classification of a [`DeskError`], used by the presentation
/// layer to pick between inline feedback and a retry affordance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    ValidationFailed,
    DuplicateEmail,
    AuthenticationFailed,
    NotAuthorized,
    NotFound,
    Unavailable,
}

impl DeskError {
    /// Shorthand for a field-level validation failure.
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn not_authorized(reason: impl Into<String>) -> Self {
        Self::NotAuthorized {
            reason: reason.into(),
        }
    }

    pub fn not_found(entity: impl Into<String>, id: impl ToString) -> Self {
        Self::NotFound {
            entity: entity.into(),
            id: id.to_string(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation { .. } => ErrorKind::ValidationFailed,
            Self::DuplicateEmail => ErrorKind::DuplicateEmail,
            Self::AuthenticationFailed => ErrorKind::AuthenticationFailed,
            Self::NotAuthorized { .. } => ErrorKind::NotAuthorized,
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::Unavailable(_) | Self::Crypto(_) | Self::Internal(_) => ErrorKind::Unavailable,
        }
    }

    /// Whether the failure is transient and worth retrying.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Unavailable(_))
    }

    /// Message safe to show an end user. Validation errors keep their
    /// field-level reason; everything else is generic.
    pub fn user_message(&self) -> String {
        match self {
            Self::Validation { message, .. } => message.clone(),
            Self::DuplicateEmail => "Cannot register with this email address.".into(),
            Self::AuthenticationFailed => "Invalid email or password.".into(),
            Self::NotAuthorized { .. } => "You do not have access to this action.".into(),
            Self::NotFound { .. } => "The requested user could not be found.".into(),
            Self::Unavailable(_) | Self::Crypto(_) | Self::Internal(_) => {
                "The service is temporarily unavailable. Please try again.".into()
            }
        }
    }
}
