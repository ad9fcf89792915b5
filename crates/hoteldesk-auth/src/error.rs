//! Authentication error types.

use hoteldesk_core::error::DeskError;
use thiserror::Error;

/// The internal cause of a failed sign-in or session lookup. Only ever
/// logged; callers see [`DeskError::AuthenticationFailed`].
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("account is pending approval")]
    AccountPending,

    #[error("account is deactivated")]
    AccountDeactivated,

    #[error("session has expired")]
    SessionExpired,

    #[error("session is invalid")]
    SessionInvalid,

    #[error("cryptography error: {0}")]
    Crypto(String),
}

impl From<AuthError> for DeskError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidCredentials
            | AuthError::AccountPending
            | AuthError::AccountDeactivated
            | AuthError::SessionExpired
            | AuthError::SessionInvalid => DeskError::AuthenticationFailed,
            AuthError::Crypto(msg) => DeskError::Crypto(msg),
        }
    }
}
