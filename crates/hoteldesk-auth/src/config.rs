//! Authentication configuration.

/// Configuration for the identity service.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// Optional pepper prepended to passwords before Argon2id
    /// verification. Must match the pepper the identity store hashes
    /// with.
    pub pepper: Option<String>,
    /// Minimum password length, in characters (default: 6).
    pub min_password_length: usize,
    /// Session lifetime in seconds (default: 43_200 = 12 hours).
    pub session_lifetime_secs: u64,
    /// Delete a target's sessions as soon as it is deactivated. When
    /// false, the session is dropped the next time it is resolved.
    pub revoke_sessions_on_deactivate: bool,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            pepper: None,
            min_password_length: 6,
            session_lifetime_secs: 43_200,
            revoke_sessions_on_deactivate: false,
        }
    }
}
