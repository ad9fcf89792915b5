//! Process configuration from `HOTELDESK_*` environment variables.

use std::str::FromStr;
use std::time::Duration;

use hoteldesk_auth::AuthConfig;
use hoteldesk_db::DbConfig;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{var} has an invalid value: {value:?}")]
    Invalid { var: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub db: DbConfig,
    pub auth: AuthConfig,
    /// How often expired sessions are swept.
    pub session_sweep_interval: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            db: DbConfig::default(),
            auth: AuthConfig::default(),
            session_sweep_interval: Duration::from_secs(900),
        }
    }
}

impl ServerConfig {
    /// Read the process environment over the defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(v) = lookup("HOTELDESK_DB_URL") {
            config.db.url = v;
        }
        if let Some(v) = lookup("HOTELDESK_DB_NAMESPACE") {
            config.db.namespace = v;
        }
        if let Some(v) = lookup("HOTELDESK_DB_DATABASE") {
            config.db.database = v;
        }
        if let Some(v) = lookup("HOTELDESK_DB_USERNAME") {
            config.db.username = v;
        }
        if let Some(v) = lookup("HOTELDESK_DB_PASSWORD") {
            config.db.password = v;
        }

        config.auth.pepper = lookup("HOTELDESK_PEPPER").filter(|p| !p.is_empty());
        if let Some(n) = parsed(&lookup, "HOTELDESK_MIN_PASSWORD_LENGTH")? {
            config.auth.min_password_length = n;
        }
        if let Some(secs) = parsed(&lookup, "HOTELDESK_SESSION_LIFETIME_SECS")? {
            config.auth.session_lifetime_secs = secs;
        }
        if let Some(flag) = parsed(&lookup, "HOTELDESK_REVOKE_SESSIONS_ON_DEACTIVATE")? {
            config.auth.revoke_sessions_on_deactivate = flag;
        }
        if let Some(secs) = parsed::<u64>(&lookup, "HOTELDESK_SESSION_SWEEP_SECS")? {
            if secs == 0 {
                return Err(ConfigError::Invalid {
                    var: "HOTELDESK_SESSION_SWEEP_SECS",
                    value: secs.to_string(),
                });
            }
            config.session_sweep_interval = Duration::from_secs(secs);
        }

        Ok(config)
    }
}

fn parsed<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    var: &'static str,
) -> Result<Option<T>, ConfigError> {
    match lookup(var) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::Invalid { var, value: raw }),
    }
}
