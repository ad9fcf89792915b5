//! hoteldesk: application entry point.

mod config;

use std::process::ExitCode;

use hoteldesk_auth::IdentityService;
use hoteldesk_core::error::DeskError;
use hoteldesk_db::repository::{SurrealIdentityRepository, SurrealSessionRepository};
use hoteldesk_db::{DbError, DbManager, run_migrations};
use thiserror::Error;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use crate::config::{ConfigError, ServerConfig};

#[derive(Debug, Error)]
enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("database connection failed: {0}")]
    Connect(String),

    #[error(transparent)]
    Migration(#[from] DbError),

    #[error(transparent)]
    Service(#[from] DeskError),

    #[error("signal handler failed: {0}")]
    Signal(#[from] std::io::Error),
}

#[tokio::main]
async fn main() -> ExitCode {
    // A missing .env file is fine.
    let dotenv = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("hoteldesk=info")),
        )
        .json()
        .init();

    if let Ok(path) = dotenv {
        info!(path = %path.display(), "Loaded environment file");
    }

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "hoteldesk stopped with an error");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<(), StartupError> {
    let config = ServerConfig::from_env()?;
    info!("Starting hoteldesk...");

    let db = DbManager::connect(&config.db)
        .await
        .map_err(|e| StartupError::Connect(e.to_string()))?;
    run_migrations(db.client()).await?;

    let identities = match config.auth.pepper.clone() {
        Some(pepper) => SurrealIdentityRepository::with_pepper(db.client().clone(), pepper),
        None => SurrealIdentityRepository::new(db.client().clone()),
    };
    let sessions = SurrealSessionRepository::new(db.client().clone());
    let service = IdentityService::new(identities, sessions, config.auth.clone());

    info!(
        session_lifetime_secs = service.config().session_lifetime_secs,
        revoke_sessions_on_deactivate = service.config().revoke_sessions_on_deactivate,
        "hoteldesk ready"
    );

    // First tick fires immediately.
    let mut sweep = tokio::time::interval(config.session_sweep_interval);
    loop {
        tokio::select! {
            _ = sweep.tick() => {
                if let Err(e) = service.purge_expired_sessions().await {
                    if e.is_transient() {
                        warn!(error = %e, "Session sweep failed, will retry");
                    } else {
                        return Err(e.into());
                    }
                }
            }
            signal = tokio::signal::ctrl_c() => {
                signal?;
                break;
            }
        }
    }

    info!("hoteldesk stopped.");
    Ok(())
}
