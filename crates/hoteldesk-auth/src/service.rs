//! Identity service: registration, login, logout and session
//! resolution.
//!
//! Administrative operations live in [`crate::admin`].

use std::fmt;

use chrono::{DateTime, TimeDelta, Utc};
use hoteldesk_core::error::{DeskError, DeskResult};
use hoteldesk_core::models::identity::{
    CreateIdentity, Identity, LifecycleState, Role, TechnicianCategory, check_role_category,
};
use hoteldesk_core::models::session::CreateSession;
use hoteldesk_core::repository::{IdentityRepository, SessionRepository};
use hoteldesk_core::validation;
use tracing::{debug, info};
use uuid::Uuid;

use crate::config::AuthConfig;
use crate::error::AuthError;
use crate::password;
use crate::token;

/// Input for self-registration.
#[derive(Clone)]
pub struct RegisterInput {
    pub name: String,
    pub email: String,
    pub password: String,
    pub role: Role,
    pub technician_category: Option<TechnicianCategory>,
    pub department: String,
}

impl fmt::Debug for RegisterInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegisterInput")
            .field("name", &self.name)
            .field("email", &self.email)
            .field("role", &self.role)
            .field("technician_category", &self.technician_category)
            .field("department", &self.department)
            .finish_non_exhaustive()
    }
}

/// Input for the login flow.
#[derive(Clone)]
pub struct LoginInput {
    pub email: String,
    pub password: String,
}

impl fmt::Debug for LoginInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginInput")
            .field("email", &self.email)
            .finish_non_exhaustive()
    }
}

/// Successful login result.
#[derive(Debug)]
pub struct LoginOutput {
    /// Raw opaque session token (return to client, not stored).
    pub session_token: String,
    pub session_id: Uuid,
    pub expires_at: DateTime<Utc>,
    /// The signed-in identity, as of login time.
    pub identity: Identity,
}

/// A session re-validated against the identity store.
#[derive(Debug, Clone)]
pub struct ResolvedSession {
    pub session_id: Uuid,
    pub expires_at: DateTime<Utc>,
    /// Freshly fetched; reflects any role or profile change made since
    /// login.
    pub identity: Identity,
}

/// The identity & access manager.
///
/// Generic over repository implementations so that the auth layer
/// has no dependency on the database crate.
pub struct IdentityService<I: IdentityRepository, S: SessionRepository> {
    pub(crate) identities: I,
    pub(crate) sessions: S,
    pub(crate) config: AuthConfig,
}

impl<I: IdentityRepository, S: SessionRepository> IdentityService<I, S> {
    pub fn new(identities: I, sessions: S, config: AuthConfig) -> Self {
        Self {
            identities,
            sessions,
            config,
        }
    }

    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    /// Register a new identity.
    ///
    /// The first identity ever registered becomes an active
    /// `super_admin` regardless of the requested role. Everyone after
    /// that keeps the requested role and waits in `pending` for an
    /// admin. Never signs anyone in.
    pub async fn register(&self, input: RegisterInput) -> DeskResult<Identity> {
        let name = validation::require_text("name", &input.name)?;
        let department = validation::require_text("department", &input.department)?;
        let email = validation::normalize_email(&input.email);
        validation::validate_email(&email)?;
        validation::validate_password(&input.password, self.config.min_password_length)?;
        check_role_category(input.role, input.technician_category)?;

        // Fast path; the unique index still decides under a race.
        match self.identities.get_by_email(&email).await {
            Ok(_) => return Err(DeskError::DuplicateEmail),
            Err(DeskError::NotFound { .. }) => {}
            Err(e) => return Err(e),
        }

        let pending = CreateIdentity {
            name,
            email,
            password: input.password,
            role: input.role,
            technician_category: input.technician_category,
            department,
            lifecycle_state: LifecycleState::Pending,
        };
        let first_admin = CreateIdentity {
            role: Role::SuperAdmin,
            technician_category: None,
            lifecycle_state: LifecycleState::Active,
            ..pending.clone()
        };

        let (identity, bootstrap) = match self.identities.create_bootstrap(first_admin).await? {
            Some(admin) => (admin, true),
            None => (self.identities.create(pending).await?, false),
        };

        info!(
            identity_id = %identity.id,
            role = %identity.role,
            state = %identity.lifecycle_state,
            bootstrap,
            "Identity registered"
        );

        Ok(identity)
    }

    /// Authenticate with email + password and open a session.
    ///
    /// Unknown email, wrong password, and a pending or deactivated
    /// account all fail with the same [`DeskError::AuthenticationFailed`].
    pub async fn login(&self, input: LoginInput) -> DeskResult<LoginOutput> {
        let email = validation::normalize_email(&input.email);

        // 1. Look up credentials.
        let credentials = match self.identities.get_credentials(&email).await {
            Ok(c) => c,
            Err(DeskError::NotFound { .. }) => {
                password::verify_dummy(&input.password);
                debug!("Login rejected: unknown email");
                return Err(AuthError::InvalidCredentials.into());
            }
            Err(e) => return Err(e),
        };
        let identity = credentials.identity;

        // 2. Verify password.
        let valid = password::verify_password(
            &input.password,
            &credentials.password_hash,
            self.config.pepper.as_deref(),
        )?;

        if !valid {
            debug!(identity_id = %identity.id, "Login rejected: wrong password");
            return Err(AuthError::InvalidCredentials.into());
        }

        // 3. Check lifecycle state.
        match identity.lifecycle_state {
            LifecycleState::Active => {}
            LifecycleState::Pending => {
                debug!(identity_id = %identity.id, "Login rejected: pending approval");
                return Err(AuthError::AccountPending.into());
            }
            LifecycleState::Deactivated => {
                debug!(identity_id = %identity.id, "Login rejected: deactivated");
                return Err(AuthError::AccountDeactivated.into());
            }
        }

        // 4. Open session.
        let raw_token = token::generate_session_token();
        let expires_at = self.session_expiry()?;
        let session = self
            .sessions
            .create(CreateSession {
                identity_id: identity.id,
                token_hash: token::hash_session_token(&raw_token),
                expires_at,
            })
            .await?;

        info!(identity_id = %identity.id, session_id = %session.id, "Login succeeded");

        Ok(LoginOutput {
            session_token: raw_token,
            session_id: session.id,
            expires_at: session.expires_at,
            identity,
        })
    }

    /// Re-validate a session token against the store.
    ///
    /// Expired sessions, and sessions whose identity has been deleted or
    /// is no longer active, are removed and reported as
    /// [`DeskError::AuthenticationFailed`].
    pub async fn resolve_session(&self, session_token: &str) -> DeskResult<ResolvedSession> {
        let token_hash = token::hash_session_token(session_token);
        let session = match self.sessions.get_by_token_hash(&token_hash).await {
            Ok(s) => s,
            Err(DeskError::NotFound { .. }) => return Err(AuthError::SessionInvalid.into()),
            Err(e) => return Err(e),
        };

        if session.is_expired(Utc::now()) {
            self.sessions.invalidate(session.id).await?;
            debug!(session_id = %session.id, "Session expired");
            return Err(AuthError::SessionExpired.into());
        }

        let identity = match self.identities.get_by_id(session.identity_id).await {
            Ok(identity) => identity,
            Err(DeskError::NotFound { .. }) => {
                self.sessions.invalidate(session.id).await?;
                debug!(session_id = %session.id, "Session bound to a removed identity");
                return Err(AuthError::SessionInvalid.into());
            }
            Err(e) => return Err(e),
        };

        if !identity.is_active() {
            self.sessions.invalidate(session.id).await?;
            debug!(
                session_id = %session.id,
                identity_id = %identity.id,
                state = %identity.lifecycle_state,
                "Session bound to a non-active identity"
            );
            return Err(AuthError::AccountDeactivated.into());
        }

        Ok(ResolvedSession {
            session_id: session.id,
            expires_at: session.expires_at,
            identity,
        })
    }

    /// Close the session behind a token. Unknown tokens are ignored.
    pub async fn logout(&self, session_token: &str) -> DeskResult<()> {
        let token_hash = token::hash_session_token(session_token);
        match self.sessions.get_by_token_hash(&token_hash).await {
            Ok(session) => {
                self.sessions.invalidate(session.id).await?;
                info!(identity_id = %session.identity_id, session_id = %session.id, "Logged out");
                Ok(())
            }
            Err(DeskError::NotFound { .. }) => Ok(()),
            Err(e) => Err(e),
        }
    }

    /// Re-fetch an identity, e.g. after an admin changed its role.
    pub async fn current_identity(&self, identity_id: Uuid) -> DeskResult<Identity> {
        self.identities.get_by_id(identity_id).await
    }

    /// Revoke all sessions for an identity.
    pub async fn revoke_all_sessions(&self, identity_id: Uuid) -> DeskResult<()> {
        self.sessions.invalidate_identity_sessions(identity_id).await
    }

    /// Delete every expired session. Returns how many were removed.
    pub async fn purge_expired_sessions(&self) -> DeskResult<u64> {
        let removed = self.sessions.cleanup_expired().await?;
        if removed > 0 {
            info!(removed, "Purged expired sessions");
        }
        Ok(removed)
    }

    fn session_expiry(&self) -> DeskResult<DateTime<Utc>> {
        i64::try_from(self.config.session_lifetime_secs)
            .ok()
            .and_then(TimeDelta::try_seconds)
            .and_then(|lifetime| Utc::now().checked_add_signed(lifetime))
            .ok_or_else(|| DeskError::Internal("session lifetime out of range".into()))
    }
}
