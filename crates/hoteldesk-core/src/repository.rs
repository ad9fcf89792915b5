//! Repository trait definitions for data access abstraction.
//!
//! All repository operations are async. Implementations are injected
//! into the services through their constructors.

use uuid::Uuid;

use crate::error::DeskResult;
use crate::models::{
    identity::{
        CreateIdentity, Identity, IdentityCredentials, LifecycleState, Role, UpdateIdentity,
    },
    session::{CreateSession, Session},
};

/// Pagination parameters for list queries.
#[derive(Debug, Clone)]
pub struct Pagination {
    pub offset: u64,
    pub limit: u64,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            offset: 0,
            limit: 50,
        }
    }
}

/// A paginated result set.
#[derive(Debug, Clone)]
pub struct PaginatedResult<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub offset: u64,
    pub limit: u64,
}

/// Query filters for identity listings. All set fields must match.
#[derive(Debug, Clone, Default)]
pub struct IdentityFilter {
    pub lifecycle_state: Option<LifecycleState>,
    pub role: Option<Role>,
    /// Case-insensitive substring match against name or email.
    pub search: Option<String>,
}

impl IdentityFilter {
    pub fn state(state: LifecycleState) -> Self {
        Self {
            lifecycle_state: Some(state),
            ..Default::default()
        }
    }
}

// ---------------------------------------------------------------------------
// Identities
// ---------------------------------------------------------------------------

pub trait IdentityRepository: Send + Sync {
    /// Insert a new identity. Must fail with
    /// [`DeskError::DuplicateEmail`](crate::DeskError::DuplicateEmail) if
    /// the email is already stored, even under a concurrent insert.
    fn create(&self, input: CreateIdentity) -> impl Future<Output = DeskResult<Identity>> + Send;
    fn get_by_id(&self, id: Uuid) -> impl Future<Output = DeskResult<Identity>> + Send;
    fn get_by_email(&self, email: &str) -> impl Future<Output = DeskResult<Identity>> + Send;
    /// Identity plus password hash, for credential verification only.
    fn get_credentials(
        &self,
        email: &str,
    ) -> impl Future<Output = DeskResult<IdentityCredentials>> + Send;
    fn update(
        &self,
        id: Uuid,
        input: UpdateIdentity,
    ) -> impl Future<Output = DeskResult<Identity>> + Send;
    /// Hard delete. Fails with `NotFound` if no record was removed.
    fn delete(&self, id: Uuid) -> impl Future<Output = DeskResult<()>> + Send;
    fn list(
        &self,
        filter: IdentityFilter,
        pagination: Pagination,
    ) -> impl Future<Output = DeskResult<PaginatedResult<Identity>>> + Send;
    fn count(&self, filter: IdentityFilter) -> impl Future<Output = DeskResult<u64>> + Send;

    /// Insert `input` and claim the one-time bootstrap slot in a single
    /// transaction. Returns `None` once the slot is taken; exactly one
    /// caller over the lifetime of the store gets `Some`. A failed
    /// insert leaves the slot free.
    fn create_bootstrap(
        &self,
        input: CreateIdentity,
    ) -> impl Future<Output = DeskResult<Option<Identity>>> + Send;
}

// ---------------------------------------------------------------------------
// Sessions
// ---------------------------------------------------------------------------

pub trait SessionRepository: Send + Sync {
    fn create(&self, input: CreateSession) -> impl Future<Output = DeskResult<Session>> + Send;
    fn get_by_token_hash(
        &self,
        token_hash: &str,
    ) -> impl Future<Output = DeskResult<Session>> + Send;
    /// Delete a single session. Unknown ids are ignored.
    fn invalidate(&self, id: Uuid) -> impl Future<Output = DeskResult<()>> + Send;
    /// Delete every session bound to an identity.
    fn invalidate_identity_sessions(
        &self,
        identity_id: Uuid,
    ) -> impl Future<Output = DeskResult<()>> + Send;
    /// Delete expired sessions, returning how many were removed.
    fn cleanup_expired(&self) -> impl Future<Output = DeskResult<u64>> + Send;
}
