//! Administrative identity operations.
//!
//! Every operation re-fetches the caller by id and requires an active
//! `super_admin`. The caller's role is never taken from a session
//! snapshot.

use hoteldesk_core::error::{DeskError, DeskResult};
use hoteldesk_core::models::identity::{
    Identity, LifecycleState, Role, TechnicianCategory, UpdateIdentity, check_role_category,
};
use hoteldesk_core::repository::{
    IdentityFilter, IdentityRepository, PaginatedResult, Pagination, SessionRepository,
};
use hoteldesk_core::validation;
use tracing::{debug, info};
use uuid::Uuid;

use crate::service::IdentityService;

/// Partial edit of an identity. `None` leaves a field untouched.
#[derive(Debug, Clone, Default)]
pub struct IdentityPatch {
    pub name: Option<String>,
    pub role: Option<Role>,
    /// `Some(None)` clears the category.
    pub technician_category: Option<Option<TechnicianCategory>>,
    pub department: Option<String>,
    /// Toggle between `active` and `deactivated`.
    pub active: Option<bool>,
}

/// Headcounts for the admin dashboard. Role counts cover active
/// identities only.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IdentityStats {
    pub active: u64,
    pub pending: u64,
    pub deactivated: u64,
    pub supervisors: u64,
    pub technicians: u64,
    pub hods: u64,
    pub admins: u64,
}

impl<I: IdentityRepository, S: SessionRepository> IdentityService<I, S> {
    async fn require_admin(&self, actor_id: Uuid) -> DeskResult<Identity> {
        match self.identities.get_by_id(actor_id).await {
            Ok(actor) if actor.is_active() && actor.is_super_admin() => Ok(actor),
            Ok(actor) => {
                debug!(actor_id = %actor.id, role = %actor.role, "Admin operation refused");
                Err(DeskError::not_authorized("super_admin role required"))
            }
            Err(DeskError::NotFound { .. }) => {
                Err(DeskError::not_authorized("unknown caller"))
            }
            Err(e) => Err(e),
        }
    }

    async fn pending_target(&self, target_id: Uuid) -> DeskResult<Identity> {
        match self.identities.get_by_id(target_id).await {
            Ok(target) if target.lifecycle_state == LifecycleState::Pending => Ok(target),
            Ok(_) | Err(DeskError::NotFound { .. }) => {
                Err(DeskError::not_found("pending identity", target_id))
            }
            Err(e) => Err(e),
        }
    }

    async fn after_deactivation(&self, identity_id: Uuid) -> DeskResult<()> {
        if self.config.revoke_sessions_on_deactivate {
            self.sessions.invalidate_identity_sessions(identity_id).await?;
            info!(identity_id = %identity_id, "Sessions revoked");
        }
        Ok(())
    }

    /// Move a pending identity to `active`, keeping its requested role.
    pub async fn approve_identity(&self, actor_id: Uuid, target_id: Uuid) -> DeskResult<Identity> {
        self.require_admin(actor_id).await?;
        self.pending_target(target_id).await?;

        let approved = self
            .identities
            .update(
                target_id,
                UpdateIdentity {
                    lifecycle_state: Some(LifecycleState::Active),
                    ..Default::default()
                },
            )
            .await?;

        info!(
            actor_id = %actor_id,
            identity_id = %approved.id,
            role = %approved.role,
            "Identity approved"
        );
        Ok(approved)
    }

    /// Remove a pending identity outright.
    pub async fn reject_identity(&self, actor_id: Uuid, target_id: Uuid) -> DeskResult<()> {
        self.require_admin(actor_id).await?;
        self.pending_target(target_id).await?;

        match self.identities.delete(target_id).await {
            Ok(()) => {}
            // Raced with another admin.
            Err(DeskError::NotFound { .. }) => {
                return Err(DeskError::not_found("pending identity", target_id));
            }
            Err(e) => return Err(e),
        }

        info!(actor_id = %actor_id, identity_id = %target_id, "Identity rejected");
        Ok(())
    }

    /// Toggle an approved identity between `active` and `deactivated`.
    ///
    /// Setting the current state again is a no-op. Pending identities
    /// must go through approve or reject instead.
    pub async fn set_active(
        &self,
        actor_id: Uuid,
        target_id: Uuid,
        active: bool,
    ) -> DeskResult<Identity> {
        if actor_id == target_id {
            return Err(DeskError::not_authorized(
                "cannot change your own account status",
            ));
        }
        self.require_admin(actor_id).await?;

        let target = self.identities.get_by_id(target_id).await?;
        if target.lifecycle_state == LifecycleState::Pending {
            return Err(DeskError::validation(
                "lifecycle_state",
                "Pending identities must be approved or rejected",
            ));
        }

        let next = if active {
            LifecycleState::Active
        } else {
            LifecycleState::Deactivated
        };
        if target.lifecycle_state == next {
            return Ok(target);
        }

        let updated = self
            .identities
            .update(
                target_id,
                UpdateIdentity {
                    lifecycle_state: Some(next),
                    ..Default::default()
                },
            )
            .await?;

        if !active {
            self.after_deactivation(target_id).await?;
        }

        info!(
            actor_id = %actor_id,
            identity_id = %target_id,
            state = %updated.lifecycle_state,
            "Identity status changed"
        );
        Ok(updated)
    }

    /// Permanently delete an identity. Deleting an id that no longer
    /// exists succeeds.
    pub async fn delete_identity(&self, actor_id: Uuid, target_id: Uuid) -> DeskResult<()> {
        if actor_id == target_id {
            return Err(DeskError::not_authorized("cannot delete your own account"));
        }
        self.require_admin(actor_id).await?;

        match self.identities.delete(target_id).await {
            Ok(()) => {}
            Err(DeskError::NotFound { .. }) => {
                debug!(identity_id = %target_id, "Delete of unknown identity ignored");
                return Ok(());
            }
            Err(e) => return Err(e),
        }

        self.sessions.invalidate_identity_sessions(target_id).await?;

        info!(actor_id = %actor_id, identity_id = %target_id, "Identity deleted");
        Ok(())
    }

    /// Edit profile fields, role, category or status.
    ///
    /// The technician category follows the role: it is cleared when the
    /// role moves away from `technician` and required when it moves to
    /// it. Admins may edit their own name and department but not their
    /// own role or status.
    pub async fn update_identity(
        &self,
        actor_id: Uuid,
        target_id: Uuid,
        patch: IdentityPatch,
    ) -> DeskResult<Identity> {
        self.require_admin(actor_id).await?;
        let current = self.identities.get_by_id(target_id).await?;

        let role = patch.role.unwrap_or(current.role);
        if actor_id == target_id && role != current.role {
            return Err(DeskError::not_authorized("cannot change your own role"));
        }
        if actor_id == target_id && patch.active == Some(false) {
            return Err(DeskError::not_authorized("cannot deactivate your own account"));
        }

        let category = match patch.technician_category {
            Some(category) => category,
            None if role == Role::Technician => current.technician_category,
            None => None,
        };
        check_role_category(role, category)?;

        let lifecycle_state = match patch.active {
            Some(_) if current.lifecycle_state == LifecycleState::Pending => {
                return Err(DeskError::validation(
                    "lifecycle_state",
                    "Pending identities must be approved or rejected",
                ));
            }
            Some(true) => LifecycleState::Active,
            Some(false) => LifecycleState::Deactivated,
            None => current.lifecycle_state,
        };

        let name = patch
            .name
            .map(|n| validation::require_text("name", &n))
            .transpose()?;
        let department = patch
            .department
            .map(|d| validation::require_text("department", &d))
            .transpose()?;

        let changes = UpdateIdentity {
            name: name.filter(|n| *n != current.name),
            role: (role != current.role).then_some(role),
            technician_category: (category != current.technician_category).then_some(category),
            department: department.filter(|d| *d != current.department),
            lifecycle_state: (lifecycle_state != current.lifecycle_state)
                .then_some(lifecycle_state),
        };

        if changes.name.is_none()
            && changes.role.is_none()
            && changes.technician_category.is_none()
            && changes.department.is_none()
            && changes.lifecycle_state.is_none()
        {
            return Ok(current);
        }

        let deactivated = changes.lifecycle_state == Some(LifecycleState::Deactivated);
        let updated = self.identities.update(target_id, changes).await?;
        if deactivated {
            self.after_deactivation(target_id).await?;
        }

        info!(
            actor_id = %actor_id,
            identity_id = %target_id,
            role = %updated.role,
            state = %updated.lifecycle_state,
            "Identity updated"
        );
        Ok(updated)
    }

    /// List identities, oldest first.
    pub async fn list_identities(
        &self,
        actor_id: Uuid,
        filter: IdentityFilter,
        pagination: Pagination,
    ) -> DeskResult<PaginatedResult<Identity>> {
        self.require_admin(actor_id).await?;
        self.identities.list(filter, pagination).await
    }

    /// The approval queue.
    pub async fn list_pending(
        &self,
        actor_id: Uuid,
        pagination: Pagination,
    ) -> DeskResult<PaginatedResult<Identity>> {
        self.list_identities(
            actor_id,
            IdentityFilter::state(LifecycleState::Pending),
            pagination,
        )
        .await
    }

    pub async fn identity_stats(&self, actor_id: Uuid) -> DeskResult<IdentityStats> {
        self.require_admin(actor_id).await?;

        let active_with = |role: Role| IdentityFilter {
            lifecycle_state: Some(LifecycleState::Active),
            role: Some(role),
            search: None,
        };

        Ok(IdentityStats {
            active: self
                .identities
                .count(IdentityFilter::state(LifecycleState::Active))
                .await?,
            pending: self
                .identities
                .count(IdentityFilter::state(LifecycleState::Pending))
                .await?,
            deactivated: self
                .identities
                .count(IdentityFilter::state(LifecycleState::Deactivated))
                .await?,
            supervisors: self.identities.count(active_with(Role::Supervisor)).await?,
            technicians: self.identities.count(active_with(Role::Technician)).await?,
            hods: self.identities.count(active_with(Role::Hod)).await?,
            admins: self.identities.count(active_with(Role::SuperAdmin)).await?,
        })
    }
}
