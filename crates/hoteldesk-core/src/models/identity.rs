//! Identity domain model.
//!
//! An identity is a hotel staff member who can sign in. Its role decides
//! which views it can reach; technicians additionally carry the trade
//! they are dispatched for.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{DeskError, DeskResult};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Supervisor,
    Technician,
    Hod,
    SuperAdmin,
}

impl Role {
    pub const ALL: [Role; 4] = [
        Role::Supervisor,
        Role::Technician,
        Role::Hod,
        Role::SuperAdmin,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Supervisor => "supervisor",
            Role::Technician => "technician",
            Role::Hod => "hod",
            Role::SuperAdmin => "super_admin",
        }
    }

    /// Human-readable name.
    pub fn label(&self) -> &'static str {
        match self {
            Role::Supervisor => "Supervisor",
            Role::Technician => "Technician",
            Role::Hod => "Head of Department",
            Role::SuperAdmin => "System Administrator",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = DeskError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "supervisor" => Ok(Role::Supervisor),
            "technician" => Ok(Role::Technician),
            "hod" => Ok(Role::Hod),
            "super_admin" => Ok(Role::SuperAdmin),
            other => Err(DeskError::validation(
                "role",
                format!("unknown role: {other}"),
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum TechnicianCategory {
    Plumber,
    Electrician,
    Ict,
    Carpenter,
    AcFridge,
}

impl TechnicianCategory {
    pub const ALL: [TechnicianCategory; 5] = [
        TechnicianCategory::Plumber,
        TechnicianCategory::Electrician,
        TechnicianCategory::Ict,
        TechnicianCategory::Carpenter,
        TechnicianCategory::AcFridge,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TechnicianCategory::Plumber => "plumber",
            TechnicianCategory::Electrician => "electrician",
            TechnicianCategory::Ict => "ict",
            TechnicianCategory::Carpenter => "carpenter",
            TechnicianCategory::AcFridge => "ac_fridge",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            TechnicianCategory::Plumber => "Plumber",
            TechnicianCategory::Electrician => "Electrician",
            TechnicianCategory::Ict => "ICT Specialist",
            TechnicianCategory::Carpenter => "Carpenter",
            TechnicianCategory::AcFridge => "AC/Refrigeration",
        }
    }
}

impl fmt::Display for TechnicianCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TechnicianCategory {
    type Err = DeskError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "plumber" => Ok(TechnicianCategory::Plumber),
            "electrician" => Ok(TechnicianCategory::Electrician),
            "ict" => Ok(TechnicianCategory::Ict),
            "carpenter" => Ok(TechnicianCategory::Carpenter),
            "ac_fridge" => Ok(TechnicianCategory::AcFridge),
            other => Err(DeskError::validation(
                "technician_category",
                format!("unknown technician category: {other}"),
            )),
        }
    }
}

/// Approval/activation state of an identity.
///
/// `Pending` identities await an admin decision and cannot sign in.
/// Only `Active` identities can sign in.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleState {
    Pending,
    Active,
    Deactivated,
}

impl LifecycleState {
    pub fn as_str(&self) -> &'static str {
        match self {
            LifecycleState::Pending => "pending",
            LifecycleState::Active => "active",
            LifecycleState::Deactivated => "deactivated",
        }
    }
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LifecycleState {
    type Err = DeskError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(LifecycleState::Pending),
            "active" => Ok(LifecycleState::Active),
            "deactivated" => Ok(LifecycleState::Deactivated),
            other => Err(DeskError::validation(
                "lifecycle_state",
                format!("unknown lifecycle state: {other}"),
            )),
        }
    }
}

/// Check the pairing rule: a category is present iff the role is
/// technician.
pub fn check_role_category(role: Role, category: Option<TechnicianCategory>) -> DeskResult<()> {
    match (role, category) {
        (Role::Technician, Some(_)) => Ok(()),
        (Role::Technician, None) => Err(DeskError::validation(
            "technician_category",
            "Technicians must have a category",
        )),
        (_, Some(_)) => Err(DeskError::validation(
            "technician_category",
            "Only technicians can have a category",
        )),
        (_, None) => Ok(()),
    }
}

/// A registered principal. Never carries the password hash.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Identity {
    pub id: Uuid,
    pub name: String,
    /// Trimmed and lowercased.
    pub email: String,
    pub role: Role,
    pub technician_category: Option<TechnicianCategory>,
    pub department: String,
    pub lifecycle_state: LifecycleState,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Identity {
    pub fn is_active(&self) -> bool {
        self.lifecycle_state == LifecycleState::Active
    }

    pub fn is_super_admin(&self) -> bool {
        self.role == Role::SuperAdmin
    }

    /// Read-only view handed to ticket and dashboard collaborators.
    pub fn principal(&self) -> Principal {
        Principal {
            id: self.id,
            name: self.name.clone(),
            role: self.role,
            technician_category: self.technician_category,
            department: self.department.clone(),
        }
    }
}

/// What other parts of the application may know about the signed-in
/// identity.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Principal {
    pub id: Uuid,
    pub name: String,
    pub role: Role,
    pub technician_category: Option<TechnicianCategory>,
    pub department: String,
}

/// An identity together with its stored password verifier.
///
/// Only returned by the credential lookup used at login.
#[derive(Clone)]
pub struct IdentityCredentials {
    pub identity: Identity,
    /// Argon2id PHC string.
    pub password_hash: String,
}

impl fmt::Debug for IdentityCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IdentityCredentials")
            .field("identity", &self.identity)
            .field("password_hash", &"<redacted>")
            .finish()
    }
}

/// Storage-level insert. Validation and the bootstrap decision happen
/// before this reaches a repository.
#[derive(Clone)]
pub struct CreateIdentity {
    pub name: String,
    pub email: String,
    /// Raw password (hashed with Argon2id before storage).
    pub password: String,
    pub role: Role,
    pub technician_category: Option<TechnicianCategory>,
    pub department: String,
    pub lifecycle_state: LifecycleState,
}

impl fmt::Debug for CreateIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CreateIdentity")
            .field("name", &self.name)
            .field("email", &self.email)
            .field("role", &self.role)
            .field("technician_category", &self.technician_category)
            .field("department", &self.department)
            .field("lifecycle_state", &self.lifecycle_state)
            .finish_non_exhaustive()
    }
}

/// Storage-level patch.
#[derive(Debug, Clone, Default)]
pub struct UpdateIdentity {
    pub name: Option<String>,
    pub role: Option<Role>,
    /// `Some(Some(val))` = set, `Some(None)` = clear, `None` = no change.
    pub technician_category: Option<Option<TechnicianCategory>>,
    pub department: Option<String>,
    pub lifecycle_state: Option<LifecycleState>,
}
