//! hoteldesk auth: registration with admin approval, password login,
//! session resolution and user administration.

pub mod admin;
pub mod config;
pub mod error;
pub mod password;
pub mod service;
pub mod token;

pub use admin::{IdentityPatch, IdentityStats};
pub use config::AuthConfig;
pub use error::AuthError;
pub use service::{IdentityService, LoginInput, LoginOutput, RegisterInput, ResolvedSession};
