//! hoteldesk core: domain types, repository traits and role-based
//! access rules shared by the other crates.

pub mod access;
pub mod error;
pub mod models;
pub mod repository;
pub mod validation;

pub use error::{DeskError, DeskResult, ErrorKind};
