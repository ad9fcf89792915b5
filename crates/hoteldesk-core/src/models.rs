//! Domain models for hoteldesk.

pub mod identity;
pub mod session;
