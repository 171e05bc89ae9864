//! Domain rules for the club membership lifecycle.
//!
//! This crate has zero internal deps so it can be used by the repository
//! layer, the lifecycle services and the API alike. Everything here is pure:
//! no I/O, no ambient time.

pub mod club_lifecycle;
pub mod clock;
pub mod error;
pub mod member_status;
pub mod roles;
pub mod scheduling;
pub mod types;
