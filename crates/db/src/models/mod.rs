//! Domain model structs and DTOs.
//!
//! Each submodule contains:
//! - A `FromRow` + `Serialize` entity struct matching the database row
//! - `Deserialize` DTOs for inserts and patches where the API accepts them

pub mod club;
pub mod deletion_log;
pub mod file;
pub mod member;
pub mod membership_period;
pub mod status_transition;
