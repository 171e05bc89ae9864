pub mod clubs;
pub mod lifecycle_admin;
pub mod members;
