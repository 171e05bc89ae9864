//! Well-known role name constants.
//!
//! These must match the role names issued in access tokens.

/// Platform operator. May manage any club and trigger lifecycle sweeps.
pub const ROLE_ADMIN: &str = "admin";

/// Administrator of a single club (the `club_id` claim).
pub const ROLE_CLUB_ADMIN: &str = "club_admin";

/// Regular club staff with read access to member data.
pub const ROLE_STAFF: &str = "staff";
