//! Event names published by the lifecycle engines.

pub const MEMBER_CREATED: &str = "member.created";
pub const MEMBER_STATUS_CHANGED: &str = "member.status_changed";
pub const MEMBER_CANCELLATION_SET: &str = "member.cancellation_set";
pub const MEMBER_CANCELLATION_REVOKED: &str = "member.cancellation_revoked";

pub const CLUB_DEACTIVATED: &str = "club.deactivated";
pub const CLUB_REACTIVATED: &str = "club.reactivated";
pub const CLUB_DELETED: &str = "club.deleted";
/// Payload carries the milestone type (`T-7`, `T-1`, `T-0`) and days remaining.
pub const CLUB_DELETION_MILESTONE: &str = "club.deletion_milestone";

/// Source entity kinds attached via [`PlatformEvent::with_source`](crate::PlatformEvent::with_source).
pub const ENTITY_MEMBER: &str = "member";
pub const ENTITY_CLUB: &str = "club";
