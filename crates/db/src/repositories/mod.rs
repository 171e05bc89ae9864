//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async query methods that
//! accept an open transaction as the first argument, so lifecycle operations
//! can compose several repositories atomically.

pub mod club_purge_repo;
pub mod club_repo;
pub mod deletion_log_repo;
pub mod file_repo;
pub mod member_repo;
pub mod membership_period_repo;
pub mod status_transition_repo;

pub use club_purge_repo::ClubPurgeRepo;
pub use club_repo::ClubRepo;
pub use deletion_log_repo::DeletionLogRepo;
pub use file_repo::FileRepo;
pub use member_repo::MemberRepo;
pub use membership_period_repo::MembershipPeriodRepo;
pub use status_transition_repo::StatusTransitionRepo;
