//! Club membership lifecycle engines.
//!
//! - [`members`] -- member status transition engine, cancellations, versioned
//!   field edits
//! - [`clubs`] -- club deactivation and reactivation
//! - [`deletion`] -- three-phase permanent deletion of a club
//! - [`milestones`] -- countdown notifications on open deletion logs
//! - [`scheduler`] -- the daily deletion and milestone sweeps
//!
//! All persistence goes through the [`store::LifecycleStore`] seam, which has
//! a PostgreSQL implementation and an in-memory one used by tests.

pub mod audit;
pub mod clubs;
pub mod config;
pub mod deletion;
pub mod error;
pub mod members;
pub mod milestones;
pub mod object_store;
pub mod scheduler;
pub mod store;

pub use clubs::ClubLifecycleService;
pub use config::LifecycleConfig;
pub use deletion::DeletionOrchestrator;
pub use error::{LifecycleError, StoreError};
pub use members::MemberService;
pub use milestones::MilestoneNotifier;
pub use scheduler::LifecycleScheduler;
