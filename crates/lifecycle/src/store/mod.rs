//! Persistence seam for the lifecycle engines.
//!
//! Every lifecycle operation runs inside a [`StoreTx`] obtained from
//! [`LifecycleStore::begin`]. Changes become visible on
//! [`StoreTx::commit`]; dropping the transaction rolls it back.
//!
//! - [`postgres::PgLifecycleStore`] -- production implementation over `sqlx`
//! - [`memory::MemoryStore`] -- in-memory implementation with foreign-key
//!   checks, used by tests and local tooling

use async_trait::async_trait;
use clubhouse_core::club_lifecycle::{NotificationEvent, PurgeStep};
use clubhouse_core::member_status::MemberStatus;
use clubhouse_core::types::{Date, DbId, Timestamp};
use clubhouse_db::models::club::{Club, ClubDeactivation};
use clubhouse_db::models::deletion_log::{CreateDeletionLog, DeletionLog};
use clubhouse_db::models::file::StoredFile;
use clubhouse_db::models::member::{Cancellation, CreateMember, Member, UpdateMember};
use clubhouse_db::models::membership_period::MembershipPeriod;
use clubhouse_db::models::status_transition::{CreateStatusTransition, StatusTransition};

use crate::error::StoreError;

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgLifecycleStore;

#[async_trait]
pub trait LifecycleStore: Send + Sync {
    /// Open a transaction.
    async fn begin(&self) -> Result<Box<dyn StoreTx>, StoreError>;

    async fn health_check(&self) -> Result<(), StoreError>;
}

/// An open transaction over the tenant data store.
///
/// Member lookups are scoped to a club and exclude soft-deleted members.
#[async_trait]
pub trait StoreTx: Send {
    // -- members ------------------------------------------------------------

    async fn create_member(
        &mut self,
        club_id: DbId,
        input: &CreateMember,
        status: MemberStatus,
    ) -> Result<Member, StoreError>;

    async fn find_member(&mut self, club_id: DbId, id: DbId)
        -> Result<Option<Member>, StoreError>;

    /// Like [`find_member`](Self::find_member) but holds a row lock until the
    /// transaction ends.
    async fn find_member_for_update(
        &mut self,
        club_id: DbId,
        id: DbId,
    ) -> Result<Option<Member>, StoreError>;

    async fn list_members(&mut self, club_id: DbId) -> Result<Vec<Member>, StoreError>;

    async fn count_members(&mut self, club_id: DbId) -> Result<i64, StoreError>;

    /// Write a new status. Moving to `LEFT` clears any pending cancellation.
    async fn update_member_status(
        &mut self,
        id: DbId,
        status: MemberStatus,
    ) -> Result<Member, StoreError>;

    async fn set_member_cancellation(
        &mut self,
        id: DbId,
        cancellation: Option<Cancellation>,
    ) -> Result<Member, StoreError>;

    /// Versioned field edit. `None` when no row matched the id and version.
    async fn update_member_versioned(
        &mut self,
        club_id: DbId,
        id: DbId,
        input: &UpdateMember,
    ) -> Result<Option<Member>, StoreError>;

    /// Tombstone a `LEFT` member. `false` when nothing matched.
    async fn soft_delete_member(
        &mut self,
        club_id: DbId,
        id: DbId,
        at: Timestamp,
    ) -> Result<bool, StoreError>;

    // -- membership periods ---------------------------------------------------

    async fn find_open_period(
        &mut self,
        member_id: DbId,
    ) -> Result<Option<MembershipPeriod>, StoreError>;

    async fn open_period(
        &mut self,
        member_id: DbId,
        join_date: Date,
    ) -> Result<MembershipPeriod, StoreError>;

    async fn close_period(
        &mut self,
        period_id: DbId,
        leave_date: Date,
    ) -> Result<MembershipPeriod, StoreError>;

    async fn list_periods(&mut self, member_id: DbId)
        -> Result<Vec<MembershipPeriod>, StoreError>;

    // -- status transitions ---------------------------------------------------

    async fn insert_status_transition(
        &mut self,
        input: &CreateStatusTransition,
    ) -> Result<StatusTransition, StoreError>;

    /// Newest first.
    async fn list_status_transitions(
        &mut self,
        club_id: DbId,
        member_id: DbId,
    ) -> Result<Vec<StatusTransition>, StoreError>;

    // -- clubs ----------------------------------------------------------------

    /// Excludes tombstoned clubs.
    async fn find_club(&mut self, id: DbId) -> Result<Option<Club>, StoreError>;

    /// Row-locked read that includes tombstoned clubs.
    async fn find_club_for_update(&mut self, id: DbId) -> Result<Option<Club>, StoreError>;

    async fn mark_club_deactivated(
        &mut self,
        id: DbId,
        deactivation: &ClubDeactivation,
    ) -> Result<Club, StoreError>;

    async fn clear_club_deactivation(&mut self, id: DbId) -> Result<Club, StoreError>;

    async fn tombstone_club(
        &mut self,
        id: DbId,
        at: Timestamp,
        by: Option<DbId>,
    ) -> Result<bool, StoreError>;

    async fn list_clubs_due_for_deletion(
        &mut self,
        now: Timestamp,
    ) -> Result<Vec<Club>, StoreError>;

    // -- files and purge ------------------------------------------------------

    /// Files referenced by the club and by no other club or user.
    async fn list_files_exclusive_to_club(
        &mut self,
        club_id: DbId,
    ) -> Result<Vec<StoredFile>, StoreError>;

    async fn list_file_ids_referenced_by_club(
        &mut self,
        club_id: DbId,
    ) -> Result<Vec<DbId>, StoreError>;

    /// Run one step of the relational purge. Returns rows affected.
    async fn purge(&mut self, step: PurgeStep, club_id: DbId) -> Result<u64, StoreError>;

    /// Delete those of `candidates` nothing references any more.
    async fn delete_unreferenced_files(&mut self, candidates: &[DbId]) -> Result<u64, StoreError>;

    // -- deletion logs --------------------------------------------------------

    async fn insert_deletion_log(
        &mut self,
        input: &CreateDeletionLog,
    ) -> Result<DeletionLog, StoreError>;

    async fn cancel_open_deletion_logs(
        &mut self,
        slug: &str,
        at: Timestamp,
        by: DbId,
    ) -> Result<u64, StoreError>;

    /// Most recent open log for the slug.
    async fn find_open_deletion_log(&mut self, slug: &str)
        -> Result<Option<DeletionLog>, StoreError>;

    async fn mark_deletion_log_completed(
        &mut self,
        id: DbId,
        at: Timestamp,
    ) -> Result<bool, StoreError>;

    async fn list_open_deletion_logs(&mut self) -> Result<Vec<DeletionLog>, StoreError>;

    /// Lock the log if it is still open.
    async fn find_open_deletion_log_for_update(
        &mut self,
        id: DbId,
    ) -> Result<Option<DeletionLog>, StoreError>;

    /// Replace the milestone list of an open log. `false` if the log is gone,
    /// cancelled or completed.
    async fn set_deletion_log_events(
        &mut self,
        id: DbId,
        events: &[NotificationEvent],
    ) -> Result<bool, StoreError>;

    // -- transaction control --------------------------------------------------

    async fn commit(self: Box<Self>) -> Result<(), StoreError>;
}
