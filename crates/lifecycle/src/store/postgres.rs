//! [`LifecycleStore`] over PostgreSQL, delegating to the `clubhouse-db`
//! repositories.

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
use clubhouse_db::repositories::{
    ClubPurgeRepo, ClubRepo, DeletionLogRepo, FileRepo, MemberRepo, MembershipPeriodRepo,
    StatusTransitionRepo,
};
use clubhouse_db::{DbPool, DbTx};

use super::{LifecycleStore, StoreTx};
use crate::error::StoreError;

#[derive(Clone)]
pub struct PgLifecycleStore {
    pool: DbPool,
}

impl PgLifecycleStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LifecycleStore for PgLifecycleStore {
    async fn begin(&self) -> Result<Box<dyn StoreTx>, StoreError> {
        let tx = self.pool.begin().await?;
        Ok(Box::new(PgStoreTx { tx }))
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        clubhouse_db::health_check(&self.pool).await?;
        Ok(())
    }
}

/// Dropping the inner `sqlx` transaction without committing rolls it back.
struct PgStoreTx {
    tx: DbTx<'static>,
}

#[async_trait]
impl StoreTx for PgStoreTx {
    async fn create_member(
        &mut self,
        club_id: DbId,
        input: &CreateMember,
        status: MemberStatus,
    ) -> Result<Member, StoreError> {
        Ok(MemberRepo::create(&mut self.tx, club_id, input, status).await?)
    }

    async fn find_member(
        &mut self,
        club_id: DbId,
        id: DbId,
    ) -> Result<Option<Member>, StoreError> {
        Ok(MemberRepo::find_by_id(&mut self.tx, club_id, id).await?)
    }

    async fn find_member_for_update(
        &mut self,
        club_id: DbId,
        id: DbId,
    ) -> Result<Option<Member>, StoreError> {
        Ok(MemberRepo::find_by_id_for_update(&mut self.tx, club_id, id).await?)
    }

    async fn list_members(&mut self, club_id: DbId) -> Result<Vec<Member>, StoreError> {
        Ok(MemberRepo::list_by_club(&mut self.tx, club_id).await?)
    }

    async fn count_members(&mut self, club_id: DbId) -> Result<i64, StoreError> {
        Ok(MemberRepo::count_by_club(&mut self.tx, club_id).await?)
    }

    async fn update_member_status(
        &mut self,
        id: DbId,
        status: MemberStatus,
    ) -> Result<Member, StoreError> {
        Ok(MemberRepo::update_status(&mut self.tx, id, status).await?)
    }

    async fn set_member_cancellation(
        &mut self,
        id: DbId,
        cancellation: Option<Cancellation>,
    ) -> Result<Member, StoreError> {
        Ok(MemberRepo::set_cancellation(&mut self.tx, id, cancellation).await?)
    }

    async fn update_member_versioned(
        &mut self,
        club_id: DbId,
        id: DbId,
        input: &UpdateMember,
    ) -> Result<Option<Member>, StoreError> {
        Ok(MemberRepo::update_versioned(&mut self.tx, club_id, id, input).await?)
    }

    async fn soft_delete_member(
        &mut self,
        club_id: DbId,
        id: DbId,
        at: Timestamp,
    ) -> Result<bool, StoreError> {
        Ok(MemberRepo::soft_delete(&mut self.tx, club_id, id, at).await?)
    }

    async fn find_open_period(
        &mut self,
        member_id: DbId,
    ) -> Result<Option<MembershipPeriod>, StoreError> {
        Ok(MembershipPeriodRepo::find_open(&mut self.tx, member_id).await?)
    }

    async fn open_period(
        &mut self,
        member_id: DbId,
        join_date: Date,
    ) -> Result<MembershipPeriod, StoreError> {
        Ok(MembershipPeriodRepo::open(&mut self.tx, member_id, join_date).await?)
    }

    async fn close_period(
        &mut self,
        period_id: DbId,
        leave_date: Date,
    ) -> Result<MembershipPeriod, StoreError> {
        Ok(MembershipPeriodRepo::close(&mut self.tx, period_id, leave_date).await?)
    }

    async fn list_periods(
        &mut self,
        member_id: DbId,
    ) -> Result<Vec<MembershipPeriod>, StoreError> {
        Ok(MembershipPeriodRepo::list_by_member(&mut self.tx, member_id).await?)
    }

    async fn insert_status_transition(
        &mut self,
        input: &CreateStatusTransition,
    ) -> Result<StatusTransition, StoreError> {
        Ok(StatusTransitionRepo::create(&mut self.tx, input).await?)
    }

    async fn list_status_transitions(
        &mut self,
        club_id: DbId,
        member_id: DbId,
    ) -> Result<Vec<StatusTransition>, StoreError> {
        Ok(StatusTransitionRepo::list_by_member(&mut self.tx, club_id, member_id).await?)
    }

    async fn find_club(&mut self, id: DbId) -> Result<Option<Club>, StoreError> {
        Ok(ClubRepo::find_by_id(&mut self.tx, id).await?)
    }

    async fn find_club_for_update(&mut self, id: DbId) -> Result<Option<Club>, StoreError> {
        Ok(ClubRepo::find_by_id_for_update(&mut self.tx, id).await?)
    }

    async fn mark_club_deactivated(
        &mut self,
        id: DbId,
        deactivation: &ClubDeactivation,
    ) -> Result<Club, StoreError> {
        Ok(ClubRepo::mark_deactivated(&mut self.tx, id, deactivation).await?)
    }

    async fn clear_club_deactivation(&mut self, id: DbId) -> Result<Club, StoreError> {
        Ok(ClubRepo::clear_deactivation(&mut self.tx, id).await?)
    }

    async fn tombstone_club(
        &mut self,
        id: DbId,
        at: Timestamp,
        by: Option<DbId>,
    ) -> Result<bool, StoreError> {
        Ok(ClubRepo::tombstone(&mut self.tx, id, at, by).await?)
    }

    async fn list_clubs_due_for_deletion(
        &mut self,
        now: Timestamp,
    ) -> Result<Vec<Club>, StoreError> {
        Ok(ClubRepo::list_due_for_deletion(&mut self.tx, now).await?)
    }

    async fn list_files_exclusive_to_club(
        &mut self,
        club_id: DbId,
    ) -> Result<Vec<StoredFile>, StoreError> {
        Ok(FileRepo::list_exclusive_to_club(&mut self.tx, club_id).await?)
    }

    async fn list_file_ids_referenced_by_club(
        &mut self,
        club_id: DbId,
    ) -> Result<Vec<DbId>, StoreError> {
        Ok(FileRepo::list_ids_referenced_by_club(&mut self.tx, club_id).await?)
    }

    async fn purge(&mut self, step: PurgeStep, club_id: DbId) -> Result<u64, StoreError> {
        Ok(ClubPurgeRepo::run_step(&mut self.tx, step, club_id).await?)
    }

    async fn delete_unreferenced_files(&mut self, candidates: &[DbId]) -> Result<u64, StoreError> {
        Ok(FileRepo::delete_unreferenced(&mut self.tx, candidates).await?)
    }

    async fn insert_deletion_log(
        &mut self,
        input: &CreateDeletionLog,
    ) -> Result<DeletionLog, StoreError> {
        Ok(DeletionLogRepo::create(&mut self.tx, input).await?)
    }

    async fn cancel_open_deletion_logs(
        &mut self,
        slug: &str,
        at: Timestamp,
        by: DbId,
    ) -> Result<u64, StoreError> {
        Ok(DeletionLogRepo::cancel_open_for_slug(&mut self.tx, slug, at, by).await?)
    }

    async fn find_open_deletion_log(
        &mut self,
        slug: &str,
    ) -> Result<Option<DeletionLog>, StoreError> {
        Ok(DeletionLogRepo::find_open_by_slug(&mut self.tx, slug).await?)
    }

    async fn mark_deletion_log_completed(
        &mut self,
        id: DbId,
        at: Timestamp,
    ) -> Result<bool, StoreError> {
        Ok(DeletionLogRepo::mark_completed(&mut self.tx, id, at).await?)
    }

    async fn list_open_deletion_logs(&mut self) -> Result<Vec<DeletionLog>, StoreError> {
        Ok(DeletionLogRepo::list_open(&mut self.tx).await?)
    }

    async fn find_open_deletion_log_for_update(
        &mut self,
        id: DbId,
    ) -> Result<Option<DeletionLog>, StoreError> {
        Ok(DeletionLogRepo::find_open_for_update(&mut self.tx, id).await?)
    }

    async fn set_deletion_log_events(
        &mut self,
        id: DbId,
        events: &[NotificationEvent],
    ) -> Result<bool, StoreError> {
        Ok(DeletionLogRepo::set_notification_events(&mut self.tx, id, events).await?)
    }

    async fn commit(self: Box<Self>) -> Result<(), StoreError> {
        self.tx.commit().await?;
        Ok(())
    }
}
