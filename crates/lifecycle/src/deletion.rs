//! Permanent deletion of a deactivated club.
//!
//! Deletion runs as an ordered list of phases, each with its own failure
//! policy:
//!
//! | Phase              | Policy               |
//! |--------------------|----------------------|
//! | object cleanup     | collect and continue |
//! | relational purge   | abort the operation  |
//! | log completion     | collect and continue |
//!
//! Only the relational purge is atomic. Object deletions cannot be rolled
//! back and a missing deletion log does not undo a finished purge.

use std::sync::Arc;

use clubhouse_core::club_lifecycle::PURGE_ORDER;
use clubhouse_core::clock::Clock;
use clubhouse_core::error::CoreError;
use clubhouse_core::types::DbId;
use clubhouse_db::models::club::Club;
use clubhouse_events::{event_types, EventBus, PlatformEvent};
use serde::Serialize;

use crate::error::LifecycleResult;
use crate::object_store::ObjectStore;
use crate::store::LifecycleStore;

// ---------------------------------------------------------------------------
// Phases
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Roll back and fail the whole deletion.
    Abort,
    /// Log, count and move on to the next phase.
    CollectAndContinue,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DeletionPhase {
    ObjectCleanup,
    RelationalPurge,
    LogCompletion,
}

impl DeletionPhase {
    pub fn policy(self) -> FailurePolicy {
        match self {
            Self::ObjectCleanup | Self::LogCompletion => FailurePolicy::CollectAndContinue,
            Self::RelationalPurge => FailurePolicy::Abort,
        }
    }
}

pub const DELETION_PHASES: &[DeletionPhase] = &[
    DeletionPhase::ObjectCleanup,
    DeletionPhase::RelationalPurge,
    DeletionPhase::LogCompletion,
];

/// Outcome of a finished deletion.
#[derive(Debug, Clone, Serialize)]
pub struct DeletionResult {
    pub club_id: DbId,
    pub files_deleted: u64,
    pub files_failed: u64,
    /// Rows removed or cleared by the relational purge, file rows included.
    pub rows_purged: u64,
    pub log_completed: bool,
    /// Phases that failed under the collect-and-continue policy.
    pub failed_phases: Vec<DeletionPhase>,
}

impl DeletionResult {
    fn new(club_id: DbId) -> Self {
        Self {
            club_id,
            files_deleted: 0,
            files_failed: 0,
            rows_purged: 0,
            log_completed: false,
            failed_phases: Vec::new(),
        }
    }
}

// ---------------------------------------------------------------------------
// Orchestrator
// ---------------------------------------------------------------------------

pub struct DeletionOrchestrator {
    store: Arc<dyn LifecycleStore>,
    objects: Arc<dyn ObjectStore>,
    clock: Arc<dyn Clock>,
    events: Arc<EventBus>,
}

impl DeletionOrchestrator {
    pub fn new(
        store: Arc<dyn LifecycleStore>,
        objects: Arc<dyn ObjectStore>,
        clock: Arc<dyn Clock>,
        events: Arc<EventBus>,
    ) -> Self {
        Self {
            store,
            objects,
            clock,
            events,
        }
    }

    /// Permanently delete a deactivated club. `actor_id` is `None` when the
    /// deletion sweep initiates it.
    pub async fn delete_club(
        &self,
        club_id: DbId,
        actor_id: Option<DbId>,
    ) -> LifecycleResult<DeletionResult> {
        let mut tx = self.store.begin().await?;
        let club = require_eligible(tx.find_club_for_update(club_id).await?, club_id)?;
        drop(tx);

        let mut result = DeletionResult::new(club_id);
        for phase in DELETION_PHASES {
            let outcome = match phase {
                DeletionPhase::ObjectCleanup => self.cleanup_objects(&club, &mut result).await,
                DeletionPhase::RelationalPurge => {
                    self.purge_relational(&club, actor_id, &mut result).await
                }
                DeletionPhase::LogCompletion => self.complete_log(&club, &mut result).await,
            };

            if let Err(e) = outcome {
                match phase.policy() {
                    FailurePolicy::Abort => {
                        tracing::error!(club_id, phase = ?phase, error = %e, "Club deletion aborted");
                        return Err(e);
                    }
                    FailurePolicy::CollectAndContinue => {
                        tracing::warn!(club_id, phase = ?phase, error = %e, "Club deletion phase failed, continuing");
                        result.failed_phases.push(*phase);
                    }
                }
            }
        }

        tracing::info!(
            club_id,
            files_deleted = result.files_deleted,
            files_failed = result.files_failed,
            rows_purged = result.rows_purged,
            log_completed = result.log_completed,
            "Club permanently deleted",
        );
        self.events.publish(
            PlatformEvent::new(event_types::CLUB_DELETED)
                .with_source(event_types::ENTITY_CLUB, club_id)
                .with_club(club_id)
                .with_optional_actor(actor_id)
                .with_payload(serde_json::json!({
                    "club_slug": club.slug,
                    "files_deleted": result.files_deleted,
                    "files_failed": result.files_failed,
                    "rows_purged": result.rows_purged,
                    "log_completed": result.log_completed,
                }))
                .at(self.clock.now()),
        );
        Ok(result)
    }

    /// Phase 1: delete the blobs of files only this club references. Every
    /// file is attempted; failures are counted.
    async fn cleanup_objects(&self, club: &Club, result: &mut DeletionResult) -> LifecycleResult<()> {
        let mut tx = self.store.begin().await?;
        let files = tx.list_files_exclusive_to_club(club.id).await?;
        drop(tx);

        for file in &files {
            match self.objects.delete_object(&file.storage_key).await {
                Ok(()) => result.files_deleted += 1,
                Err(e) => {
                    tracing::warn!(
                        club_id = club.id,
                        file_id = file.id,
                        key = %file.storage_key,
                        error = %e,
                        "Failed to delete stored object",
                    );
                    result.files_failed += 1;
                }
            }
        }
        Ok(())
    }

    /// Phase 2: purge every club-owned row in dependency order, tombstone the
    /// club and drop file rows nothing references any more. One transaction.
    async fn purge_relational(
        &self,
        club: &Club,
        actor_id: Option<DbId>,
        result: &mut DeletionResult,
    ) -> LifecycleResult<()> {
        let now = self.clock.now();
        let mut tx = self.store.begin().await?;

        // Reactivation may have won the race since the pre-check.
        let locked = tx.find_club_for_update(club.id).await?;
        require_eligible(locked, club.id)?;

        let candidates = tx.list_file_ids_referenced_by_club(club.id).await?;

        let mut rows = 0;
        for step in PURGE_ORDER {
            rows += tx.purge(*step, club.id).await?;
        }
        if !tx.tombstone_club(club.id, now, actor_id).await? {
            return Err(CoreError::NotEligible(format!(
                "Club {} could not be tombstoned",
                club.id
            ))
            .into());
        }
        rows += tx.delete_unreferenced_files(&candidates).await?;
        tx.commit().await?;

        result.rows_purged = rows;
        Ok(())
    }

    /// Phase 3: stamp the open deletion log as completed.
    async fn complete_log(&self, club: &Club, result: &mut DeletionResult) -> LifecycleResult<()> {
        let now = self.clock.now();
        let mut tx = self.store.begin().await?;
        let Some(log) = tx.find_open_deletion_log(&club.slug).await? else {
            tracing::warn!(club_id = club.id, slug = %club.slug, "No open deletion log for deleted club");
            return Ok(());
        };
        result.log_completed = tx.mark_deletion_log_completed(log.id, now).await?;
        tx.commit().await?;
        Ok(())
    }
}

/// A club can be deleted only while deactivated and not yet tombstoned.
fn require_eligible(club: Option<Club>, club_id: DbId) -> LifecycleResult<Club> {
    let club = club.ok_or(CoreError::NotFound {
        entity: "Club",
        id: club_id,
    })?;
    if club.is_deleted() {
        return Err(CoreError::NotEligible(format!("Club {club_id} is already deleted")).into());
    }
    if !club.is_deactivated() {
        return Err(CoreError::NotEligible(format!("Club {club_id} is not deactivated")).into());
    }
    Ok(club)
}
