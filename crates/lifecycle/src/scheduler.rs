//! Daily lifecycle sweeps.
//!
//! The sweeps read time only from the injected clock, so the background
//! runner, an admin trigger and tests all drive them the same way.

use std::sync::Arc;

use clubhouse_core::clock::Clock;
use serde::Serialize;

use crate::deletion::DeletionOrchestrator;
use crate::error::LifecycleResult;
use crate::milestones::{MilestoneNotifier, MilestoneSweepResult};
use crate::store::LifecycleStore;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DeletionSweepResult {
    pub eligible: usize,
    pub deleted: usize,
    pub failed: usize,
}

pub struct LifecycleScheduler {
    store: Arc<dyn LifecycleStore>,
    clock: Arc<dyn Clock>,
    orchestrator: Arc<DeletionOrchestrator>,
    notifier: Arc<MilestoneNotifier>,
}

impl LifecycleScheduler {
    pub fn new(
        store: Arc<dyn LifecycleStore>,
        clock: Arc<dyn Clock>,
        orchestrator: Arc<DeletionOrchestrator>,
        notifier: Arc<MilestoneNotifier>,
    ) -> Self {
        Self {
            store,
            clock,
            orchestrator,
            notifier,
        }
    }

    /// Permanently delete every club whose grace period has run out. Clubs
    /// are processed one at a time; a failing club is logged and skipped.
    pub async fn run_deletion_sweep(&self) -> LifecycleResult<DeletionSweepResult> {
        let now = self.clock.now();
        let mut tx = self.store.begin().await?;
        let due = tx.list_clubs_due_for_deletion(now).await?;
        drop(tx);

        let mut result = DeletionSweepResult {
            eligible: due.len(),
            ..Default::default()
        };
        for club in &due {
            match self.orchestrator.delete_club(club.id, None).await {
                Ok(_) => result.deleted += 1,
                Err(e) => {
                    tracing::error!(club_id = club.id, slug = %club.slug, error = %e, "Scheduled club deletion failed");
                    result.failed += 1;
                }
            }
        }

        tracing::info!(
            eligible = result.eligible,
            deleted = result.deleted,
            failed = result.failed,
            "Deletion sweep finished",
        );
        Ok(result)
    }

    pub async fn run_milestone_sweep(&self) -> LifecycleResult<MilestoneSweepResult> {
        self.notifier.run_sweep().await
    }
}
