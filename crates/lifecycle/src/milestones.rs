//! Countdown milestones on open deletion logs.
//!
//! Each run appends the milestone (`T-7`, `T-1`, `T-0`) that applies to a
//! log's remaining days, unless a milestone of that type is already
//! recorded. Running twice at the same instant records nothing new.

use std::sync::Arc;

use clubhouse_core::club_lifecycle::due_milestones;
use clubhouse_core::clock::Clock;
use clubhouse_db::models::deletion_log::DeletionLog;
use clubhouse_events::{event_types, EventBus, PlatformEvent};
use serde::Serialize;

use crate::error::LifecycleResult;
use crate::store::LifecycleStore;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MilestoneSweepResult {
    pub logs_checked: usize,
    pub milestones_recorded: usize,
    pub failed: usize,
}

pub struct MilestoneNotifier {
    store: Arc<dyn LifecycleStore>,
    clock: Arc<dyn Clock>,
    events: Arc<EventBus>,
}

impl MilestoneNotifier {
    pub fn new(store: Arc<dyn LifecycleStore>, clock: Arc<dyn Clock>, events: Arc<EventBus>) -> Self {
        Self {
            store,
            clock,
            events,
        }
    }

    /// Check every open deletion log. A failure on one log is counted and
    /// the sweep moves on.
    pub async fn run_sweep(&self) -> LifecycleResult<MilestoneSweepResult> {
        let mut tx = self.store.begin().await?;
        let logs = tx.list_open_deletion_logs().await?;
        drop(tx);

        let mut result = MilestoneSweepResult {
            logs_checked: logs.len(),
            ..Default::default()
        };
        for log in &logs {
            match self.record_due(log).await {
                Ok(n) => result.milestones_recorded += n,
                Err(e) => {
                    tracing::error!(deletion_log_id = log.id, club_id = log.club_id, error = %e, "Milestone check failed");
                    result.failed += 1;
                }
            }
        }

        tracing::info!(
            logs_checked = result.logs_checked,
            milestones_recorded = result.milestones_recorded,
            failed = result.failed,
            "Milestone sweep finished",
        );
        Ok(result)
    }

    /// Append and announce the milestones now due on `listed`.
    ///
    /// The log is re-read under a row lock, so one cancelled or completed
    /// since the sweep listed it is left alone.
    async fn record_due(&self, listed: &DeletionLog) -> LifecycleResult<usize> {
        let now = self.clock.now();
        let mut tx = self.store.begin().await?;
        let Some(log) = tx.find_open_deletion_log_for_update(listed.id).await? else {
            tracing::debug!(
                deletion_log_id = listed.id,
                club_id = listed.club_id,
                "Deletion log closed since listing, skipping",
            );
            return Ok(0);
        };

        let due = due_milestones(log.deactivated_at, log.scheduled_deletion_at, now, log.events());
        if due.is_empty() {
            return Ok(0);
        }

        let mut events = log.events().to_vec();
        events.extend(due.iter().cloned());
        if !tx.set_deletion_log_events(log.id, &events).await? {
            return Ok(0);
        }
        tx.commit().await?;

        for milestone in &due {
            tracing::info!(
                club_id = log.club_id,
                slug = %log.club_slug,
                milestone = milestone.milestone.as_str(),
                days_remaining = milestone.days_remaining,
                "Deletion milestone reached",
            );
            self.events.publish(
                PlatformEvent::new(event_types::CLUB_DELETION_MILESTONE)
                    .with_source(event_types::ENTITY_CLUB, log.club_id)
                    .with_club(log.club_id)
                    .with_payload(serde_json::json!({
                        "club_name": log.club_name,
                        "club_slug": log.club_slug,
                        "milestone": milestone.milestone,
                        "days_remaining": milestone.days_remaining,
                        "scheduled_deletion_at": log.scheduled_deletion_at,
                    }))
                    .at(now),
            );
        }
        Ok(due.len())
    }
}
