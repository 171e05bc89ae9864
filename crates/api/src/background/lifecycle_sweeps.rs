//! Daily club lifecycle sweeps.
//!
//! Runs the deletion sweep and the milestone sweep once a day each, at the
//! UTC times configured in [`LifecycleConfig`]. The two loops are
//! independent; a failing sweep is logged and retried on the next day.

use std::sync::Arc;

use chrono::NaiveTime;
use clubhouse_core::clock::Clock;
use clubhouse_core::scheduling::next_daily_run;
use clubhouse_lifecycle::{LifecycleConfig, LifecycleScheduler};
use tokio_util::sync::CancellationToken;

/// Which of the two daily sweeps a loop drives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sweep {
    Deletion,
    Milestone,
}

impl Sweep {
    fn name(self) -> &'static str {
        match self {
            Self::Deletion => "deletion",
            Self::Milestone => "milestone",
        }
    }
}

/// Run both daily sweeps until `cancel` is triggered.
pub async fn run(
    scheduler: Arc<LifecycleScheduler>,
    clock: Arc<dyn Clock>,
    config: LifecycleConfig,
    cancel: CancellationToken,
) {
    tokio::join!(
        run_daily(
            Sweep::Deletion,
            config.deletion_sweep_at,
            Arc::clone(&scheduler),
            Arc::clone(&clock),
            cancel.clone(),
        ),
        run_daily(
            Sweep::Milestone,
            config.milestone_sweep_at,
            scheduler,
            clock,
            cancel,
        ),
    );
}

/// Run one sweep every day at `at` (UTC).
pub async fn run_daily(
    sweep: Sweep,
    at: NaiveTime,
    scheduler: Arc<LifecycleScheduler>,
    clock: Arc<dyn Clock>,
    cancel: CancellationToken,
) {
    tracing::info!(sweep = sweep.name(), at = %at, "Lifecycle sweep job started");

    loop {
        let now = clock.now();
        let next = next_daily_run(now, at);
        let wait = (next - now).to_std().unwrap_or_default();
        tracing::debug!(sweep = sweep.name(), next_run = %next, "Lifecycle sweep scheduled");

        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!(sweep = sweep.name(), "Lifecycle sweep job stopping");
                break;
            }
            _ = tokio::time::sleep(wait) => {
                run_once(sweep, &scheduler).await;
            }
        }
    }
}

async fn run_once(sweep: Sweep, scheduler: &LifecycleScheduler) {
    match sweep {
        Sweep::Deletion => match scheduler.run_deletion_sweep().await {
            Ok(result) if result.failed > 0 => {
                tracing::warn!(
                    eligible = result.eligible,
                    deleted = result.deleted,
                    failed = result.failed,
                    "Deletion sweep: some clubs failed",
                );
            }
            Ok(result) => {
                tracing::info!(deleted = result.deleted, "Deletion sweep: done");
            }
            Err(e) => tracing::error!(error = %e, "Deletion sweep: failed"),
        },
        Sweep::Milestone => match scheduler.run_milestone_sweep().await {
            Ok(result) => {
                tracing::info!(
                    logs_checked = result.logs_checked,
                    milestones_recorded = result.milestones_recorded,
                    failed = result.failed,
                    "Milestone sweep: done",
                );
            }
            Err(e) => tracing::error!(error = %e, "Milestone sweep: failed"),
        },
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use chrono::{TimeZone, Utc};
    use clubhouse_core::clock::FixedClock;
    use clubhouse_events::EventBus;
    use clubhouse_lifecycle::clubs::{ClubLifecycleService, DeactivateClub};
    use clubhouse_lifecycle::object_store::InMemoryObjectStore;
    use clubhouse_lifecycle::store::{LifecycleStore, MemoryStore};
    use clubhouse_lifecycle::{DeletionOrchestrator, MilestoneNotifier};

    use super::*;

    fn scheduler(store: &MemoryStore, clock: Arc<FixedClock>) -> Arc<LifecycleScheduler> {
        let store: Arc<dyn LifecycleStore> = Arc::new(store.clone());
        let clock: Arc<dyn Clock> = clock;
        let events = Arc::new(EventBus::default());
        let orchestrator = Arc::new(DeletionOrchestrator::new(
            Arc::clone(&store),
            Arc::new(InMemoryObjectStore::new()),
            Arc::clone(&clock),
            Arc::clone(&events),
        ));
        let notifier = Arc::new(MilestoneNotifier::new(
            Arc::clone(&store),
            Arc::clone(&clock),
            events,
        ));
        Arc::new(LifecycleScheduler::new(store, clock, orchestrator, notifier))
    }

    #[tokio::test]
    async fn stops_when_cancelled() {
        let store = MemoryStore::new();
        let clock = Arc::new(FixedClock::new(Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap()));
        let cancel = CancellationToken::new();
        cancel.cancel();

        let finished = tokio::time::timeout(
            Duration::from_secs(5),
            run(scheduler(&store, clock.clone()), clock, LifecycleConfig::default(), cancel),
        )
        .await;

        assert!(finished.is_ok(), "sweep loops must exit once cancelled");
    }

    #[tokio::test]
    async fn deletion_sweep_fires_at_configured_time() {
        let store = MemoryStore::new();
        let deactivated_at = Utc.with_ymd_and_hms(2026, 3, 1, 10, 0, 0).unwrap();
        let clock = Arc::new(FixedClock::new(deactivated_at));
        let club = store.seed_club("Rowing Club", "rowing-club").await;

        let clubs = ClubLifecycleService::new(
            Arc::new(store.clone()),
            clock.clone(),
            Arc::new(EventBus::default()),
            7,
        );
        clubs
            .deactivate(
                club,
                &DeactivateClub {
                    confirmation_name: "Rowing Club".into(),
                    grace_period_days: 7,
                },
                1,
            )
            .await
            .unwrap();

        // 200ms before the 11:00 run on the day the grace period ends.
        clock.set(
            Utc.with_ymd_and_hms(2026, 3, 8, 11, 0, 0).unwrap() - chrono::Duration::milliseconds(200),
        );
        let cancel = CancellationToken::new();
        let handle = tokio::spawn(run_daily(
            Sweep::Deletion,
            NaiveTime::from_hms_opt(11, 0, 0).unwrap(),
            scheduler(&store, clock.clone()),
            clock.clone(),
            cancel.clone(),
        ));

        let mut deleted = false;
        for _ in 0..50 {
            tokio::time::sleep(Duration::from_millis(100)).await;
            if store.snapshot().await.clubs[&club].deleted_at.is_some() {
                deleted = true;
                break;
            }
        }
        cancel.cancel();
        handle.await.unwrap();

        assert!(deleted, "club should be deleted by the scheduled sweep");
    }
}
