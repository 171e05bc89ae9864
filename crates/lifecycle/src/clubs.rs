//! Club deactivation and reactivation.
//!
//! Deactivation starts a grace period at the end of which the deletion sweep
//! removes the club for good. Reactivation during the grace period restores
//! the club and cancels its open deletion log.

use std::sync::Arc;

use clubhouse_core::club_lifecycle::{
    days_remaining, effective_grace_days, scheduled_deletion_at, MilestoneType,
    NotificationEvent,
};
use clubhouse_core::clock::Clock;
use clubhouse_core::error::CoreError;
use clubhouse_core::types::{DbId, Timestamp};
use clubhouse_db::models::club::{Club, ClubDeactivation};
use clubhouse_db::models::deletion_log::CreateDeletionLog;
use clubhouse_events::{event_types, EventBus, PlatformEvent};
use serde::{Deserialize, Serialize};

use crate::error::LifecycleResult;
use crate::store::LifecycleStore;

#[derive(Debug, Clone, Deserialize)]
pub struct DeactivateClub {
    /// Must equal the club's current name exactly.
    pub confirmation_name: String,
    /// Floored at the platform minimum.
    pub grace_period_days: i32,
}

/// Deactivation state of a club, for countdown displays.
#[derive(Debug, Clone, Serialize)]
pub struct ClubLifecycleOverview {
    pub club_id: DbId,
    pub name: String,
    pub slug: String,
    pub is_deactivated: bool,
    pub deactivated_at: Option<Timestamp>,
    pub deactivated_by: Option<DbId>,
    pub scheduled_deletion_at: Option<Timestamp>,
    pub grace_period_days: Option<i32>,
    pub days_remaining: Option<i64>,
    pub platform_min_grace_days: i32,
    /// Milestones recorded on the open deletion log so far.
    pub notification_events: Vec<NotificationEvent>,
}

pub struct ClubLifecycleService {
    store: Arc<dyn LifecycleStore>,
    clock: Arc<dyn Clock>,
    events: Arc<EventBus>,
    platform_min_grace_days: i32,
}

impl ClubLifecycleService {
    pub fn new(
        store: Arc<dyn LifecycleStore>,
        clock: Arc<dyn Clock>,
        events: Arc<EventBus>,
        platform_min_grace_days: i32,
    ) -> Self {
        Self {
            store,
            clock,
            events,
            platform_min_grace_days,
        }
    }

    /// Deactivate a club and open its deletion log.
    pub async fn deactivate(
        &self,
        club_id: DbId,
        request: &DeactivateClub,
        actor_id: DbId,
    ) -> LifecycleResult<Club> {
        let now = self.clock.now();

        let mut tx = self.store.begin().await?;
        let club = tx
            .find_club_for_update(club_id)
            .await?
            .filter(|c| !c.is_deleted())
            .ok_or(CoreError::NotFound {
                entity: "Club",
                id: club_id,
            })?;

        if club.is_deactivated() {
            return Err(CoreError::Conflict("Club is already deactivated".into()).into());
        }
        if request.confirmation_name != club.name {
            return Err(CoreError::Validation(
                "confirmation_name does not match the club name".into(),
            )
            .into());
        }

        let grace_days = effective_grace_days(request.grace_period_days, self.platform_min_grace_days)?;
        let deactivation = ClubDeactivation {
            deactivated_at: now,
            deactivated_by: actor_id,
            scheduled_deletion_at: scheduled_deletion_at(now, grace_days)?,
            grace_period_days: grace_days,
        };

        let member_count = tx.count_members(club_id).await?;
        let updated = tx.mark_club_deactivated(club_id, &deactivation).await?;
        let log = tx
            .insert_deletion_log(&CreateDeletionLog {
                club_id,
                club_name: club.name.clone(),
                club_slug: club.slug.clone(),
                initiated_by: actor_id,
                deactivated_at: now,
                scheduled_deletion_at: deactivation.scheduled_deletion_at,
                grace_period_days: grace_days,
                member_count,
                notification_events: vec![NotificationEvent::new(
                    MilestoneType::GraceStarted,
                    now,
                    i64::from(grace_days),
                )],
            })
            .await?;
        tx.commit().await?;

        tracing::info!(
            club_id,
            actor_id,
            requested_days = request.grace_period_days,
            grace_days,
            scheduled_deletion_at = %deactivation.scheduled_deletion_at,
            deletion_log_id = log.id,
            "Club deactivated",
        );
        self.events.publish(
            PlatformEvent::new(event_types::CLUB_DEACTIVATED)
                .with_source(event_types::ENTITY_CLUB, club_id)
                .with_club(club_id)
                .with_actor(actor_id)
                .with_payload(serde_json::json!({
                    "requested_grace_days": request.grace_period_days,
                    "grace_period_days": grace_days,
                    "scheduled_deletion_at": deactivation.scheduled_deletion_at,
                    "member_count": member_count,
                    "deletion_log_id": log.id,
                }))
                .at(now),
        );
        Ok(updated)
    }

    /// Restore a deactivated club and cancel its open deletion logs.
    pub async fn reactivate(&self, club_id: DbId, actor_id: DbId) -> LifecycleResult<Club> {
        let now = self.clock.now();

        let mut tx = self.store.begin().await?;
        let club = tx
            .find_club_for_update(club_id)
            .await?
            .filter(|c| !c.is_deleted())
            .ok_or(CoreError::NotFound {
                entity: "Club",
                id: club_id,
            })?;
        if !club.is_deactivated() {
            return Err(CoreError::Conflict("Club is not deactivated".into()).into());
        }

        let updated = tx.clear_club_deactivation(club_id).await?;
        let cancelled = tx.cancel_open_deletion_logs(&club.slug, now, actor_id).await?;
        tx.commit().await?;

        tracing::info!(club_id, actor_id, cancelled_logs = cancelled, "Club reactivated");
        self.events.publish(
            PlatformEvent::new(event_types::CLUB_REACTIVATED)
                .with_source(event_types::ENTITY_CLUB, club_id)
                .with_club(club_id)
                .with_actor(actor_id)
                .with_payload(serde_json::json!({ "cancelled_logs": cancelled }))
                .at(now),
        );
        Ok(updated)
    }

    pub async fn lifecycle_overview(&self, club_id: DbId) -> LifecycleResult<ClubLifecycleOverview> {
        let now = self.clock.now();

        let mut tx = self.store.begin().await?;
        let club = tx.find_club(club_id).await?.ok_or(CoreError::NotFound {
            entity: "Club",
            id: club_id,
        })?;
        let notification_events = if club.is_deactivated() {
            tx.find_open_deletion_log(&club.slug)
                .await?
                .map(|log| log.notification_events.0)
                .unwrap_or_default()
        } else {
            Vec::new()
        };

        Ok(ClubLifecycleOverview {
            club_id: club.id,
            is_deactivated: club.is_deactivated(),
            deactivated_at: club.deactivated_at,
            deactivated_by: club.deactivated_by,
            scheduled_deletion_at: club.scheduled_deletion_at,
            grace_period_days: club.grace_period_days,
            days_remaining: club.scheduled_deletion_at.map(|at| days_remaining(at, now)),
            platform_min_grace_days: self.platform_min_grace_days,
            notification_events,
            name: club.name,
            slug: club.slug,
        })
    }
}
