//! Club deletion log model.

use clubhouse_core::club_lifecycle::NotificationEvent;
use clubhouse_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::types::Json;
use sqlx::FromRow;

/// A row from `club_deletion_logs`. Outlives the club's data.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct DeletionLog {
    pub id: DbId,
    pub club_id: DbId,
    pub club_name: String,
    pub club_slug: String,
    pub initiated_by: DbId,
    pub deactivated_at: Timestamp,
    pub scheduled_deletion_at: Timestamp,
    pub grace_period_days: i32,
    pub member_count: i64,
    pub cancelled: bool,
    pub cancelled_at: Option<Timestamp>,
    pub cancelled_by: Option<DbId>,
    /// Ordered milestone records (`T_GRACE`, `T-7`, `T-1`, `T-0`).
    pub notification_events: Json<Vec<NotificationEvent>>,
    /// Set once permanent deletion has completed.
    pub deleted_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl DeletionLog {
    /// Neither cancelled by a reactivation nor completed by deletion.
    pub fn is_open(&self) -> bool {
        !self.cancelled && self.deleted_at.is_none()
    }

    pub fn events(&self) -> &[NotificationEvent] {
        &self.notification_events.0
    }
}

/// Insert payload for a deletion log.
#[derive(Debug, Clone)]
pub struct CreateDeletionLog {
    pub club_id: DbId,
    pub club_name: String,
    pub club_slug: String,
    pub initiated_by: DbId,
    pub deactivated_at: Timestamp,
    pub scheduled_deletion_at: Timestamp,
    pub grace_period_days: i32,
    pub member_count: i64,
    pub notification_events: Vec<NotificationEvent>,
}
