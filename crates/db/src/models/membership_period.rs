//! Membership period model.

use clubhouse_core::types::{Date, DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A span of membership. `leave_date = None` means the period is open.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct MembershipPeriod {
    pub id: DbId,
    pub member_id: DbId,
    pub join_date: Date,
    pub leave_date: Option<Date>,
    pub created_at: Timestamp,
}

impl MembershipPeriod {
    pub fn is_open(&self) -> bool {
        self.leave_date.is_none()
    }
}
