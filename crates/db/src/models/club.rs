//! Club (tenant) model.

use clubhouse_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `clubs` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Club {
    pub id: DbId,
    pub name: String,
    pub slug: String,
    pub logo_file_id: Option<DbId>,
    pub default_membership_type_id: Option<DbId>,
    pub deactivated_at: Option<Timestamp>,
    pub deactivated_by: Option<DbId>,
    pub scheduled_deletion_at: Option<Timestamp>,
    pub grace_period_days: Option<i32>,
    pub deleted_at: Option<Timestamp>,
    pub deleted_by: Option<DbId>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Club {
    pub fn is_deactivated(&self) -> bool {
        self.deactivated_at.is_some()
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }

    /// `deleted_at IS NULL AND deactivated_at IS NOT NULL`.
    pub fn is_eligible_for_deletion(&self) -> bool {
        !self.is_deleted() && self.is_deactivated()
    }
}

/// The deactivation quartet, stamped and cleared as a unit.
#[derive(Debug, Clone, Copy)]
pub struct ClubDeactivation {
    pub deactivated_at: Timestamp,
    pub deactivated_by: DbId,
    pub scheduled_deletion_at: Timestamp,
    pub grace_period_days: i32,
}
