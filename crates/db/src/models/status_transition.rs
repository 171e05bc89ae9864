//! Member status transition audit record.

use clubhouse_core::member_status::{LeftCategory, MemberStatus, StatusId};
use clubhouse_core::types::{Date, DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from `member_status_transitions`. Immutable once written.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct StatusTransition {
    pub id: DbId,
    pub member_id: DbId,
    pub club_id: DbId,
    pub from_status_id: StatusId,
    pub to_status_id: StatusId,
    pub reason: String,
    pub left_category: Option<String>,
    pub effective_date: Date,
    pub actor_id: DbId,
    pub created_at: Timestamp,
}

/// Insert payload for a transition record.
#[derive(Debug, Clone)]
pub struct CreateStatusTransition {
    pub member_id: DbId,
    pub club_id: DbId,
    pub from_status: MemberStatus,
    pub to_status: MemberStatus,
    pub reason: String,
    pub left_category: Option<LeftCategory>,
    pub effective_date: Date,
    pub actor_id: DbId,
    pub created_at: Timestamp,
}
