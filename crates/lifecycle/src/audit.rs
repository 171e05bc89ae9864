//! Status transition audit trail.
//!
//! Every status change and every cancellation set/revoke writes exactly one
//! [`StatusTransition`] through [`write`], inside the same transaction as the
//! member update it describes.

use clubhouse_core::error::CoreError;
use clubhouse_core::member_status::{LeftCategory, MemberStatus};
use clubhouse_core::types::{Date, DbId, Timestamp};
use clubhouse_db::models::member::Member;
use clubhouse_db::models::status_transition::{CreateStatusTransition, StatusTransition};

use crate::error::StoreError;
use crate::store::StoreTx;

/// What happened to the member, minus the identifiers.
#[derive(Debug, Clone)]
pub struct AuditEntry {
    pub from: MemberStatus,
    pub to: MemberStatus,
    pub reason: String,
    pub left_category: Option<LeftCategory>,
    pub effective_date: Date,
    pub actor_id: DbId,
}

impl AuditEntry {
    pub fn status_change(
        from: MemberStatus,
        to: MemberStatus,
        reason: impl Into<String>,
        left_category: Option<LeftCategory>,
        effective_date: Date,
        actor_id: DbId,
    ) -> Self {
        Self {
            from,
            to,
            reason: reason.into(),
            left_category,
            effective_date,
            actor_id,
        }
    }

    /// An entry whose status does not change (`from == to`), used to trace
    /// cancellation notices.
    pub fn unchanged(
        status: MemberStatus,
        reason: impl Into<String>,
        effective_date: Date,
        actor_id: DbId,
    ) -> Self {
        Self::status_change(status, status, reason, None, effective_date, actor_id)
    }
}

/// Insert the audit row for `member`.
pub async fn write(
    tx: &mut dyn StoreTx,
    member: &Member,
    entry: AuditEntry,
    recorded_at: Timestamp,
) -> Result<StatusTransition, StoreError> {
    let row = tx
        .insert_status_transition(&CreateStatusTransition {
            member_id: member.id,
            club_id: member.club_id,
            from_status: entry.from,
            to_status: entry.to,
            reason: entry.reason,
            left_category: entry.left_category,
            effective_date: entry.effective_date,
            actor_id: entry.actor_id,
            created_at: recorded_at,
        })
        .await?;
    tracing::debug!(
        member_id = member.id,
        club_id = member.club_id,
        from = %entry.from,
        to = %entry.to,
        transition_id = row.id,
        "Status transition recorded",
    );
    Ok(row)
}

/// Reasons are free text but must say something.
pub fn validate_reason(reason: &str) -> Result<(), CoreError> {
    if reason.trim().is_empty() {
        return Err(CoreError::Validation("reason must not be empty".into()));
    }
    Ok(())
}
