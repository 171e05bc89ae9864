//! Member status transition engine.
//!
//! Status changes are read-check-write inside one store transaction: the
//! member row is locked, the edge is checked against the transition table,
//! and the status update plus its audit row are committed together. Field
//! edits use the `version` counter instead.

use std::collections::HashSet;
use std::sync::Arc;

use clubhouse_core::clock::Clock;
use clubhouse_core::error::CoreError;
use clubhouse_core::member_status::{
    opens_membership_period, validate_left_category, validate_transition, LeftCategory,
    MemberStatus,
};
use clubhouse_core::types::{Date, DbId};
use clubhouse_db::models::member::{Cancellation, CreateMember, Member, UpdateMember};
use clubhouse_db::models::membership_period::MembershipPeriod;
use clubhouse_db::models::status_transition::StatusTransition;
use clubhouse_events::{event_types, EventBus, PlatformEvent};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::audit::{self, validate_reason, AuditEntry};
use crate::error::{LifecycleError, LifecycleResult};
use crate::store::{LifecycleStore, StoreTx};

// ---------------------------------------------------------------------------
// Requests and results
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct StatusChange {
    pub to_status: MemberStatus,
    pub reason: String,
    /// Defaults to today.
    pub effective_date: Option<Date>,
    /// Required when `to_status` is `LEFT`, rejected otherwise.
    pub left_category: Option<LeftCategory>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BulkStatusChange {
    pub member_ids: Vec<DbId>,
    #[serde(flatten)]
    pub change: StatusChange,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct BulkStatusResult {
    pub updated: Vec<DbId>,
    pub skipped: Vec<SkippedMember>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SkippedMember {
    pub id: DbId,
    pub reason: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SetCancellation {
    pub cancellation_date: Date,
    /// When the notice arrived. Defaults to today.
    pub received_at: Option<Date>,
    pub reason: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RevokeCancellation {
    pub reason: String,
}

// ---------------------------------------------------------------------------
// Service
// ---------------------------------------------------------------------------

pub struct MemberService {
    store: Arc<dyn LifecycleStore>,
    clock: Arc<dyn Clock>,
    events: Arc<EventBus>,
}

impl MemberService {
    pub fn new(store: Arc<dyn LifecycleStore>, clock: Arc<dyn Clock>, events: Arc<EventBus>) -> Self {
        Self {
            store,
            clock,
            events,
        }
    }

    /// Register a new member. The initial status defaults to `PENDING`;
    /// `PROBATION` and `ACTIVE` open a membership period at `join_date`.
    pub async fn create_member(
        &self,
        club_id: DbId,
        input: &CreateMember,
        actor_id: DbId,
    ) -> LifecycleResult<Member> {
        input.validate()?;
        let status = input.status.unwrap_or(MemberStatus::Pending);
        if !status.is_valid_initial() {
            return Err(CoreError::Validation(format!(
                "A new member cannot start as {status}"
            ))
            .into());
        }

        let mut tx = self.store.begin().await?;
        require_club(tx.as_mut(), club_id).await?;

        let member = tx.create_member(club_id, input, status).await?;
        if status != MemberStatus::Pending {
            let join_date = input.join_date.unwrap_or_else(|| self.clock.today());
            tx.open_period(member.id, join_date).await?;
        }
        tx.commit().await?;

        tracing::info!(club_id, member_id = member.id, %status, "Member created");
        self.publish(
            PlatformEvent::new(event_types::MEMBER_CREATED)
                .with_source(event_types::ENTITY_MEMBER, member.id)
                .with_club(club_id)
                .with_actor(actor_id)
                .with_payload(serde_json::json!({ "status": status })),
        );
        Ok(member)
    }

    pub async fn get_member(&self, club_id: DbId, member_id: DbId) -> LifecycleResult<Member> {
        let mut tx = self.store.begin().await?;
        let member = require_member(tx.as_mut(), club_id, member_id).await?;
        Ok(member)
    }

    pub async fn list_members(&self, club_id: DbId) -> LifecycleResult<Vec<Member>> {
        let mut tx = self.store.begin().await?;
        require_club(tx.as_mut(), club_id).await?;
        let members = tx.list_members(club_id).await?;
        Ok(members)
    }

    pub async fn get_membership_periods(
        &self,
        club_id: DbId,
        member_id: DbId,
    ) -> LifecycleResult<Vec<MembershipPeriod>> {
        let mut tx = self.store.begin().await?;
        require_member(tx.as_mut(), club_id, member_id).await?;
        let periods = tx.list_periods(member_id).await?;
        Ok(periods)
    }

    /// Move a member along one edge of the transition table.
    pub async fn change_status(
        &self,
        club_id: DbId,
        member_id: DbId,
        change: &StatusChange,
        actor_id: DbId,
    ) -> LifecycleResult<Member> {
        let to = change.to_status;
        validate_left_category(to, change.left_category)?;
        validate_reason(&change.reason)?;
        let effective_date = change.effective_date.unwrap_or_else(|| self.clock.today());
        let now = self.clock.now();

        let mut tx = self.store.begin().await?;
        let member = lock_member(tx.as_mut(), club_id, member_id).await?;
        let from = member.status()?;
        validate_transition(from, to)?;

        let open_period = tx.find_open_period(member.id).await?;
        if to == MemberStatus::Left {
            if let Some(period) = open_period {
                if effective_date < period.join_date {
                    return Err(CoreError::Validation(format!(
                        "effective_date {effective_date} precedes the membership start {}",
                        period.join_date
                    ))
                    .into());
                }
                tx.close_period(period.id, effective_date).await?;
            }
        } else if opens_membership_period(from, to) && open_period.is_none() {
            tx.open_period(member.id, effective_date).await?;
        }

        let updated = tx.update_member_status(member.id, to).await?;
        audit::write(
            tx.as_mut(),
            &updated,
            AuditEntry::status_change(
                from,
                to,
                change.reason.trim(),
                change.left_category,
                effective_date,
                actor_id,
            ),
            now,
        )
        .await?;
        tx.commit().await?;

        tracing::info!(club_id, member_id, %from, %to, %effective_date, "Member status changed");
        self.publish(
            PlatformEvent::new(event_types::MEMBER_STATUS_CHANGED)
                .with_source(event_types::ENTITY_MEMBER, member_id)
                .with_club(club_id)
                .with_actor(actor_id)
                .with_payload(serde_json::json!({
                    "from": from,
                    "to": to,
                    "left_category": change.left_category,
                    "effective_date": effective_date,
                }))
                .at(now),
        );
        Ok(updated)
    }

    /// Apply [`change_status`](Self::change_status) to each id on its own.
    /// Failures are reported per member; the batch itself never fails.
    pub async fn bulk_change_status(
        &self,
        club_id: DbId,
        request: &BulkStatusChange,
        actor_id: DbId,
    ) -> BulkStatusResult {
        let mut seen = HashSet::new();
        let mut result = BulkStatusResult::default();

        for id in request.member_ids.iter().copied().filter(|id| seen.insert(*id)) {
            match self.change_status(club_id, id, &request.change, actor_id).await {
                Ok(_) => result.updated.push(id),
                Err(e) => {
                    let reason = match &e {
                        LifecycleError::Core(core) => core.to_string(),
                        LifecycleError::Store(store) => {
                            tracing::error!(club_id, member_id = id, error = %store, "Bulk status change failed");
                            "Internal error".to_string()
                        }
                    };
                    result.skipped.push(SkippedMember { id, reason });
                }
            }
        }

        tracing::info!(
            club_id,
            to = %request.change.to_status,
            updated = result.updated.len(),
            skipped = result.skipped.len(),
            "Bulk status change finished",
        );
        result
    }

    /// Record a member's notice to leave at a future date. Status is unchanged.
    pub async fn set_cancellation(
        &self,
        club_id: DbId,
        member_id: DbId,
        request: &SetCancellation,
        actor_id: DbId,
    ) -> LifecycleResult<Member> {
        validate_reason(&request.reason)?;
        let today = self.clock.today();
        let received_at = request.received_at.unwrap_or(today);
        if request.cancellation_date < today {
            return Err(CoreError::Validation(format!(
                "cancellation_date {} is in the past",
                request.cancellation_date
            ))
            .into());
        }
        if received_at > today {
            return Err(
                CoreError::Validation(format!("received_at {received_at} is in the future")).into(),
            );
        }
        let now = self.clock.now();

        let mut tx = self.store.begin().await?;
        let member = lock_member(tx.as_mut(), club_id, member_id).await?;
        let status = member.status()?;
        if !status.accepts_cancellation() {
            return Err(CoreError::Validation(format!(
                "A cancellation cannot be recorded for a {status} member"
            ))
            .into());
        }
        if member.has_cancellation() {
            return Err(CoreError::Conflict(
                "A cancellation is already recorded; revoke it first".into(),
            )
            .into());
        }

        let updated = tx
            .set_member_cancellation(
                member.id,
                Some(Cancellation {
                    cancellation_date: request.cancellation_date,
                    received_at,
                }),
            )
            .await?;
        audit::write(
            tx.as_mut(),
            &updated,
            AuditEntry::unchanged(
                status,
                request.reason.trim(),
                request.cancellation_date,
                actor_id,
            ),
            now,
        )
        .await?;
        tx.commit().await?;

        tracing::info!(club_id, member_id, cancellation_date = %request.cancellation_date, "Cancellation recorded");
        self.publish(
            PlatformEvent::new(event_types::MEMBER_CANCELLATION_SET)
                .with_source(event_types::ENTITY_MEMBER, member_id)
                .with_club(club_id)
                .with_actor(actor_id)
                .with_payload(serde_json::json!({
                    "cancellation_date": request.cancellation_date,
                    "received_at": received_at,
                }))
                .at(now),
        );
        Ok(updated)
    }

    /// Withdraw a recorded cancellation.
    pub async fn revoke_cancellation(
        &self,
        club_id: DbId,
        member_id: DbId,
        request: &RevokeCancellation,
        actor_id: DbId,
    ) -> LifecycleResult<Member> {
        validate_reason(&request.reason)?;
        let now = self.clock.now();

        let mut tx = self.store.begin().await?;
        let member = lock_member(tx.as_mut(), club_id, member_id).await?;
        let status = member.status()?;
        if status == MemberStatus::Left {
            return Err(CoreError::Validation(
                "A member who has left has no cancellation to revoke".into(),
            )
            .into());
        }
        if !member.has_cancellation() {
            return Err(CoreError::Validation("No cancellation is recorded".into()).into());
        }

        let updated = tx.set_member_cancellation(member.id, None).await?;
        audit::write(
            tx.as_mut(),
            &updated,
            AuditEntry::unchanged(status, request.reason.trim(), self.clock.today(), actor_id),
            now,
        )
        .await?;
        tx.commit().await?;

        tracing::info!(club_id, member_id, "Cancellation revoked");
        self.publish(
            PlatformEvent::new(event_types::MEMBER_CANCELLATION_REVOKED)
                .with_source(event_types::ENTITY_MEMBER, member_id)
                .with_club(club_id)
                .with_actor(actor_id)
                .at(now),
        );
        Ok(updated)
    }

    /// Audit trail of a member, newest first.
    pub async fn get_status_history(
        &self,
        club_id: DbId,
        member_id: DbId,
    ) -> LifecycleResult<Vec<StatusTransition>> {
        let mut tx = self.store.begin().await?;
        require_member(tx.as_mut(), club_id, member_id).await?;
        let history = tx.list_status_transitions(club_id, member_id).await?;
        Ok(history)
    }

    /// Versioned field edit. A stale `version` yields a conflict and leaves
    /// the stored row untouched; the caller reloads and retries.
    pub async fn update_member(
        &self,
        club_id: DbId,
        member_id: DbId,
        input: &UpdateMember,
    ) -> LifecycleResult<Member> {
        input.validate()?;

        let mut tx = self.store.begin().await?;
        let updated = tx.update_member_versioned(club_id, member_id, input).await?;
        match updated {
            Some(member) => {
                tx.commit().await?;
                tracing::debug!(club_id, member_id, version = member.version, "Member updated");
                Ok(member)
            }
            None => match tx.find_member(club_id, member_id).await? {
                None => Err(CoreError::NotFound {
                    entity: "Member",
                    id: member_id,
                }
                .into()),
                Some(current) => Err(CoreError::Conflict(format!(
                    "Member {member_id} was modified concurrently (expected version {}, current {}); reload and retry",
                    input.version, current.version
                ))
                .into()),
            },
        }
    }

    /// Tombstone a member who has left.
    pub async fn soft_delete_member(
        &self,
        club_id: DbId,
        member_id: DbId,
        actor_id: DbId,
    ) -> LifecycleResult<()> {
        let now = self.clock.now();
        let mut tx = self.store.begin().await?;
        let member = lock_member(tx.as_mut(), club_id, member_id).await?;
        if member.status()? != MemberStatus::Left {
            return Err(CoreError::Validation(
                "Only members who have left can be deleted".into(),
            )
            .into());
        }
        tx.soft_delete_member(club_id, member_id, now).await?;
        tx.commit().await?;

        tracing::info!(club_id, member_id, actor_id, "Member soft-deleted");
        Ok(())
    }

    fn publish(&self, event: PlatformEvent) {
        self.events.publish(event);
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

async fn require_club(tx: &mut dyn StoreTx, club_id: DbId) -> LifecycleResult<()> {
    tx.find_club(club_id).await?.ok_or(CoreError::NotFound {
        entity: "Club",
        id: club_id,
    })?;
    Ok(())
}

async fn require_member(tx: &mut dyn StoreTx, club_id: DbId, member_id: DbId) -> LifecycleResult<Member> {
    Ok(tx
        .find_member(club_id, member_id)
        .await?
        .ok_or(CoreError::NotFound {
            entity: "Member",
            id: member_id,
        })?)
}

async fn lock_member(tx: &mut dyn StoreTx, club_id: DbId, member_id: DbId) -> LifecycleResult<Member> {
    Ok(tx
        .find_member_for_update(club_id, member_id)
        .await?
        .ok_or(CoreError::NotFound {
            entity: "Member",
            id: member_id,
        })?)
}
