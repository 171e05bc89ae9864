//! Club (tenant) lifecycle rules: grace period math, deletion milestones and
//! the purge order used when a club is permanently deleted.
//!
//! Pure functions only. Persistence and orchestration live in
//! `clubhouse_lifecycle`.

use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::Timestamp;

// ---------------------------------------------------------------------------
// Grace period
// ---------------------------------------------------------------------------

/// Platform-wide floor for the grace period between deactivation and
/// permanent deletion, used when `PLATFORM_MIN_GRACE_DAYS` is not set.
pub const DEFAULT_PLATFORM_MIN_GRACE_DAYS: i32 = 7;

/// Grace periods longer than this get a separate "one week out" milestone.
///
/// Kept apart from the platform minimum: that floor is an operator setting,
/// while this threshold is tied to the fixed `T-7` notification itself.
pub const ONE_WEEK_MILESTONE_DAYS: i64 = 7;

/// Longest grace period a club may request (ten years).
pub const MAX_GRACE_DAYS: i32 = 3650;

const SECONDS_PER_DAY: i64 = 86_400;

/// Compute the grace period actually applied: `max(requested, platform_min)`.
///
/// The caller cannot go below the platform minimum; a negative request is
/// rejected rather than silently clamped, as is one above [`MAX_GRACE_DAYS`].
pub fn effective_grace_days(requested: i32, platform_min: i32) -> Result<i32, CoreError> {
    if requested < 0 {
        return Err(CoreError::Validation(format!(
            "Grace period must not be negative (got {requested} days)"
        )));
    }
    if requested > MAX_GRACE_DAYS {
        return Err(CoreError::Validation(format!(
            "Grace period must not exceed {MAX_GRACE_DAYS} days (got {requested} days)"
        )));
    }
    Ok(requested.max(platform_min))
}

/// `deactivated_at + grace_days`, or a validation error when the result is
/// outside the representable date range.
pub fn scheduled_deletion_at(
    deactivated_at: Timestamp,
    grace_days: i32,
) -> Result<Timestamp, CoreError> {
    deactivated_at
        .checked_add_signed(Duration::days(i64::from(grace_days)))
        .ok_or_else(|| {
            CoreError::Validation(format!(
                "Grace period of {grace_days} days is out of range"
            ))
        })
}

/// Whole days until `scheduled`, rounded up: `ceil((scheduled - now) / 1 day)`.
///
/// Zero or negative once the scheduled instant has passed.
pub fn days_remaining(scheduled: Timestamp, now: Timestamp) -> i64 {
    let secs = (scheduled - now).num_seconds();
    let whole = secs.div_euclid(SECONDS_PER_DAY);
    if secs.rem_euclid(SECONDS_PER_DAY) > 0 {
        whole + 1
    } else {
        whole
    }
}

// ---------------------------------------------------------------------------
// Milestones
// ---------------------------------------------------------------------------

/// Notification milestone recorded on a deletion log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MilestoneType {
    /// Recorded at deactivation: the grace period has started.
    #[serde(rename = "T_GRACE")]
    GraceStarted,
    #[serde(rename = "T-7")]
    OneWeek,
    #[serde(rename = "T-1")]
    OneDay,
    #[serde(rename = "T-0")]
    DeletionDue,
}

impl MilestoneType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::GraceStarted => "T_GRACE",
            Self::OneWeek => "T-7",
            Self::OneDay => "T-1",
            Self::DeletionDue => "T-0",
        }
    }
}

/// One entry of a deletion log's `notification_events` list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationEvent {
    #[serde(rename = "type")]
    pub milestone: MilestoneType,
    pub timestamp: Timestamp,
    pub days_remaining: i64,
}

impl NotificationEvent {
    pub fn new(milestone: MilestoneType, timestamp: Timestamp, days_remaining: i64) -> Self {
        Self {
            milestone,
            timestamp,
            days_remaining,
        }
    }
}

/// Whether the original grace period was long enough to warrant a `T-7`.
pub fn grace_exceeds_one_week(deactivated_at: Timestamp, scheduled: Timestamp) -> bool {
    scheduled - deactivated_at > Duration::days(ONE_WEEK_MILESTONE_DAYS)
}

/// The milestone that applies at `days_remaining`, if any.
///
/// - `T-7` when `1 < d <= 7` and the grace period exceeded a week
/// - `T-1` when `0 < d <= 1`
/// - `T-0` when `d <= 0`
pub fn milestone_for(days_remaining: i64, long_grace: bool) -> Option<MilestoneType> {
    match days_remaining {
        d if d <= 0 => Some(MilestoneType::DeletionDue),
        1 => Some(MilestoneType::OneDay),
        d if d <= ONE_WEEK_MILESTONE_DAYS && long_grace => Some(MilestoneType::OneWeek),
        _ => None,
    }
}

/// Milestones due now that are not yet in `recorded`.
///
/// Presence of the type in the existing list is the only idempotency check.
pub fn due_milestones(
    deactivated_at: Timestamp,
    scheduled: Timestamp,
    now: Timestamp,
    recorded: &[NotificationEvent],
) -> Vec<NotificationEvent> {
    let remaining = days_remaining(scheduled, now);
    let long_grace = grace_exceeds_one_week(deactivated_at, scheduled);

    milestone_for(remaining, long_grace)
        .filter(|m| !recorded.iter().any(|e| e.milestone == *m))
        .map(|m| NotificationEvent::new(m, now, remaining))
        .into_iter()
        .collect()
}

// ---------------------------------------------------------------------------
// Purge order
// ---------------------------------------------------------------------------

/// One step of the cascading relational deletion of a club.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PurgeStep {
    /// Null out `clubs.default_membership_type_id`.
    ClearDefaultMembershipType,
    /// Null out `clubs.logo_file_id`.
    ClearLogo,
    StatusTransitions,
    MembershipPeriods,
    GroupAssignments,
    ClubFiles,
    Members,
    MemberGroups,
    MembershipTypes,
    ClubMemberships,
    ClubSettings,
}

/// Execution order. Children before parents, junctions before the rows they
/// reference, self-referencing pointers cleared before their target table.
pub const PURGE_ORDER: &[PurgeStep] = &[
    PurgeStep::ClearDefaultMembershipType,
    PurgeStep::ClearLogo,
    PurgeStep::StatusTransitions,
    PurgeStep::MembershipPeriods,
    PurgeStep::GroupAssignments,
    PurgeStep::ClubFiles,
    PurgeStep::Members,
    PurgeStep::MemberGroups,
    PurgeStep::MembershipTypes,
    PurgeStep::ClubMemberships,
    PurgeStep::ClubSettings,
];

impl PurgeStep {
    /// Table touched by the step.
    pub fn table(self) -> &'static str {
        match self {
            Self::ClearDefaultMembershipType | Self::ClearLogo => "clubs",
            Self::StatusTransitions => "member_status_transitions",
            Self::MembershipPeriods => "membership_periods",
            Self::GroupAssignments => "member_group_assignments",
            Self::ClubFiles => "club_files",
            Self::Members => "members",
            Self::MemberGroups => "member_groups",
            Self::MembershipTypes => "membership_types",
            Self::ClubMemberships => "club_memberships",
            Self::ClubSettings => "club_settings",
        }
    }

    /// Steps that must already have run, mirroring the schema's foreign keys.
    pub fn must_follow(self) -> &'static [PurgeStep] {
        match self {
            Self::Members => &[
                Self::StatusTransitions,
                Self::MembershipPeriods,
                Self::GroupAssignments,
            ],
            Self::MemberGroups => &[Self::GroupAssignments],
            Self::MembershipTypes => &[Self::ClearDefaultMembershipType, Self::Members],
            _ => &[],
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
