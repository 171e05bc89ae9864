//! Member lifecycle state machine.
//!
//! The allowed edges live in a single table ([`TRANSITIONS`]) so the whole
//! state machine can be reviewed in one place. Status ids match the
//! `member_statuses` seed data (1-based SMALLINT).

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Status ID type matching SMALLINT in the database.
pub type StatusId = i16;

/// Membership status of a single member.
#[repr(i16)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MemberStatus {
    Pending = 1,
    Probation = 2,
    Active = 3,
    Dormant = 4,
    Suspended = 5,
    /// Terminal. No outgoing edges.
    Left = 6,
}

impl MemberStatus {
    pub const ALL: [MemberStatus; 6] = [
        MemberStatus::Pending,
        MemberStatus::Probation,
        MemberStatus::Active,
        MemberStatus::Dormant,
        MemberStatus::Suspended,
        MemberStatus::Left,
    ];

    /// Return the database status ID.
    pub fn id(self) -> StatusId {
        self as StatusId
    }

    /// Resolve a database status ID.
    pub fn from_id(id: StatusId) -> Result<Self, CoreError> {
        Self::ALL
            .into_iter()
            .find(|s| s.id() == id)
            .ok_or_else(|| CoreError::Internal(format!("Unknown member status id {id}")))
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Probation => "PROBATION",
            Self::Active => "ACTIVE",
            Self::Dormant => "DORMANT",
            Self::Suspended => "SUSPENDED",
            Self::Left => "LEFT",
        }
    }

    pub fn is_terminal(self) -> bool {
        allowed_transitions(self).is_empty()
    }

    /// Whether a cancellation notice may be recorded for a member in this
    /// status. Departed members and applicants that were never admitted
    /// cannot announce a future departure.
    pub fn accepts_cancellation(self) -> bool {
        !matches!(self, Self::Left | Self::Pending)
    }

    /// Statuses a member may be created with at intake.
    pub fn is_valid_initial(self) -> bool {
        matches!(self, Self::Pending | Self::Probation | Self::Active)
    }
}

impl fmt::Display for MemberStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MemberStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| CoreError::Validation(format!("Unknown member status '{s}'")))
    }
}

// ---------------------------------------------------------------------------
// Transition table
// ---------------------------------------------------------------------------

/// Every allowed `from -> to` edge. Anything not listed is invalid.
pub const TRANSITIONS: &[(MemberStatus, &[MemberStatus])] = &[
    (
        MemberStatus::Pending,
        &[MemberStatus::Active, MemberStatus::Probation, MemberStatus::Left],
    ),
    (
        MemberStatus::Probation,
        &[MemberStatus::Active, MemberStatus::Left],
    ),
    (
        MemberStatus::Active,
        &[MemberStatus::Dormant, MemberStatus::Suspended, MemberStatus::Left],
    ),
    (
        MemberStatus::Dormant,
        &[MemberStatus::Active, MemberStatus::Left],
    ),
    (
        MemberStatus::Suspended,
        &[MemberStatus::Active, MemberStatus::Dormant, MemberStatus::Left],
    ),
    (MemberStatus::Left, &[]),
];

/// Returns the set of statuses reachable from `from` in one step.
pub fn allowed_transitions(from: MemberStatus) -> &'static [MemberStatus] {
    TRANSITIONS
        .iter()
        .find(|(status, _)| *status == from)
        .map(|(_, targets)| *targets)
        .unwrap_or(&[])
}

/// Check whether a transition from `from` to `to` is valid.
pub fn can_transition(from: MemberStatus, to: MemberStatus) -> bool {
    allowed_transitions(from).contains(&to)
}

/// Validate a transition, returning [`CoreError::InvalidTransition`] with the
/// allowed targets when the edge is not in the table.
pub fn validate_transition(from: MemberStatus, to: MemberStatus) -> Result<(), CoreError> {
    if can_transition(from, to) {
        Ok(())
    } else {
        Err(CoreError::InvalidTransition {
            from,
            to,
            allowed: allowed_transitions(from).to_vec(),
        })
    }
}

/// Admission out of `PENDING` starts a membership period.
pub fn opens_membership_period(from: MemberStatus, to: MemberStatus) -> bool {
    from == MemberStatus::Pending && matches!(to, MemberStatus::Active | MemberStatus::Probation)
}

// ---------------------------------------------------------------------------
// Departure category
// ---------------------------------------------------------------------------

/// Why a member left. Mandatory on every transition into `LEFT`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LeftCategory {
    Voluntary,
    Exclusion,
    Death,
    Other,
}

impl LeftCategory {
    pub const ALL: [LeftCategory; 4] = [
        LeftCategory::Voluntary,
        LeftCategory::Exclusion,
        LeftCategory::Death,
        LeftCategory::Other,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Voluntary => "VOLUNTARY",
            Self::Exclusion => "EXCLUSION",
            Self::Death => "DEATH",
            Self::Other => "OTHER",
        }
    }
}

impl fmt::Display for LeftCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LeftCategory {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| CoreError::Validation(format!("Unknown left category '{s}'")))
    }
}

/// Check the `LEFT` / category pairing: required for `LEFT`, rejected
/// otherwise. Never inferred.
pub fn validate_left_category(
    to: MemberStatus,
    category: Option<LeftCategory>,
) -> Result<(), CoreError> {
    match (to, category) {
        (MemberStatus::Left, None) => Err(CoreError::Validation(
            "left_category is required when changing status to LEFT".into(),
        )),
        (MemberStatus::Left, Some(_)) => Ok(()),
        (_, Some(_)) => Err(CoreError::Validation(format!(
            "left_category is only allowed when changing status to LEFT, not {to}"
        ))),
        (_, None) => Ok(()),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;
    use MemberStatus::*;

    const EXPECTED_EDGES: &[(MemberStatus, MemberStatus)] = &[
        (Pending, Active),
        (Pending, Probation),
        (Pending, Left),
        (Probation, Active),
        (Probation, Left),
        (Active, Dormant),
        (Active, Suspended),
        (Active, Left),
        (Dormant, Active),
        (Dormant, Left),
        (Suspended, Active),
        (Suspended, Dormant),
        (Suspended, Left),
    ];

    #[test]
    fn table_matches_expected_edges_exactly() {
        for from in MemberStatus::ALL {
            for to in MemberStatus::ALL {
                let expected = EXPECTED_EDGES.contains(&(from, to));
                assert_eq!(
                    can_transition(from, to),
                    expected,
                    "edge {from} -> {to} should be allowed={expected}"
                );
            }
        }
    }

    #[test]
    fn every_status_has_a_table_row() {
        for status in MemberStatus::ALL {
            assert!(TRANSITIONS.iter().any(|(s, _)| *s == status), "{status} missing");
        }
    }

    #[test]
    fn left_is_the_only_terminal_status() {
        let terminal: Vec<_> = MemberStatus::ALL.into_iter().filter(|s| s.is_terminal()).collect();
        assert_eq!(terminal, vec![Left]);
    }

    #[test]
    fn self_transitions_are_never_allowed() {
        for status in MemberStatus::ALL {
            assert!(!can_transition(status, status));
        }
    }

    #[test]
    fn invalid_transition_carries_allowed_set() {
        let err = validate_transition(Probation, Suspended).unwrap_err();
        assert_matches!(
            err,
            CoreError::InvalidTransition { from: Probation, to: Suspended, ref allowed }
                if allowed == &vec![Active, Left]
        );
    }

    #[test]
    fn valid_transition_passes() {
        assert!(validate_transition(Suspended, Dormant).is_ok());
    }

    #[test]
    fn status_ids_round_trip() {
        for status in MemberStatus::ALL {
            assert_eq!(MemberStatus::from_id(status.id()).unwrap(), status);
        }
        assert!(MemberStatus::from_id(0).is_err());
    }

    #[test]
    fn parse_is_case_insensitive() {
        assert_eq!("suspended".parse::<MemberStatus>().unwrap(), Suspended);
        assert_eq!("exclusion".parse::<LeftCategory>().unwrap(), LeftCategory::Exclusion);
        assert_matches!("GONE".parse::<MemberStatus>(), Err(CoreError::Validation(_)));
    }

    #[test]
    fn serde_uses_screaming_case() {
        assert_eq!(serde_json_str(&Probation), "\"PROBATION\"");
        let parsed: LeftCategory = serde_plain("\"DEATH\"");
        assert_eq!(parsed, LeftCategory::Death);
    }

    fn serde_json_str<T: Serialize>(value: &T) -> String {
        serde_json::to_string(value).unwrap()
    }

    fn serde_plain<T: serde::de::DeserializeOwned>(raw: &str) -> T {
        serde_json::from_str(raw).unwrap()
    }

    #[test]
    fn left_requires_category() {
        assert_matches!(validate_left_category(Left, None), Err(CoreError::Validation(_)));
        assert!(validate_left_category(Left, Some(LeftCategory::Other)).is_ok());
    }

    #[test]
    fn category_rejected_for_non_left_target() {
        assert_matches!(
            validate_left_category(Dormant, Some(LeftCategory::Voluntary)),
            Err(CoreError::Validation(_))
        );
        assert!(validate_left_category(Dormant, None).is_ok());
    }

    #[test]
    fn cancellation_acceptance() {
        assert!(!Pending.accepts_cancellation());
        assert!(!Left.accepts_cancellation());
        assert!(Probation.accepts_cancellation());
        assert!(Active.accepts_cancellation());
        assert!(Dormant.accepts_cancellation());
        assert!(Suspended.accepts_cancellation());
    }

    #[test]
    fn admission_opens_period() {
        assert!(opens_membership_period(Pending, Active));
        assert!(opens_membership_period(Pending, Probation));
        assert!(!opens_membership_period(Probation, Active));
        assert!(!opens_membership_period(Dormant, Active));
    }
}
