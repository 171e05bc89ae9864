use crate::member_status::MemberStatus;
use crate::types::DbId;

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: &'static str, id: DbId },

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error(
        "Invalid status transition: {from} -> {to} (allowed from {from}: {})",
        describe_allowed(.allowed)
    )]
    InvalidTransition {
        from: MemberStatus,
        to: MemberStatus,
        allowed: Vec<MemberStatus>,
    },

    #[error("Conflict: {0}")]
    Conflict(String),

    /// The entity no longer satisfies the precondition an operation was
    /// scheduled under (e.g. a club reactivated before its deletion ran).
    #[error("Not eligible: {0}")]
    NotEligible(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

fn describe_allowed(allowed: &[MemberStatus]) -> String {
    if allowed.is_empty() {
        return "none, status is terminal".to_string();
    }
    allowed
        .iter()
        .map(|s| s.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}
