//! Member entity model and DTOs.

use clubhouse_core::error::CoreError;
use clubhouse_core::member_status::{MemberStatus, StatusId};
use clubhouse_core::types::{Date, DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// A member row from the `members` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Member {
    pub id: DbId,
    pub club_id: DbId,
    pub membership_type_id: Option<DbId>,
    pub first_name: String,
    pub last_name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub date_of_birth: Option<Date>,
    pub status_id: StatusId,
    pub cancellation_date: Option<Date>,
    pub cancellation_received_at: Option<Date>,
    /// Optimistic-lock counter for field edits. Status changes leave it alone.
    pub version: i32,
    pub deleted_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Member {
    pub fn status(&self) -> Result<MemberStatus, CoreError> {
        MemberStatus::from_id(self.status_id)
    }

    pub fn has_cancellation(&self) -> bool {
        self.cancellation_date.is_some()
    }
}

/// DTO for member intake.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateMember {
    #[validate(length(min = 1, max = 200))]
    pub first_name: String,
    #[validate(length(min = 1, max = 200))]
    pub last_name: String,
    #[validate(email)]
    pub email: Option<String>,
    #[validate(length(max = 50))]
    pub phone: Option<String>,
    pub address: Option<String>,
    pub date_of_birth: Option<Date>,
    pub membership_type_id: Option<DbId>,
    /// Defaults to `PENDING`. `PROBATION` and `ACTIVE` admit the member
    /// directly and open a membership period.
    pub status: Option<MemberStatus>,
    /// Start of the first membership period. Defaults to today.
    pub join_date: Option<Date>,
}

/// DTO for a versioned field edit. All fields except `version` are optional.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateMember {
    /// The version the caller last read. The update only applies if it still
    /// matches the stored one.
    pub version: i32,
    #[validate(length(min = 1, max = 200))]
    pub first_name: Option<String>,
    #[validate(length(min = 1, max = 200))]
    pub last_name: Option<String>,
    #[validate(email)]
    pub email: Option<String>,
    #[validate(length(max = 50))]
    pub phone: Option<String>,
    pub address: Option<String>,
    pub date_of_birth: Option<Date>,
    pub membership_type_id: Option<DbId>,
}

/// Cancellation fields written together.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cancellation {
    pub cancellation_date: Date,
    pub received_at: Date,
}
