//! Repository for the `membership_periods` table.

use clubhouse_core::types::{Date, DbId};

use crate::models::membership_period::MembershipPeriod;
use crate::DbTx;

const COLUMNS: &str = "id, member_id, join_date, leave_date, created_at";

pub struct MembershipPeriodRepo;

impl MembershipPeriodRepo {
    /// The member's open period, if any (at most one by unique index).
    pub async fn find_open(
        tx: &mut DbTx<'_>,
        member_id: DbId,
    ) -> Result<Option<MembershipPeriod>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM membership_periods \
             WHERE member_id = $1 AND leave_date IS NULL"
        );
        sqlx::query_as::<_, MembershipPeriod>(&query)
            .bind(member_id)
            .fetch_optional(&mut **tx)
            .await
    }

    pub async fn open(
        tx: &mut DbTx<'_>,
        member_id: DbId,
        join_date: Date,
    ) -> Result<MembershipPeriod, sqlx::Error> {
        let query = format!(
            "INSERT INTO membership_periods (member_id, join_date) VALUES ($1, $2) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, MembershipPeriod>(&query)
            .bind(member_id)
            .bind(join_date)
            .fetch_one(&mut **tx)
            .await
    }

    pub async fn close(
        tx: &mut DbTx<'_>,
        id: DbId,
        leave_date: Date,
    ) -> Result<MembershipPeriod, sqlx::Error> {
        let query = format!(
            "UPDATE membership_periods SET leave_date = $2 WHERE id = $1 RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, MembershipPeriod>(&query)
            .bind(id)
            .bind(leave_date)
            .fetch_one(&mut **tx)
            .await
    }

    /// All periods of a member, oldest first.
    pub async fn list_by_member(
        tx: &mut DbTx<'_>,
        member_id: DbId,
    ) -> Result<Vec<MembershipPeriod>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM membership_periods WHERE member_id = $1 \
             ORDER BY join_date, id"
        );
        sqlx::query_as::<_, MembershipPeriod>(&query)
            .bind(member_id)
            .fetch_all(&mut **tx)
            .await
    }
}
