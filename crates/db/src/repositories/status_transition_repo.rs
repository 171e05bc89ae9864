//! Repository for the `member_status_transitions` audit table.
//!
//! Insert and read only. The core never updates or deletes transitions; they
//! are removed solely by the club purge.

use clubhouse_core::types::DbId;

use crate::models::status_transition::{CreateStatusTransition, StatusTransition};
use crate::DbTx;

const COLUMNS: &str = "id, member_id, club_id, from_status_id, to_status_id, reason, \
    left_category, effective_date, actor_id, created_at";

pub struct StatusTransitionRepo;

impl StatusTransitionRepo {
    pub async fn create(
        tx: &mut DbTx<'_>,
        input: &CreateStatusTransition,
    ) -> Result<StatusTransition, sqlx::Error> {
        let query = format!(
            "INSERT INTO member_status_transitions \
                (member_id, club_id, from_status_id, to_status_id, reason, left_category, \
                 effective_date, actor_id, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, StatusTransition>(&query)
            .bind(input.member_id)
            .bind(input.club_id)
            .bind(input.from_status.id())
            .bind(input.to_status.id())
            .bind(&input.reason)
            .bind(input.left_category.map(|c| c.as_str()))
            .bind(input.effective_date)
            .bind(input.actor_id)
            .bind(input.created_at)
            .fetch_one(&mut **tx)
            .await
    }

    /// A member's transitions, newest first.
    pub async fn list_by_member(
        tx: &mut DbTx<'_>,
        club_id: DbId,
        member_id: DbId,
    ) -> Result<Vec<StatusTransition>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM member_status_transitions \
             WHERE club_id = $1 AND member_id = $2 \
             ORDER BY created_at DESC, id DESC"
        );
        sqlx::query_as::<_, StatusTransition>(&query)
            .bind(club_id)
            .bind(member_id)
            .fetch_all(&mut **tx)
            .await
    }
}
