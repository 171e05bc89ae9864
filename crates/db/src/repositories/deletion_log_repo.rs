//! Repository for the `club_deletion_logs` table.

use clubhouse_core::club_lifecycle::NotificationEvent;
use clubhouse_core::types::{DbId, Timestamp};
use sqlx::types::Json;

use crate::models::deletion_log::{CreateDeletionLog, DeletionLog};
use crate::DbTx;

const COLUMNS: &str = "id, club_id, club_name, club_slug, initiated_by, deactivated_at, \
    scheduled_deletion_at, grace_period_days, member_count, cancelled, cancelled_at, \
    cancelled_by, notification_events, deleted_at, created_at, updated_at";

pub struct DeletionLogRepo;

impl DeletionLogRepo {
    pub async fn create(
        tx: &mut DbTx<'_>,
        input: &CreateDeletionLog,
    ) -> Result<DeletionLog, sqlx::Error> {
        let query = format!(
            "INSERT INTO club_deletion_logs \
                (club_id, club_name, club_slug, initiated_by, deactivated_at, \
                 scheduled_deletion_at, grace_period_days, member_count, notification_events) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, DeletionLog>(&query)
            .bind(input.club_id)
            .bind(&input.club_name)
            .bind(&input.club_slug)
            .bind(input.initiated_by)
            .bind(input.deactivated_at)
            .bind(input.scheduled_deletion_at)
            .bind(input.grace_period_days)
            .bind(input.member_count)
            .bind(Json(&input.notification_events))
            .fetch_one(&mut **tx)
            .await
    }

    /// Cancel every open log for `slug`. Returns the number of logs cancelled.
    pub async fn cancel_open_for_slug(
        tx: &mut DbTx<'_>,
        slug: &str,
        cancelled_at: Timestamp,
        cancelled_by: DbId,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE club_deletion_logs SET cancelled = TRUE, cancelled_at = $2, cancelled_by = $3 \
             WHERE club_slug = $1 AND cancelled = FALSE AND deleted_at IS NULL",
        )
        .bind(slug)
        .bind(cancelled_at)
        .bind(cancelled_by)
        .execute(&mut **tx)
        .await?;
        Ok(result.rows_affected())
    }

    /// The most recent open log for `slug`.
    pub async fn find_open_by_slug(
        tx: &mut DbTx<'_>,
        slug: &str,
    ) -> Result<Option<DeletionLog>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM club_deletion_logs \
             WHERE club_slug = $1 AND cancelled = FALSE AND deleted_at IS NULL \
             ORDER BY created_at DESC, id DESC \
             LIMIT 1"
        );
        sqlx::query_as::<_, DeletionLog>(&query)
            .bind(slug)
            .fetch_optional(&mut **tx)
            .await
    }

    /// Stamp `deleted_at`, marking the permanent deletion complete.
    pub async fn mark_completed(
        tx: &mut DbTx<'_>,
        id: DbId,
        deleted_at: Timestamp,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE club_deletion_logs SET deleted_at = $2 WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .bind(deleted_at)
        .execute(&mut **tx)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// All logs that are neither cancelled nor completed.
    pub async fn list_open(tx: &mut DbTx<'_>) -> Result<Vec<DeletionLog>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM club_deletion_logs \
             WHERE cancelled = FALSE AND deleted_at IS NULL \
             ORDER BY scheduled_deletion_at, id"
        );
        sqlx::query_as::<_, DeletionLog>(&query)
            .fetch_all(&mut **tx)
            .await
    }

    /// Lock an open log by id. `None` once it is cancelled or completed.
    pub async fn find_open_for_update(
        tx: &mut DbTx<'_>,
        id: DbId,
    ) -> Result<Option<DeletionLog>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM club_deletion_logs \
             WHERE id = $1 AND cancelled = FALSE AND deleted_at IS NULL \
             FOR UPDATE"
        );
        sqlx::query_as::<_, DeletionLog>(&query)
            .bind(id)
            .fetch_optional(&mut **tx)
            .await
    }

    /// Replace the milestone list of an open log. Callers append to the list
    /// they locked with [`find_open_for_update`](Self::find_open_for_update).
    pub async fn set_notification_events(
        tx: &mut DbTx<'_>,
        id: DbId,
        events: &[NotificationEvent],
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE club_deletion_logs SET notification_events = $2 \
             WHERE id = $1 AND cancelled = FALSE AND deleted_at IS NULL",
        )
        .bind(id)
        .bind(Json(events))
        .execute(&mut **tx)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}
