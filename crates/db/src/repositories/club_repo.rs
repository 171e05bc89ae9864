//! Repository for the `clubs` table (lifecycle columns).

use clubhouse_core::types::{DbId, Timestamp};

use crate::models::club::{Club, ClubDeactivation};
use crate::DbTx;

const COLUMNS: &str = "id, name, slug, logo_file_id, default_membership_type_id, \
    deactivated_at, deactivated_by, scheduled_deletion_at, grace_period_days, \
    deleted_at, deleted_by, created_at, updated_at";

pub struct ClubRepo;

impl ClubRepo {
    /// Find a club by ID. Excludes tombstoned clubs.
    pub async fn find_by_id(tx: &mut DbTx<'_>, id: DbId) -> Result<Option<Club>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM clubs WHERE id = $1 AND deleted_at IS NULL");
        sqlx::query_as::<_, Club>(&query)
            .bind(id)
            .fetch_optional(&mut **tx)
            .await
    }

    /// Row-locked read that includes tombstoned clubs, so callers can tell
    /// "already deleted" apart from "never existed".
    pub async fn find_by_id_for_update(
        tx: &mut DbTx<'_>,
        id: DbId,
    ) -> Result<Option<Club>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM clubs WHERE id = $1 FOR UPDATE");
        sqlx::query_as::<_, Club>(&query)
            .bind(id)
            .fetch_optional(&mut **tx)
            .await
    }

    /// Stamp the deactivation quartet.
    pub async fn mark_deactivated(
        tx: &mut DbTx<'_>,
        id: DbId,
        deactivation: &ClubDeactivation,
    ) -> Result<Club, sqlx::Error> {
        let query = format!(
            "UPDATE clubs SET \
                deactivated_at = $2, \
                deactivated_by = $3, \
                scheduled_deletion_at = $4, \
                grace_period_days = $5 \
             WHERE id = $1 AND deleted_at IS NULL \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Club>(&query)
            .bind(id)
            .bind(deactivation.deactivated_at)
            .bind(deactivation.deactivated_by)
            .bind(deactivation.scheduled_deletion_at)
            .bind(deactivation.grace_period_days)
            .fetch_one(&mut **tx)
            .await
    }

    /// Clear the deactivation quartet.
    pub async fn clear_deactivation(tx: &mut DbTx<'_>, id: DbId) -> Result<Club, sqlx::Error> {
        let query = format!(
            "UPDATE clubs SET \
                deactivated_at = NULL, \
                deactivated_by = NULL, \
                scheduled_deletion_at = NULL, \
                grace_period_days = NULL \
             WHERE id = $1 AND deleted_at IS NULL \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Club>(&query)
            .bind(id)
            .fetch_one(&mut **tx)
            .await
    }

    /// Tombstone a deactivated club: set `deleted_at/by` and clear the
    /// deactivation quartet in the same statement. Returns `true` if a row
    /// was tombstoned.
    pub async fn tombstone(
        tx: &mut DbTx<'_>,
        id: DbId,
        deleted_at: Timestamp,
        deleted_by: Option<DbId>,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE clubs SET \
                deleted_at = $2, \
                deleted_by = $3, \
                deactivated_at = NULL, \
                deactivated_by = NULL, \
                scheduled_deletion_at = NULL, \
                grace_period_days = NULL \
             WHERE id = $1 AND deleted_at IS NULL AND deactivated_at IS NOT NULL",
        )
        .bind(id)
        .bind(deleted_at)
        .bind(deleted_by)
        .execute(&mut **tx)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Deactivated, not yet deleted clubs whose scheduled deletion is due.
    pub async fn list_due_for_deletion(
        tx: &mut DbTx<'_>,
        now: Timestamp,
    ) -> Result<Vec<Club>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM clubs \
             WHERE deactivated_at IS NOT NULL \
               AND scheduled_deletion_at <= $1 \
               AND deleted_at IS NULL \
             ORDER BY scheduled_deletion_at, id"
        );
        sqlx::query_as::<_, Club>(&query)
            .bind(now)
            .fetch_all(&mut **tx)
            .await
    }
}
