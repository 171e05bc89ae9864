//! Repository for the `members` table.

use clubhouse_core::member_status::MemberStatus;
use clubhouse_core::types::{DbId, Timestamp};

use crate::models::member::{Cancellation, CreateMember, Member, UpdateMember};
use crate::DbTx;

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, club_id, membership_type_id, first_name, last_name, email, phone, \
    address, date_of_birth, status_id, cancellation_date, cancellation_received_at, version, \
    deleted_at, created_at, updated_at";

/// Provides queries over members. All lookups are scoped to a club and
/// exclude soft-deleted rows.
pub struct MemberRepo;

impl MemberRepo {
    /// Insert a new member with the given initial status.
    pub async fn create(
        tx: &mut DbTx<'_>,
        club_id: DbId,
        input: &CreateMember,
        status: MemberStatus,
    ) -> Result<Member, sqlx::Error> {
        let query = format!(
            "INSERT INTO members \
                (club_id, membership_type_id, first_name, last_name, email, phone, address, \
                 date_of_birth, status_id) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Member>(&query)
            .bind(club_id)
            .bind(input.membership_type_id)
            .bind(&input.first_name)
            .bind(&input.last_name)
            .bind(&input.email)
            .bind(&input.phone)
            .bind(&input.address)
            .bind(input.date_of_birth)
            .bind(status.id())
            .fetch_one(&mut **tx)
            .await
    }

    /// Find a member by ID within a club.
    pub async fn find_by_id(
        tx: &mut DbTx<'_>,
        club_id: DbId,
        id: DbId,
    ) -> Result<Option<Member>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM members \
             WHERE id = $1 AND club_id = $2 AND deleted_at IS NULL"
        );
        sqlx::query_as::<_, Member>(&query)
            .bind(id)
            .bind(club_id)
            .fetch_optional(&mut **tx)
            .await
    }

    /// Same as [`find_by_id`](Self::find_by_id) but takes a row lock held
    /// until the transaction ends. Used for read-check-write status changes.
    pub async fn find_by_id_for_update(
        tx: &mut DbTx<'_>,
        club_id: DbId,
        id: DbId,
    ) -> Result<Option<Member>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM members \
             WHERE id = $1 AND club_id = $2 AND deleted_at IS NULL \
             FOR UPDATE"
        );
        sqlx::query_as::<_, Member>(&query)
            .bind(id)
            .bind(club_id)
            .fetch_optional(&mut **tx)
            .await
    }

    /// List a club's members ordered by name.
    pub async fn list_by_club(
        tx: &mut DbTx<'_>,
        club_id: DbId,
    ) -> Result<Vec<Member>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM members \
             WHERE club_id = $1 AND deleted_at IS NULL \
             ORDER BY last_name, first_name, id"
        );
        sqlx::query_as::<_, Member>(&query)
            .bind(club_id)
            .fetch_all(&mut **tx)
            .await
    }

    /// Count a club's members that are not soft-deleted.
    pub async fn count_by_club(tx: &mut DbTx<'_>, club_id: DbId) -> Result<i64, sqlx::Error> {
        let count: (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM members WHERE club_id = $1 AND deleted_at IS NULL",
        )
        .bind(club_id)
        .fetch_one(&mut **tx)
        .await?;
        Ok(count.0)
    }

    /// Write a new status. Moving to `LEFT` also drops any pending
    /// cancellation, since a departed member cannot announce a departure.
    pub async fn update_status(
        tx: &mut DbTx<'_>,
        id: DbId,
        status: MemberStatus,
    ) -> Result<Member, sqlx::Error> {
        let query = format!(
            "UPDATE members SET \
                status_id = $2, \
                cancellation_date = CASE WHEN $2 = $3 THEN NULL ELSE cancellation_date END, \
                cancellation_received_at = \
                    CASE WHEN $2 = $3 THEN NULL ELSE cancellation_received_at END \
             WHERE id = $1 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Member>(&query)
            .bind(id)
            .bind(status.id())
            .bind(MemberStatus::Left.id())
            .fetch_one(&mut **tx)
            .await
    }

    /// Set (`Some`) or clear (`None`) the cancellation fields.
    pub async fn set_cancellation(
        tx: &mut DbTx<'_>,
        id: DbId,
        cancellation: Option<Cancellation>,
    ) -> Result<Member, sqlx::Error> {
        let query = format!(
            "UPDATE members SET cancellation_date = $2, cancellation_received_at = $3 \
             WHERE id = $1 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Member>(&query)
            .bind(id)
            .bind(cancellation.map(|c| c.cancellation_date))
            .bind(cancellation.map(|c| c.received_at))
            .fetch_one(&mut **tx)
            .await
    }

    /// Apply a field edit only if `input.version` still matches, bumping the
    /// version. Returns `None` when no row matched (missing or stale).
    pub async fn update_versioned(
        tx: &mut DbTx<'_>,
        club_id: DbId,
        id: DbId,
        input: &UpdateMember,
    ) -> Result<Option<Member>, sqlx::Error> {
        let query = format!(
            "UPDATE members SET \
                first_name = COALESCE($4, first_name), \
                last_name = COALESCE($5, last_name), \
                email = COALESCE($6, email), \
                phone = COALESCE($7, phone), \
                address = COALESCE($8, address), \
                date_of_birth = COALESCE($9, date_of_birth), \
                membership_type_id = COALESCE($10, membership_type_id), \
                version = version + 1 \
             WHERE id = $1 AND club_id = $2 AND version = $3 AND deleted_at IS NULL \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Member>(&query)
            .bind(id)
            .bind(club_id)
            .bind(input.version)
            .bind(&input.first_name)
            .bind(&input.last_name)
            .bind(&input.email)
            .bind(&input.phone)
            .bind(&input.address)
            .bind(input.date_of_birth)
            .bind(input.membership_type_id)
            .fetch_optional(&mut **tx)
            .await
    }

    /// Soft-delete a departed member. Returns `true` if a row was marked.
    pub async fn soft_delete(
        tx: &mut DbTx<'_>,
        club_id: DbId,
        id: DbId,
        deleted_at: Timestamp,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE members SET deleted_at = $3 \
             WHERE id = $1 AND club_id = $2 AND deleted_at IS NULL AND status_id = $4",
        )
        .bind(id)
        .bind(club_id)
        .bind(deleted_at)
        .bind(MemberStatus::Left.id())
        .execute(&mut **tx)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}
