//! Repository for the shared `files` table.

use clubhouse_core::types::DbId;

use crate::models::file::StoredFile;
use crate::DbTx;

const COLUMNS: &str = "id, storage_key, original_name, content_type, size_bytes, created_at";

pub struct FileRepo;

impl FileRepo {
    /// Files referenced by the club (association table or logo) and by
    /// nobody else: no other club and no user avatar.
    pub async fn list_exclusive_to_club(
        tx: &mut DbTx<'_>,
        club_id: DbId,
    ) -> Result<Vec<StoredFile>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM files f \
             WHERE f.id IN ( \
                    SELECT cf.file_id FROM club_files cf WHERE cf.club_id = $1 \
                    UNION \
                    SELECT c.logo_file_id FROM clubs c \
                    WHERE c.id = $1 AND c.logo_file_id IS NOT NULL) \
               AND NOT EXISTS ( \
                    SELECT 1 FROM club_files o WHERE o.file_id = f.id AND o.club_id <> $1) \
               AND NOT EXISTS ( \
                    SELECT 1 FROM clubs o WHERE o.logo_file_id = f.id AND o.id <> $1) \
               AND NOT EXISTS ( \
                    SELECT 1 FROM users u WHERE u.avatar_file_id = f.id) \
             ORDER BY f.id"
        );
        sqlx::query_as::<_, StoredFile>(&query)
            .bind(club_id)
            .fetch_all(&mut **tx)
            .await
    }

    /// IDs of every file the club references, shared or not.
    pub async fn list_ids_referenced_by_club(
        tx: &mut DbTx<'_>,
        club_id: DbId,
    ) -> Result<Vec<DbId>, sqlx::Error> {
        let rows: Vec<(DbId,)> = sqlx::query_as(
            "SELECT file_id FROM club_files WHERE club_id = $1 \
             UNION \
             SELECT logo_file_id FROM clubs WHERE id = $1 AND logo_file_id IS NOT NULL",
        )
        .bind(club_id)
        .fetch_all(&mut **tx)
        .await?;
        Ok(rows.into_iter().map(|(id,)| id).collect())
    }

    /// Hard-delete those of `candidates` that no club and no user references
    /// any more. Returns the number of rows removed.
    pub async fn delete_unreferenced(
        tx: &mut DbTx<'_>,
        candidates: &[DbId],
    ) -> Result<u64, sqlx::Error> {
        if candidates.is_empty() {
            return Ok(0);
        }
        let result = sqlx::query(
            "DELETE FROM files f \
             WHERE f.id = ANY($1) \
               AND NOT EXISTS (SELECT 1 FROM club_files cf WHERE cf.file_id = f.id) \
               AND NOT EXISTS (SELECT 1 FROM clubs c WHERE c.logo_file_id = f.id) \
               AND NOT EXISTS (SELECT 1 FROM users u WHERE u.avatar_file_id = f.id)",
        )
        .bind(candidates)
        .execute(&mut **tx)
        .await?;
        Ok(result.rows_affected())
    }
}
