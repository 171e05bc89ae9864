//! Lifecycle operations against PostgreSQL through [`PgLifecycleStore`].
//!
//! Each test gets a fresh database with the `clubhouse-db` migrations
//! applied, so the repository SQL, foreign keys and CHECK constraints are
//! exercised for real. Fixture rows the services do not create themselves
//! (files, users, groups, types, settings) are inserted with plain SQL.

mod common;

use std::sync::Arc;

use assert_matches::assert_matches;
use chrono::NaiveDate;
use clubhouse_core::club_lifecycle::{PurgeStep, DEFAULT_PLATFORM_MIN_GRACE_DAYS};
use clubhouse_core::clock::{Clock, FixedClock};
use clubhouse_core::error::CoreError;
use clubhouse_core::member_status::{LeftCategory, MemberStatus};
use clubhouse_core::types::DbId;
use clubhouse_db::models::member::UpdateMember;
use clubhouse_events::EventBus;
use clubhouse_lifecycle::clubs::DeactivateClub;
use clubhouse_lifecycle::members::SetCancellation;
use clubhouse_lifecycle::object_store::InMemoryObjectStore;
use clubhouse_lifecycle::store::{LifecycleStore, PgLifecycleStore};
use clubhouse_lifecycle::{
    ClubLifecycleService, DeletionOrchestrator, LifecycleError, MemberService, StoreError,
};
use common::{change, new_member, start, ACTOR};
use sqlx::PgPool;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

struct PgHarness {
    pool: PgPool,
    store: Arc<dyn LifecycleStore>,
    objects: Arc<InMemoryObjectStore>,
    members: MemberService,
    clubs: ClubLifecycleService,
    orchestrator: DeletionOrchestrator,
}

impl PgHarness {
    fn new(pool: PgPool) -> Self {
        let store: Arc<dyn LifecycleStore> = Arc::new(PgLifecycleStore::new(pool.clone()));
        let clock: Arc<dyn Clock> = Arc::new(FixedClock::new(start()));
        let events = Arc::new(EventBus::default());
        let objects = Arc::new(InMemoryObjectStore::new());

        Self {
            members: MemberService::new(store.clone(), clock.clone(), events.clone()),
            clubs: ClubLifecycleService::new(
                store.clone(),
                clock.clone(),
                events.clone(),
                DEFAULT_PLATFORM_MIN_GRACE_DAYS,
            ),
            orchestrator: DeletionOrchestrator::new(store.clone(), objects.clone(), clock, events),
            pool,
            store,
            objects,
        }
    }

    async fn club(&self, name: &str, slug: &str) -> DbId {
        sqlx::query_scalar("INSERT INTO clubs (name, slug) VALUES ($1, $2) RETURNING id")
            .bind(name)
            .bind(slug)
            .fetch_one(&self.pool)
            .await
            .unwrap()
    }

    async fn file(&self, key: &str) -> DbId {
        self.objects.insert(key);
        sqlx::query_scalar("INSERT INTO files (storage_key) VALUES ($1) RETURNING id")
            .bind(key)
            .fetch_one(&self.pool)
            .await
            .unwrap()
    }

    async fn attach(&self, club_id: DbId, file_id: DbId) {
        sqlx::query("INSERT INTO club_files (club_id, file_id) VALUES ($1, $2)")
            .bind(club_id)
            .bind(file_id)
            .execute(&self.pool)
            .await
            .unwrap();
    }

    async fn user(&self, email: &str, avatar_file_id: Option<DbId>) -> DbId {
        sqlx::query_scalar(
            "INSERT INTO users (display_name, email, avatar_file_id) VALUES ($1, $1, $2) \
             RETURNING id",
        )
        .bind(email)
        .bind(avatar_file_id)
        .fetch_one(&self.pool)
        .await
        .unwrap()
    }

    async fn deactivate(&self, club_id: DbId, name: &str) {
        self.clubs
            .deactivate(
                club_id,
                &DeactivateClub {
                    confirmation_name: name.into(),
                    grace_period_days: 30,
                },
                ACTOR,
            )
            .await
            .unwrap();
    }

    async fn count(&self, sql: &str, club_id: DbId) -> i64 {
        sqlx::query_scalar(sql)
            .bind(club_id)
            .fetch_one(&self.pool)
            .await
            .unwrap_or_else(|e| panic!("{sql} failed: {e}"))
    }
}

/// A club populated across every table the purge touches, with an exclusive
/// attachment and logo, a file shared with `other_club` and a file that is
/// also a user's avatar.
async fn populated_club(h: &PgHarness, other_club: DbId) -> DbId {
    let club = h.club("Rowing Club", "rowing-club").await;

    let membership_type: DbId = sqlx::query_scalar(
        "INSERT INTO membership_types (club_id, name) VALUES ($1, 'Full') RETURNING id",
    )
    .bind(club)
    .fetch_one(&h.pool)
    .await
    .unwrap();
    sqlx::query("UPDATE clubs SET default_membership_type_id = $2 WHERE id = $1")
        .bind(club)
        .bind(membership_type)
        .execute(&h.pool)
        .await
        .unwrap();
    sqlx::query("INSERT INTO club_settings (club_id) VALUES ($1)")
        .bind(club)
        .execute(&h.pool)
        .await
        .unwrap();

    let mut input = new_member("Ada", "Lovelace", MemberStatus::Active);
    input.membership_type_id = Some(membership_type);
    let member = h.members.create_member(club, &input, ACTOR).await.unwrap();
    h.members
        .change_status(club, member.id, &change(MemberStatus::Suspended, None), ACTOR)
        .await
        .unwrap();
    h.members
        .create_member(club, &new_member("Grace", "Hopper", MemberStatus::Pending), ACTOR)
        .await
        .unwrap();

    let group: DbId = sqlx::query_scalar(
        "INSERT INTO member_groups (club_id, name) VALUES ($1, 'Crew') RETURNING id",
    )
    .bind(club)
    .fetch_one(&h.pool)
    .await
    .unwrap();
    sqlx::query("INSERT INTO member_group_assignments (member_id, group_id) VALUES ($1, $2)")
        .bind(member.id)
        .bind(group)
        .execute(&h.pool)
        .await
        .unwrap();

    let staff = h.user("coach@example.com", None).await;
    sqlx::query("INSERT INTO club_memberships (club_id, user_id, role) VALUES ($1, $2, 'staff')")
        .bind(club)
        .bind(staff)
        .execute(&h.pool)
        .await
        .unwrap();

    let minutes = h.file("clubs/rowing-club/minutes.pdf").await;
    h.attach(club, minutes).await;
    let logo = h.file("clubs/rowing-club/logo.png").await;
    sqlx::query("UPDATE clubs SET logo_file_id = $2 WHERE id = $1")
        .bind(club)
        .bind(logo)
        .execute(&h.pool)
        .await
        .unwrap();
    let shared = h.file("shared/regatta.pdf").await;
    h.attach(club, shared).await;
    h.attach(other_club, shared).await;
    let avatar = h.file("users/ada.png").await;
    h.attach(club, avatar).await;
    h.user("ada@example.com", Some(avatar)).await;

    h.deactivate(club, "Rowing Club").await;
    club
}

// ---------------------------------------------------------------------------
// Members
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../db/migrations")]
async fn stale_version_update_conflicts_and_keeps_row(pool: PgPool) {
    let h = PgHarness::new(pool);
    let club = h.club("Rowing Club", "rowing-club").await;
    let member = h
        .members
        .create_member(club, &new_member("Ada", "Lovelace", MemberStatus::Active), ACTOR)
        .await
        .unwrap();
    assert_eq!(member.version, 1);

    let first = UpdateMember {
        version: 1,
        phone: Some("+44 20 7946 0000".into()),
        ..Default::default()
    };
    let updated = h.members.update_member(club, member.id, &first).await.unwrap();
    assert_eq!(updated.version, 2);

    let stale = UpdateMember {
        version: 1,
        first_name: Some("Augusta".into()),
        ..Default::default()
    };
    let err = h.members.update_member(club, member.id, &stale).await.unwrap_err();
    assert_matches!(err, LifecycleError::Core(CoreError::Conflict(_)));

    let (version, first_name): (i32, String) =
        sqlx::query_as("SELECT version, first_name FROM members WHERE id = $1")
            .bind(member.id)
            .fetch_one(&h.pool)
            .await
            .unwrap();
    assert_eq!(version, 2);
    assert_eq!(first_name, "Ada");
}

#[sqlx::test(migrations = "../db/migrations")]
async fn leaving_clears_pending_cancellation_and_closes_period(pool: PgPool) {
    let h = PgHarness::new(pool);
    let club = h.club("Rowing Club", "rowing-club").await;
    let member = h
        .members
        .create_member(club, &new_member("Ada", "Lovelace", MemberStatus::Active), ACTOR)
        .await
        .unwrap();

    let notice = SetCancellation {
        cancellation_date: NaiveDate::from_ymd_opt(2026, 6, 30).unwrap(),
        received_at: None,
        reason: "moving away".into(),
    };
    let noted = h
        .members
        .set_cancellation(club, member.id, &notice, ACTOR)
        .await
        .unwrap();
    assert!(noted.has_cancellation());
    assert_eq!(noted.status().unwrap(), MemberStatus::Active);

    let left = h
        .members
        .change_status(
            club,
            member.id,
            &change(MemberStatus::Left, Some(LeftCategory::Voluntary)),
            ACTOR,
        )
        .await
        .unwrap();
    assert_eq!(left.status().unwrap(), MemberStatus::Left);
    assert!(left.cancellation_date.is_none());
    assert!(left.cancellation_received_at.is_none());

    let periods = h.members.get_membership_periods(club, member.id).await.unwrap();
    assert_eq!(periods.len(), 1);
    assert_eq!(periods[0].leave_date, Some(start().date_naive()));

    let history = h.members.get_status_history(club, member.id).await.unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].to_status_id, MemberStatus::Left.id());
    assert_eq!(history[0].left_category.as_deref(), Some("VOLUNTARY"));
}

// ---------------------------------------------------------------------------
// Permanent deletion
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../db/migrations")]
async fn full_purge_respects_foreign_keys_and_sweeps_orphans(pool: PgPool) {
    let h = PgHarness::new(pool);
    let other = h.club("Sailing Club", "sailing-club").await;
    let club = populated_club(&h, other).await;

    let result = h.orchestrator.delete_club(club, Some(ACTOR)).await.unwrap();

    assert_eq!(result.files_deleted, 2);
    assert_eq!(result.files_failed, 0);
    assert!(result.log_completed);
    assert!(h.objects.contains("shared/regatta.pdf"));
    assert!(h.objects.contains("users/ada.png"));
    assert!(!h.objects.contains("clubs/rowing-club/logo.png"));

    for sql in [
        "SELECT COUNT(*) FROM members WHERE club_id = $1",
        "SELECT COUNT(*) FROM member_status_transitions WHERE club_id = $1",
        "SELECT COUNT(*) FROM membership_types WHERE club_id = $1",
        "SELECT COUNT(*) FROM member_groups WHERE club_id = $1",
        "SELECT COUNT(*) FROM club_memberships WHERE club_id = $1",
        "SELECT COUNT(*) FROM club_settings WHERE club_id = $1",
        "SELECT COUNT(*) FROM club_files WHERE club_id = $1",
    ] {
        assert_eq!(h.count(sql, club).await, 0, "{sql}");
    }
    for table in ["membership_periods", "member_group_assignments"] {
        let rows: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {table}"))
            .fetch_one(&h.pool)
            .await
            .unwrap();
        assert_eq!(rows, 0, "{table}");
    }

    let (deleted, deactivated, logo, default_type): (bool, bool, Option<DbId>, Option<DbId>) =
        sqlx::query_as(
            "SELECT deleted_at IS NOT NULL, deactivated_at IS NOT NULL, logo_file_id, \
                    default_membership_type_id \
             FROM clubs WHERE id = $1",
        )
        .bind(club)
        .fetch_one(&h.pool)
        .await
        .unwrap();
    assert!(deleted);
    assert!(!deactivated);
    assert!(logo.is_none());
    assert!(default_type.is_none());

    let keys: Vec<String> = sqlx::query_scalar("SELECT storage_key FROM files ORDER BY storage_key")
        .fetch_all(&h.pool)
        .await
        .unwrap();
    assert_eq!(keys, vec!["shared/regatta.pdf", "users/ada.png"]);

    let completed: bool = sqlx::query_scalar(
        "SELECT deleted_at IS NOT NULL FROM club_deletion_logs WHERE club_slug = 'rowing-club'",
    )
    .fetch_one(&h.pool)
    .await
    .unwrap();
    assert!(completed);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn purge_out_of_order_is_rejected_by_foreign_keys(pool: PgPool) {
    let h = PgHarness::new(pool);
    let other = h.club("Sailing Club", "sailing-club").await;
    let club = populated_club(&h, other).await;

    let mut tx = h.store.begin().await.unwrap();
    let err = tx.purge(PurgeStep::Members, club).await.unwrap_err();
    drop(tx);

    assert_matches!(
        err,
        StoreError::Database(sqlx::Error::Database(db)) if db.is_foreign_key_violation()
    );
    assert_eq!(h.count("SELECT COUNT(*) FROM members WHERE club_id = $1", club).await, 2);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn orphan_sweep_keeps_files_still_referenced(pool: PgPool) {
    let h = PgHarness::new(pool);
    let club = h.club("Rowing Club", "rowing-club").await;
    let other = h.club("Sailing Club", "sailing-club").await;
    let shared = h.file("shared/regatta.pdf").await;
    h.attach(club, shared).await;
    h.attach(other, shared).await;
    let own = h.file("clubs/rowing-club/minutes.pdf").await;
    h.attach(club, own).await;

    let mut tx = h.store.begin().await.unwrap();
    let candidates = tx.list_file_ids_referenced_by_club(club).await.unwrap();
    assert_eq!(candidates.len(), 2);
    tx.purge(PurgeStep::ClubFiles, club).await.unwrap();
    let removed = tx.delete_unreferenced_files(&candidates).await.unwrap();
    tx.commit().await.unwrap();

    assert_eq!(removed, 1);
    let keys: Vec<String> = sqlx::query_scalar("SELECT storage_key FROM files")
        .fetch_all(&h.pool)
        .await
        .unwrap();
    assert_eq!(keys, vec!["shared/regatta.pdf"]);
}

// ---------------------------------------------------------------------------
// Deletion logs
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../db/migrations")]
async fn cancelled_log_rejects_milestone_writes(pool: PgPool) {
    let h = PgHarness::new(pool);
    let club = h.club("Rowing Club", "rowing-club").await;
    h.deactivate(club, "Rowing Club").await;
    let log_id: DbId =
        sqlx::query_scalar("SELECT id FROM club_deletion_logs WHERE club_slug = 'rowing-club'")
            .fetch_one(&h.pool)
            .await
            .unwrap();

    let mut tx = h.store.begin().await.unwrap();
    let open = tx.find_open_deletion_log_for_update(log_id).await.unwrap();
    assert_eq!(open.map(|l| l.id), Some(log_id));
    drop(tx);

    h.clubs.reactivate(club, ACTOR).await.unwrap();

    let mut tx = h.store.begin().await.unwrap();
    assert!(tx.find_open_deletion_log_for_update(log_id).await.unwrap().is_none());
    assert!(!tx.set_deletion_log_events(log_id, &[]).await.unwrap());
    tx.commit().await.unwrap();

    let events: i32 = sqlx::query_scalar(
        "SELECT jsonb_array_length(notification_events) FROM club_deletion_logs WHERE id = $1",
    )
    .bind(log_id)
    .fetch_one(&h.pool)
    .await
    .unwrap();
    assert_eq!(events, 1);
}
