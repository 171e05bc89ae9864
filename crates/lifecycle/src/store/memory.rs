//! In-memory [`LifecycleStore`].
//!
//! Holds the whole tenant data set behind one async mutex. A transaction
//! takes the lock for its lifetime and works on a copy of the state, which is
//! written back on commit and discarded on drop. Foreign keys are checked on
//! every purge step and file deletion, so out-of-order purges fail here the
//! same way they fail in PostgreSQL.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use clubhouse_core::club_lifecycle::{NotificationEvent, PurgeStep};
use clubhouse_core::member_status::MemberStatus;
use clubhouse_core::types::{Date, DbId, Timestamp};
use clubhouse_db::models::club::{Club, ClubDeactivation};
use clubhouse_db::models::deletion_log::{CreateDeletionLog, DeletionLog};
use clubhouse_db::models::file::StoredFile;
use clubhouse_db::models::member::{Cancellation, CreateMember, Member, UpdateMember};
use clubhouse_db::models::membership_period::MembershipPeriod;
use clubhouse_db::models::status_transition::{CreateStatusTransition, StatusTransition};
use sqlx::types::Json;
use tokio::sync::{Mutex, OwnedMutexGuard};

use super::{LifecycleStore, StoreTx};
use crate::error::StoreError;

// ---------------------------------------------------------------------------
// State
// ---------------------------------------------------------------------------

/// Every table the lifecycle touches. Junction tables are sets of id pairs.
#[derive(Debug, Clone, Default)]
pub struct MemoryState {
    next_id: DbId,
    pub clubs: BTreeMap<DbId, Club>,
    pub members: BTreeMap<DbId, Member>,
    pub periods: BTreeMap<DbId, MembershipPeriod>,
    pub transitions: BTreeMap<DbId, StatusTransition>,
    pub deletion_logs: BTreeMap<DbId, DeletionLog>,
    pub files: BTreeMap<DbId, StoredFile>,
    /// User id to avatar file id.
    pub users: BTreeMap<DbId, Option<DbId>>,
    /// Membership type id to owning club id.
    pub membership_types: BTreeMap<DbId, DbId>,
    /// Member group id to owning club id.
    pub member_groups: BTreeMap<DbId, DbId>,
    /// `(member_id, group_id)`.
    pub group_assignments: BTreeSet<(DbId, DbId)>,
    /// `(club_id, file_id)`.
    pub club_files: BTreeSet<(DbId, DbId)>,
    /// `(club_id, user_id)`.
    pub club_memberships: BTreeSet<(DbId, DbId)>,
    /// Clubs that have a settings row.
    pub club_settings: BTreeSet<DbId>,
    failing_purge_step: Option<PurgeStep>,
}

impl MemoryState {
    fn next_id(&mut self) -> DbId {
        self.next_id += 1;
        self.next_id
    }

    fn member_ids_of(&self, club_id: DbId) -> BTreeSet<DbId> {
        self.members
            .values()
            .filter(|m| m.club_id == club_id)
            .map(|m| m.id)
            .collect()
    }

    fn group_ids_of(&self, club_id: DbId) -> BTreeSet<DbId> {
        self.member_groups
            .iter()
            .filter(|(_, owner)| **owner == club_id)
            .map(|(id, _)| *id)
            .collect()
    }

    /// Files the club references through the association table or its logo.
    fn referenced_file_ids(&self, club_id: DbId) -> BTreeSet<DbId> {
        let mut ids: BTreeSet<DbId> = self
            .club_files
            .iter()
            .filter(|(c, _)| *c == club_id)
            .map(|(_, f)| *f)
            .collect();
        if let Some(logo) = self.clubs.get(&club_id).and_then(|c| c.logo_file_id) {
            ids.insert(logo);
        }
        ids
    }

    fn file_is_referenced(&self, file_id: DbId) -> bool {
        self.club_files.iter().any(|(_, f)| *f == file_id)
            || self.clubs.values().any(|c| c.logo_file_id == Some(file_id))
            || self.users.values().any(|a| *a == Some(file_id))
    }

    fn visible_member(&self, club_id: DbId, id: DbId) -> Option<&Member> {
        self.members
            .get(&id)
            .filter(|m| m.club_id == club_id && m.deleted_at.is_none())
    }

    fn live_club_mut(&mut self, id: DbId) -> Result<&mut Club, StoreError> {
        self.clubs
            .get_mut(&id)
            .filter(|c| c.deleted_at.is_none())
            .ok_or_else(|| missing("club", id))
    }

    /// Number of rows across all club-owned tables that belong to `club_id`.
    pub fn owned_row_count(&self, club_id: DbId) -> usize {
        let members = self.member_ids_of(club_id);
        let groups = self.group_ids_of(club_id);
        members.len()
            + groups.len()
            + self
                .transitions
                .values()
                .filter(|t| t.club_id == club_id)
                .count()
            + self
                .periods
                .values()
                .filter(|p| members.contains(&p.member_id))
                .count()
            + self
                .group_assignments
                .iter()
                .filter(|(m, g)| members.contains(m) || groups.contains(g))
                .count()
            + self.club_files.iter().filter(|(c, _)| *c == club_id).count()
            + self.membership_types.values().filter(|c| **c == club_id).count()
            + self
                .club_memberships
                .iter()
                .filter(|(c, _)| *c == club_id)
                .count()
            + usize::from(self.club_settings.contains(&club_id))
    }
}

fn missing(entity: &str, id: DbId) -> StoreError {
    StoreError::Integrity(format!("{entity} {id} does not exist"))
}

fn violation(table: &str, referenced_by: &str) -> StoreError {
    StoreError::Integrity(format!(
        "delete on {table} violates foreign key from {referenced_by}"
    ))
}

fn count(n: usize) -> u64 {
    u64::try_from(n).unwrap_or(u64::MAX)
}

// ---------------------------------------------------------------------------
// Store
// ---------------------------------------------------------------------------

#[derive(Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A copy of the committed state.
    pub async fn snapshot(&self) -> MemoryState {
        self.state.lock().await.clone()
    }

    /// Make the given purge step fail until cleared with `None`.
    pub async fn fail_purge_step(&self, step: Option<PurgeStep>) {
        self.state.lock().await.failing_purge_step = step;
    }

    pub async fn seed_club(&self, name: &str, slug: &str) -> DbId {
        let mut state = self.state.lock().await;
        let id = state.next_id();
        let now = Utc::now();
        state.clubs.insert(
            id,
            Club {
                id,
                name: name.to_string(),
                slug: slug.to_string(),
                logo_file_id: None,
                default_membership_type_id: None,
                deactivated_at: None,
                deactivated_by: None,
                scheduled_deletion_at: None,
                grace_period_days: None,
                deleted_at: None,
                deleted_by: None,
                created_at: now,
                updated_at: now,
            },
        );
        id
    }

    pub async fn seed_file(&self, storage_key: &str) -> DbId {
        let mut state = self.state.lock().await;
        let id = state.next_id();
        state.files.insert(
            id,
            StoredFile {
                id,
                storage_key: storage_key.to_string(),
                original_name: None,
                content_type: None,
                size_bytes: None,
                created_at: Utc::now(),
            },
        );
        id
    }

    pub async fn attach_file(&self, club_id: DbId, file_id: DbId) {
        self.state.lock().await.club_files.insert((club_id, file_id));
    }

    pub async fn set_logo(&self, club_id: DbId, file_id: DbId) {
        if let Some(club) = self.state.lock().await.clubs.get_mut(&club_id) {
            club.logo_file_id = Some(file_id);
        }
    }

    pub async fn seed_user(&self, avatar_file_id: Option<DbId>) -> DbId {
        let mut state = self.state.lock().await;
        let id = state.next_id();
        state.users.insert(id, avatar_file_id);
        id
    }

    pub async fn seed_membership_type(&self, club_id: DbId) -> DbId {
        let mut state = self.state.lock().await;
        let id = state.next_id();
        state.membership_types.insert(id, club_id);
        id
    }

    pub async fn set_default_membership_type(&self, club_id: DbId, type_id: DbId) {
        if let Some(club) = self.state.lock().await.clubs.get_mut(&club_id) {
            club.default_membership_type_id = Some(type_id);
        }
    }

    pub async fn seed_member_group(&self, club_id: DbId) -> DbId {
        let mut state = self.state.lock().await;
        let id = state.next_id();
        state.member_groups.insert(id, club_id);
        id
    }

    pub async fn assign_group(&self, member_id: DbId, group_id: DbId) {
        self.state
            .lock()
            .await
            .group_assignments
            .insert((member_id, group_id));
    }

    pub async fn add_club_membership(&self, club_id: DbId, user_id: DbId) {
        self.state
            .lock()
            .await
            .club_memberships
            .insert((club_id, user_id));
    }

    pub async fn seed_club_settings(&self, club_id: DbId) {
        self.state.lock().await.club_settings.insert(club_id);
    }
}

#[async_trait]
impl LifecycleStore for MemoryStore {
    async fn begin(&self) -> Result<Box<dyn StoreTx>, StoreError> {
        let guard = self.state.clone().lock_owned().await;
        let working = guard.clone();
        Ok(Box::new(MemoryTx { guard, working }))
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

struct MemoryTx {
    guard: OwnedMutexGuard<MemoryState>,
    working: MemoryState,
}

// ---------------------------------------------------------------------------
// Transaction
// ---------------------------------------------------------------------------

#[async_trait]
impl StoreTx for MemoryTx {
    async fn create_member(
        &mut self,
        club_id: DbId,
        input: &CreateMember,
        status: MemberStatus,
    ) -> Result<Member, StoreError> {
        let s = &mut self.working;
        if !s.clubs.contains_key(&club_id) {
            return Err(missing("club", club_id));
        }
        if let Some(type_id) = input.membership_type_id {
            if !s.membership_types.contains_key(&type_id) {
                return Err(missing("membership type", type_id));
            }
        }
        let id = s.next_id();
        let now = Utc::now();
        let member = Member {
            id,
            club_id,
            membership_type_id: input.membership_type_id,
            first_name: input.first_name.clone(),
            last_name: input.last_name.clone(),
            email: input.email.clone(),
            phone: input.phone.clone(),
            address: input.address.clone(),
            date_of_birth: input.date_of_birth,
            status_id: status.id(),
            cancellation_date: None,
            cancellation_received_at: None,
            version: 1,
            deleted_at: None,
            created_at: now,
            updated_at: now,
        };
        s.members.insert(id, member.clone());
        Ok(member)
    }

    async fn find_member(
        &mut self,
        club_id: DbId,
        id: DbId,
    ) -> Result<Option<Member>, StoreError> {
        Ok(self.working.visible_member(club_id, id).cloned())
    }

    async fn find_member_for_update(
        &mut self,
        club_id: DbId,
        id: DbId,
    ) -> Result<Option<Member>, StoreError> {
        // The transaction already holds the store lock.
        Ok(self.working.visible_member(club_id, id).cloned())
    }

    async fn list_members(&mut self, club_id: DbId) -> Result<Vec<Member>, StoreError> {
        let mut members: Vec<Member> = self
            .working
            .members
            .values()
            .filter(|m| m.club_id == club_id && m.deleted_at.is_none())
            .cloned()
            .collect();
        members.sort_by(|a, b| {
            (&a.last_name, &a.first_name, a.id).cmp(&(&b.last_name, &b.first_name, b.id))
        });
        Ok(members)
    }

    async fn count_members(&mut self, club_id: DbId) -> Result<i64, StoreError> {
        let n = self
            .working
            .members
            .values()
            .filter(|m| m.club_id == club_id && m.deleted_at.is_none())
            .count();
        Ok(i64::try_from(n).unwrap_or(i64::MAX))
    }

    async fn update_member_status(
        &mut self,
        id: DbId,
        status: MemberStatus,
    ) -> Result<Member, StoreError> {
        let member = self
            .working
            .members
            .get_mut(&id)
            .ok_or_else(|| missing("member", id))?;
        member.status_id = status.id();
        if status == MemberStatus::Left {
            member.cancellation_date = None;
            member.cancellation_received_at = None;
        }
        member.updated_at = Utc::now();
        Ok(member.clone())
    }

    async fn set_member_cancellation(
        &mut self,
        id: DbId,
        cancellation: Option<Cancellation>,
    ) -> Result<Member, StoreError> {
        let member = self
            .working
            .members
            .get_mut(&id)
            .ok_or_else(|| missing("member", id))?;
        member.cancellation_date = cancellation.map(|c| c.cancellation_date);
        member.cancellation_received_at = cancellation.map(|c| c.received_at);
        member.updated_at = Utc::now();
        Ok(member.clone())
    }

    async fn update_member_versioned(
        &mut self,
        club_id: DbId,
        id: DbId,
        input: &UpdateMember,
    ) -> Result<Option<Member>, StoreError> {
        if let Some(type_id) = input.membership_type_id {
            if !self.working.membership_types.contains_key(&type_id) {
                return Err(missing("membership type", type_id));
            }
        }
        let Some(member) = self.working.members.get_mut(&id).filter(|m| {
            m.club_id == club_id && m.deleted_at.is_none() && m.version == input.version
        }) else {
            return Ok(None);
        };
        if let Some(v) = &input.first_name {
            member.first_name = v.clone();
        }
        if let Some(v) = &input.last_name {
            member.last_name = v.clone();
        }
        if let Some(v) = &input.email {
            member.email = Some(v.clone());
        }
        if let Some(v) = &input.phone {
            member.phone = Some(v.clone());
        }
        if let Some(v) = &input.address {
            member.address = Some(v.clone());
        }
        if let Some(v) = input.date_of_birth {
            member.date_of_birth = Some(v);
        }
        if let Some(v) = input.membership_type_id {
            member.membership_type_id = Some(v);
        }
        member.version += 1;
        member.updated_at = Utc::now();
        Ok(Some(member.clone()))
    }

    async fn soft_delete_member(
        &mut self,
        club_id: DbId,
        id: DbId,
        at: Timestamp,
    ) -> Result<bool, StoreError> {
        let Some(member) = self.working.members.get_mut(&id).filter(|m| {
            m.club_id == club_id
                && m.deleted_at.is_none()
                && m.status_id == MemberStatus::Left.id()
        }) else {
            return Ok(false);
        };
        member.deleted_at = Some(at);
        Ok(true)
    }

    async fn find_open_period(
        &mut self,
        member_id: DbId,
    ) -> Result<Option<MembershipPeriod>, StoreError> {
        Ok(self
            .working
            .periods
            .values()
            .find(|p| p.member_id == member_id && p.is_open())
            .cloned())
    }

    async fn open_period(
        &mut self,
        member_id: DbId,
        join_date: Date,
    ) -> Result<MembershipPeriod, StoreError> {
        let s = &mut self.working;
        if !s.members.contains_key(&member_id) {
            return Err(missing("member", member_id));
        }
        if s
            .periods
            .values()
            .any(|p| p.member_id == member_id && p.is_open())
        {
            return Err(StoreError::Integrity(format!(
                "member {member_id} already has an open membership period"
            )));
        }
        let id = s.next_id();
        let period = MembershipPeriod {
            id,
            member_id,
            join_date,
            leave_date: None,
            created_at: Utc::now(),
        };
        s.periods.insert(id, period.clone());
        Ok(period)
    }

    async fn close_period(
        &mut self,
        period_id: DbId,
        leave_date: Date,
    ) -> Result<MembershipPeriod, StoreError> {
        let period = self
            .working
            .periods
            .get_mut(&period_id)
            .ok_or_else(|| missing("membership period", period_id))?;
        period.leave_date = Some(leave_date);
        Ok(period.clone())
    }

    async fn list_periods(
        &mut self,
        member_id: DbId,
    ) -> Result<Vec<MembershipPeriod>, StoreError> {
        let mut periods: Vec<MembershipPeriod> = self
            .working
            .periods
            .values()
            .filter(|p| p.member_id == member_id)
            .cloned()
            .collect();
        periods.sort_by_key(|p| (p.join_date, p.id));
        Ok(periods)
    }

    async fn insert_status_transition(
        &mut self,
        input: &CreateStatusTransition,
    ) -> Result<StatusTransition, StoreError> {
        let s = &mut self.working;
        if !s.members.contains_key(&input.member_id) {
            return Err(missing("member", input.member_id));
        }
        if (input.to_status == MemberStatus::Left) != input.left_category.is_some() {
            return Err(StoreError::Integrity(
                "left_category must be set exactly when to_status is LEFT".into(),
            ));
        }
        let id = s.next_id();
        let row = StatusTransition {
            id,
            member_id: input.member_id,
            club_id: input.club_id,
            from_status_id: input.from_status.id(),
            to_status_id: input.to_status.id(),
            reason: input.reason.clone(),
            left_category: input.left_category.map(|c| c.as_str().to_string()),
            effective_date: input.effective_date,
            actor_id: input.actor_id,
            created_at: input.created_at,
        };
        s.transitions.insert(id, row.clone());
        Ok(row)
    }

    async fn list_status_transitions(
        &mut self,
        club_id: DbId,
        member_id: DbId,
    ) -> Result<Vec<StatusTransition>, StoreError> {
        let mut rows: Vec<StatusTransition> = self
            .working
            .transitions
            .values()
            .filter(|t| t.club_id == club_id && t.member_id == member_id)
            .cloned()
            .collect();
        rows.sort_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id)));
        Ok(rows)
    }

    async fn find_club(&mut self, id: DbId) -> Result<Option<Club>, StoreError> {
        Ok(self
            .working
            .clubs
            .get(&id)
            .filter(|c| c.deleted_at.is_none())
            .cloned())
    }

    async fn find_club_for_update(&mut self, id: DbId) -> Result<Option<Club>, StoreError> {
        Ok(self.working.clubs.get(&id).cloned())
    }

    async fn mark_club_deactivated(
        &mut self,
        id: DbId,
        deactivation: &ClubDeactivation,
    ) -> Result<Club, StoreError> {
        let club = self.working.live_club_mut(id)?;
        club.deactivated_at = Some(deactivation.deactivated_at);
        club.deactivated_by = Some(deactivation.deactivated_by);
        club.scheduled_deletion_at = Some(deactivation.scheduled_deletion_at);
        club.grace_period_days = Some(deactivation.grace_period_days);
        club.updated_at = Utc::now();
        Ok(club.clone())
    }

    async fn clear_club_deactivation(&mut self, id: DbId) -> Result<Club, StoreError> {
        let club = self.working.live_club_mut(id)?;
        club.deactivated_at = None;
        club.deactivated_by = None;
        club.scheduled_deletion_at = None;
        club.grace_period_days = None;
        club.updated_at = Utc::now();
        Ok(club.clone())
    }

    async fn tombstone_club(
        &mut self,
        id: DbId,
        at: Timestamp,
        by: Option<DbId>,
    ) -> Result<bool, StoreError> {
        let Some(club) = self
            .working
            .clubs
            .get_mut(&id)
            .filter(|c| c.deleted_at.is_none() && c.deactivated_at.is_some())
        else {
            return Ok(false);
        };
        club.deleted_at = Some(at);
        club.deleted_by = by;
        club.deactivated_at = None;
        club.deactivated_by = None;
        club.scheduled_deletion_at = None;
        club.grace_period_days = None;
        club.updated_at = Utc::now();
        Ok(true)
    }

    async fn list_clubs_due_for_deletion(
        &mut self,
        now: Timestamp,
    ) -> Result<Vec<Club>, StoreError> {
        let mut clubs: Vec<Club> = self
            .working
            .clubs
            .values()
            .filter(|c| {
                c.deleted_at.is_none()
                    && c.deactivated_at.is_some()
                    && c.scheduled_deletion_at.is_some_and(|at| at <= now)
            })
            .cloned()
            .collect();
        clubs.sort_by_key(|c| (c.scheduled_deletion_at, c.id));
        Ok(clubs)
    }

    async fn list_files_exclusive_to_club(
        &mut self,
        club_id: DbId,
    ) -> Result<Vec<StoredFile>, StoreError> {
        let s = &self.working;
        Ok(s.referenced_file_ids(club_id)
            .into_iter()
            .filter(|file_id| {
                !s.club_files
                    .iter()
                    .any(|(c, f)| f == file_id && *c != club_id)
                    && !s
                        .clubs
                        .values()
                        .any(|c| c.id != club_id && c.logo_file_id == Some(*file_id))
                    && !s.users.values().any(|a| *a == Some(*file_id))
            })
            .filter_map(|file_id| s.files.get(&file_id).cloned())
            .collect())
    }

    async fn list_file_ids_referenced_by_club(
        &mut self,
        club_id: DbId,
    ) -> Result<Vec<DbId>, StoreError> {
        Ok(self
            .working
            .referenced_file_ids(club_id)
            .into_iter()
            .collect())
    }

    async fn purge(&mut self, step: PurgeStep, club_id: DbId) -> Result<u64, StoreError> {
        let s = &mut self.working;
        if s.failing_purge_step == Some(step) {
            return Err(StoreError::Injected(format!("purge step {step:?}")));
        }
        let members = s.member_ids_of(club_id);
        let groups = s.group_ids_of(club_id);

        let affected = match step {
            PurgeStep::ClearDefaultMembershipType => {
                let club = s.clubs.get_mut(&club_id).ok_or_else(|| missing("club", club_id))?;
                u64::from(club.default_membership_type_id.take().is_some())
            }
            PurgeStep::ClearLogo => {
                let club = s.clubs.get_mut(&club_id).ok_or_else(|| missing("club", club_id))?;
                u64::from(club.logo_file_id.take().is_some())
            }
            PurgeStep::StatusTransitions => {
                let before = s.transitions.len();
                s.transitions
                    .retain(|_, t| t.club_id != club_id && !members.contains(&t.member_id));
                count(before - s.transitions.len())
            }
            PurgeStep::MembershipPeriods => {
                let before = s.periods.len();
                s.periods.retain(|_, p| !members.contains(&p.member_id));
                count(before - s.periods.len())
            }
            PurgeStep::GroupAssignments => {
                let before = s.group_assignments.len();
                s.group_assignments
                    .retain(|(m, g)| !members.contains(m) && !groups.contains(g));
                count(before - s.group_assignments.len())
            }
            PurgeStep::ClubFiles => {
                let before = s.club_files.len();
                s.club_files.retain(|(c, _)| *c != club_id);
                count(before - s.club_files.len())
            }
            PurgeStep::Members => {
                if s.transitions.values().any(|t| members.contains(&t.member_id)) {
                    return Err(violation("members", "member_status_transitions"));
                }
                if s.periods.values().any(|p| members.contains(&p.member_id)) {
                    return Err(violation("members", "membership_periods"));
                }
                if s.group_assignments.iter().any(|(m, _)| members.contains(m)) {
                    return Err(violation("members", "member_group_assignments"));
                }
                let before = s.members.len();
                s.members.retain(|_, m| m.club_id != club_id);
                count(before - s.members.len())
            }
            PurgeStep::MemberGroups => {
                if s.group_assignments.iter().any(|(_, g)| groups.contains(g)) {
                    return Err(violation("member_groups", "member_group_assignments"));
                }
                let before = s.member_groups.len();
                s.member_groups.retain(|_, owner| *owner != club_id);
                count(before - s.member_groups.len())
            }
            PurgeStep::MembershipTypes => {
                let types: BTreeSet<DbId> = s
                    .membership_types
                    .iter()
                    .filter(|(_, owner)| **owner == club_id)
                    .map(|(id, _)| *id)
                    .collect();
                if s.clubs.values().any(|c| {
                    c.default_membership_type_id
                        .is_some_and(|t| types.contains(&t))
                }) {
                    return Err(violation("membership_types", "clubs"));
                }
                if s
                    .members
                    .values()
                    .any(|m| m.membership_type_id.is_some_and(|t| types.contains(&t)))
                {
                    return Err(violation("membership_types", "members"));
                }
                s.membership_types.retain(|_, owner| *owner != club_id);
                count(types.len())
            }
            PurgeStep::ClubMemberships => {
                let before = s.club_memberships.len();
                s.club_memberships.retain(|(c, _)| *c != club_id);
                count(before - s.club_memberships.len())
            }
            PurgeStep::ClubSettings => u64::from(s.club_settings.remove(&club_id)),
        };
        Ok(affected)
    }

    async fn delete_unreferenced_files(&mut self, candidates: &[DbId]) -> Result<u64, StoreError> {
        let s = &mut self.working;
        let doomed: Vec<DbId> = candidates
            .iter()
            .copied()
            .filter(|id| s.files.contains_key(id) && !s.file_is_referenced(*id))
            .collect();
        for id in &doomed {
            s.files.remove(id);
        }
        Ok(count(doomed.len()))
    }

    async fn insert_deletion_log(
        &mut self,
        input: &CreateDeletionLog,
    ) -> Result<DeletionLog, StoreError> {
        let s = &mut self.working;
        let id = s.next_id();
        let now = Utc::now();
        let log = DeletionLog {
            id,
            club_id: input.club_id,
            club_name: input.club_name.clone(),
            club_slug: input.club_slug.clone(),
            initiated_by: input.initiated_by,
            deactivated_at: input.deactivated_at,
            scheduled_deletion_at: input.scheduled_deletion_at,
            grace_period_days: input.grace_period_days,
            member_count: input.member_count,
            cancelled: false,
            cancelled_at: None,
            cancelled_by: None,
            notification_events: Json(input.notification_events.clone()),
            deleted_at: None,
            created_at: now,
            updated_at: now,
        };
        s.deletion_logs.insert(id, log.clone());
        Ok(log)
    }

    async fn cancel_open_deletion_logs(
        &mut self,
        slug: &str,
        at: Timestamp,
        by: DbId,
    ) -> Result<u64, StoreError> {
        let mut cancelled = 0;
        for log in self
            .working
            .deletion_logs
            .values_mut()
            .filter(|l| l.club_slug == slug && l.is_open())
        {
            log.cancelled = true;
            log.cancelled_at = Some(at);
            log.cancelled_by = Some(by);
            cancelled += 1;
        }
        Ok(cancelled)
    }

    async fn find_open_deletion_log(
        &mut self,
        slug: &str,
    ) -> Result<Option<DeletionLog>, StoreError> {
        Ok(self
            .working
            .deletion_logs
            .values()
            .filter(|l| l.club_slug == slug && l.is_open())
            .max_by_key(|l| (l.created_at, l.id))
            .cloned())
    }

    async fn mark_deletion_log_completed(
        &mut self,
        id: DbId,
        at: Timestamp,
    ) -> Result<bool, StoreError> {
        let Some(log) = self
            .working
            .deletion_logs
            .get_mut(&id)
            .filter(|l| l.deleted_at.is_none())
        else {
            return Ok(false);
        };
        log.deleted_at = Some(at);
        Ok(true)
    }

    async fn list_open_deletion_logs(&mut self) -> Result<Vec<DeletionLog>, StoreError> {
        let mut logs: Vec<DeletionLog> = self
            .working
            .deletion_logs
            .values()
            .filter(|l| l.is_open())
            .cloned()
            .collect();
        logs.sort_by_key(|l| (l.scheduled_deletion_at, l.id));
        Ok(logs)
    }

    async fn find_open_deletion_log_for_update(
        &mut self,
        id: DbId,
    ) -> Result<Option<DeletionLog>, StoreError> {
        Ok(self
            .working
            .deletion_logs
            .get(&id)
            .filter(|l| l.is_open())
            .cloned())
    }

    async fn set_deletion_log_events(
        &mut self,
        id: DbId,
        events: &[NotificationEvent],
    ) -> Result<bool, StoreError> {
        let Some(log) = self
            .working
            .deletion_logs
            .get_mut(&id)
            .filter(|l| l.is_open())
        else {
            return Ok(false);
        };
        log.notification_events = Json(events.to_vec());
        Ok(true)
    }

    async fn commit(self: Box<Self>) -> Result<(), StoreError> {
        let MemoryTx { mut guard, working } = *self;
        *guard = working;
        Ok(())
    }
}
