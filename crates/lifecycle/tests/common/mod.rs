#![allow(dead_code)]

use std::sync::Arc;

use chrono::{NaiveDate, TimeZone, Utc};
use clubhouse_core::clock::{Clock, FixedClock};
use clubhouse_core::club_lifecycle::DEFAULT_PLATFORM_MIN_GRACE_DAYS;
use clubhouse_core::member_status::{LeftCategory, MemberStatus};
use clubhouse_core::types::{DbId, Timestamp};
use clubhouse_db::models::member::{CreateMember, Member};
use clubhouse_events::EventBus;
use clubhouse_lifecycle::clubs::{ClubLifecycleService, DeactivateClub};
use clubhouse_lifecycle::deletion::DeletionOrchestrator;
use clubhouse_lifecycle::members::{MemberService, StatusChange};
use clubhouse_lifecycle::milestones::MilestoneNotifier;
use clubhouse_lifecycle::object_store::InMemoryObjectStore;
use clubhouse_lifecycle::scheduler::LifecycleScheduler;
use clubhouse_lifecycle::store::{LifecycleStore, MemoryStore};

pub const ACTOR: DbId = 900;

/// 2026-03-01 10:00 UTC.
pub fn start() -> Timestamp {
    Utc.with_ymd_and_hms(2026, 3, 1, 10, 0, 0).unwrap()
}

pub struct Harness {
    pub store: MemoryStore,
    pub clock: Arc<FixedClock>,
    pub objects: Arc<InMemoryObjectStore>,
    pub events: Arc<EventBus>,
    pub members: MemberService,
    pub clubs: ClubLifecycleService,
    pub orchestrator: Arc<DeletionOrchestrator>,
    pub scheduler: LifecycleScheduler,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_min_grace(DEFAULT_PLATFORM_MIN_GRACE_DAYS)
    }

    pub fn with_min_grace(platform_min_grace_days: i32) -> Self {
        let store = MemoryStore::new();
        let clock = Arc::new(FixedClock::new(start()));
        let objects = Arc::new(InMemoryObjectStore::new());
        let events = Arc::new(EventBus::default());

        let dyn_store: Arc<dyn LifecycleStore> = Arc::new(store.clone());
        let dyn_clock: Arc<dyn Clock> = clock.clone();

        let members = MemberService::new(dyn_store.clone(), dyn_clock.clone(), events.clone());
        let clubs = ClubLifecycleService::new(
            dyn_store.clone(),
            dyn_clock.clone(),
            events.clone(),
            platform_min_grace_days,
        );
        let orchestrator = Arc::new(DeletionOrchestrator::new(
            dyn_store.clone(),
            objects.clone(),
            dyn_clock.clone(),
            events.clone(),
        ));
        let notifier = Arc::new(MilestoneNotifier::new(
            dyn_store.clone(),
            dyn_clock.clone(),
            events.clone(),
        ));
        let scheduler =
            LifecycleScheduler::new(dyn_store, dyn_clock, orchestrator.clone(), notifier);

        Self {
            store,
            clock,
            objects,
            events,
            members,
            clubs,
            orchestrator,
            scheduler,
        }
    }

    pub async fn club(&self, name: &str) -> DbId {
        let slug = name.to_lowercase().replace(' ', "-");
        self.store.seed_club(name, &slug).await
    }

    /// A member of `club_id` currently in `status`, reached through valid
    /// transitions.
    pub async fn member(&self, club_id: DbId, status: MemberStatus) -> Member {
        let initial = match status {
            MemberStatus::Pending | MemberStatus::Probation => status,
            _ => MemberStatus::Active,
        };
        let member = self
            .members
            .create_member(club_id, &new_member("Ada", "Lovelace", initial), ACTOR)
            .await
            .unwrap();
        if status == initial {
            return member;
        }
        let category = (status == MemberStatus::Left).then_some(LeftCategory::Voluntary);
        self.members
            .change_status(club_id, member.id, &change(status, category), ACTOR)
            .await
            .unwrap()
    }

    /// Deactivate with the club's own name as confirmation.
    pub async fn deactivate(&self, club_id: DbId, grace_days: i32) {
        let name = self.store.snapshot().await.clubs[&club_id].name.clone();
        self.clubs
            .deactivate(
                club_id,
                &DeactivateClub {
                    confirmation_name: name,
                    grace_period_days: grace_days,
                },
                ACTOR,
            )
            .await
            .unwrap();
    }

    pub fn clock_today(&self) -> NaiveDate {
        self.clock.today()
    }

    pub async fn transition_count(&self) -> usize {
        self.store.snapshot().await.transitions.len()
    }
}

pub fn new_member(first: &str, last: &str, status: MemberStatus) -> CreateMember {
    CreateMember {
        first_name: first.into(),
        last_name: last.into(),
        email: Some(format!("{}@example.com", first.to_lowercase())),
        phone: None,
        address: None,
        date_of_birth: None,
        membership_type_id: None,
        status: Some(status),
        join_date: None,
    }
}

pub fn change(to: MemberStatus, left_category: Option<LeftCategory>) -> StatusChange {
    StatusChange {
        to_status: to,
        reason: "board decision".into(),
        effective_date: None,
        left_category,
    }
}
