use std::sync::Arc;

use clubhouse_events::EventBus;
use clubhouse_lifecycle::store::LifecycleStore;
use clubhouse_lifecycle::{ClubLifecycleService, LifecycleScheduler, MemberService};

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Cheaply cloneable: everything is behind an `Arc`.
#[derive(Clone)]
pub struct AppState {
    /// Persistence seam, PostgreSQL in production and in-memory in tests.
    pub store: Arc<dyn LifecycleStore>,
    pub config: Arc<ServerConfig>,
    pub members: Arc<MemberService>,
    pub clubs: Arc<ClubLifecycleService>,
    /// Runs the deletion and milestone sweeps on demand.
    pub scheduler: Arc<LifecycleScheduler>,
    /// Centralized event bus for lifecycle events.
    pub event_bus: Arc<EventBus>,
}
