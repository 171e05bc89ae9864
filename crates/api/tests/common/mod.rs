#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Method, Request, Response, StatusCode};
use axum::Router;
use chrono::{TimeZone, Utc};
use clubhouse_core::clock::{Clock, FixedClock};
use clubhouse_core::roles::{ROLE_ADMIN, ROLE_CLUB_ADMIN, ROLE_STAFF};
use clubhouse_core::types::DbId;
use clubhouse_events::EventBus;
use clubhouse_lifecycle::object_store::InMemoryObjectStore;
use clubhouse_lifecycle::store::{LifecycleStore, MemoryStore};
use clubhouse_lifecycle::{
    ClubLifecycleService, DeletionOrchestrator, LifecycleConfig, LifecycleScheduler,
    MemberService, MilestoneNotifier,
};
use http_body_util::BodyExt;
use tower::ServiceExt;

use clubhouse_api::auth::jwt::{generate_access_token, JwtConfig};
use clubhouse_api::config::ServerConfig;
use clubhouse_api::router::build_app_router;
use clubhouse_api::state::AppState;

/// Build a test `ServerConfig` with safe defaults.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        shutdown_timeout_secs: 30,
        jwt: JwtConfig {
            secret: "test-secret-that-is-long-enough-for-hmac".to_string(),
            access_token_expiry_mins: 15,
        },
        lifecycle: LifecycleConfig::default(),
    }
}

/// Everything a test needs to seed data and call the API.
pub struct TestApp {
    pub router: Router,
    pub store: MemoryStore,
    pub clock: Arc<FixedClock>,
    pub objects: Arc<InMemoryObjectStore>,
    pub config: ServerConfig,
}

/// Build the full application router over an in-memory store and a clock
/// fixed at 2026-03-01 10:00 UTC.
pub fn build_test_app() -> TestApp {
    let config = test_config();
    let store = MemoryStore::new();
    let clock = Arc::new(FixedClock::new(
        Utc.with_ymd_and_hms(2026, 3, 1, 10, 0, 0).unwrap(),
    ));
    let objects = Arc::new(InMemoryObjectStore::new());
    let events = Arc::new(EventBus::default());

    let dyn_store: Arc<dyn LifecycleStore> = Arc::new(store.clone());
    let dyn_clock: Arc<dyn Clock> = clock.clone();

    let orchestrator = Arc::new(DeletionOrchestrator::new(
        Arc::clone(&dyn_store),
        objects.clone(),
        Arc::clone(&dyn_clock),
        Arc::clone(&events),
    ));
    let notifier = Arc::new(MilestoneNotifier::new(
        Arc::clone(&dyn_store),
        Arc::clone(&dyn_clock),
        Arc::clone(&events),
    ));

    let state = AppState {
        store: Arc::clone(&dyn_store),
        config: Arc::new(config.clone()),
        members: Arc::new(MemberService::new(
            Arc::clone(&dyn_store),
            Arc::clone(&dyn_clock),
            Arc::clone(&events),
        )),
        clubs: Arc::new(ClubLifecycleService::new(
            Arc::clone(&dyn_store),
            Arc::clone(&dyn_clock),
            Arc::clone(&events),
            config.lifecycle.platform_min_grace_days,
        )),
        scheduler: Arc::new(LifecycleScheduler::new(
            Arc::clone(&dyn_store),
            dyn_clock,
            orchestrator,
            notifier,
        )),
        event_bus: events,
    };

    TestApp {
        router: build_app_router(state, &config),
        store,
        clock,
        objects,
        config,
    }
}

impl TestApp {
    pub fn admin_token(&self) -> String {
        generate_access_token(1, ROLE_ADMIN, None, &self.config.jwt).unwrap()
    }

    pub fn club_admin_token(&self, club_id: DbId) -> String {
        generate_access_token(100 + club_id, ROLE_CLUB_ADMIN, Some(club_id), &self.config.jwt)
            .unwrap()
    }

    pub fn staff_token(&self, club_id: DbId) -> String {
        generate_access_token(200 + club_id, ROLE_STAFF, Some(club_id), &self.config.jwt).unwrap()
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> Response<Body> {
        self.send(Method::GET, uri, token, None).await
    }

    pub async fn post(&self, uri: &str, token: &str, body: serde_json::Value) -> Response<Body> {
        self.send(Method::POST, uri, Some(token), Some(body)).await
    }

    pub async fn put(&self, uri: &str, token: &str, body: serde_json::Value) -> Response<Body> {
        self.send(Method::PUT, uri, Some(token), Some(body)).await
    }

    pub async fn delete(
        &self,
        uri: &str,
        token: &str,
        body: Option<serde_json::Value>,
    ) -> Response<Body> {
        self.send(Method::DELETE, uri, Some(token), body).await
    }

    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<serde_json::Value>,
    ) -> Response<Body> {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header("authorization", format!("Bearer {token}"));
        }
        let request = match body {
            Some(json) => builder
                .header("content-type", "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        self.router.clone().oneshot(request).await.unwrap()
    }
}

/// Collect a response body and parse it as JSON.
pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

/// Assert the status and return the parsed body.
pub async fn expect_json(response: Response<Body>, status: StatusCode) -> serde_json::Value {
    assert_eq!(response.status(), status);
    body_json(response).await
}
