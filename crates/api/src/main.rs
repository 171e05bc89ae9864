use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use clubhouse_core::clock::{Clock, SystemClock};
use clubhouse_events::{EventBus, EventLogger};
use clubhouse_lifecycle::object_store::ObjectStoreConfig;
use clubhouse_lifecycle::store::{LifecycleStore, PgLifecycleStore};
use clubhouse_lifecycle::{
    ClubLifecycleService, DeletionOrchestrator, LifecycleScheduler, MemberService,
    MilestoneNotifier,
};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use clubhouse_api::background;
use clubhouse_api::config::ServerConfig;
use clubhouse_api::router::build_app_router;
use clubhouse_api::state::AppState;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "clubhouse_api=debug,clubhouse_lifecycle=debug,tower_http=debug".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Configuration ---
    let config = ServerConfig::from_env();
    tracing::info!(
        host = %config.host,
        port = %config.port,
        platform_min_grace_days = config.lifecycle.platform_min_grace_days,
        "Loaded server configuration",
    );

    // --- Database ---
    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");

    let pool = clubhouse_db::create_pool(&database_url)
        .await
        .expect("Failed to connect to database");
    tracing::info!("Database connection pool created");

    clubhouse_db::health_check(&pool)
        .await
        .expect("Database health check failed");

    clubhouse_db::run_migrations(&pool)
        .await
        .expect("Failed to run database migrations");
    tracing::info!("Database migrations applied");

    // --- Object storage ---
    let objects = ObjectStoreConfig::from_env().build().await;

    // --- Event bus ---
    let event_bus = Arc::new(EventBus::default());
    let logger_handle = tokio::spawn(EventLogger::run(event_bus.subscribe()));

    // --- Lifecycle services ---
    let store: Arc<dyn LifecycleStore> = Arc::new(PgLifecycleStore::new(pool));
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);

    let members = Arc::new(MemberService::new(
        Arc::clone(&store),
        Arc::clone(&clock),
        Arc::clone(&event_bus),
    ));
    let clubs = Arc::new(ClubLifecycleService::new(
        Arc::clone(&store),
        Arc::clone(&clock),
        Arc::clone(&event_bus),
        config.lifecycle.platform_min_grace_days,
    ));
    let orchestrator = Arc::new(DeletionOrchestrator::new(
        Arc::clone(&store),
        objects,
        Arc::clone(&clock),
        Arc::clone(&event_bus),
    ));
    let notifier = Arc::new(MilestoneNotifier::new(
        Arc::clone(&store),
        Arc::clone(&clock),
        Arc::clone(&event_bus),
    ));
    let scheduler = Arc::new(LifecycleScheduler::new(
        Arc::clone(&store),
        Arc::clone(&clock),
        orchestrator,
        notifier,
    ));

    // --- Daily sweeps ---
    let sweep_cancel = CancellationToken::new();
    let sweep_handle = tokio::spawn(background::lifecycle_sweeps::run(
        Arc::clone(&scheduler),
        Arc::clone(&clock),
        config.lifecycle.clone(),
        sweep_cancel.clone(),
    ));
    tracing::info!(
        deletion_sweep_at = %config.lifecycle.deletion_sweep_at,
        milestone_sweep_at = %config.lifecycle.milestone_sweep_at,
        "Lifecycle sweeps scheduled",
    );

    // --- App state ---
    let state = AppState {
        store,
        config: Arc::new(config.clone()),
        members,
        clubs,
        scheduler,
        event_bus: Arc::clone(&event_bus),
    };

    let app = build_app_router(state, &config);

    // --- Start server ---
    let addr = SocketAddr::new(
        config.host.parse().expect("Invalid HOST address"),
        config.port,
    );
    tracing::info!(%addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");

    // --- Post-shutdown cleanup ---
    tracing::info!("Server stopped accepting connections, cleaning up");
    let drain = Duration::from_secs(config.shutdown_timeout_secs);

    sweep_cancel.cancel();
    let _ = tokio::time::timeout(drain, sweep_handle).await;
    tracing::info!("Lifecycle sweeps stopped");

    // The logger exits once every sender is gone.
    drop(event_bus);
    let _ = tokio::time::timeout(Duration::from_secs(5), logger_handle).await;

    tracing::info!("Graceful shutdown complete");
}

/// Wait for SIGINT or SIGTERM to initiate graceful shutdown.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
