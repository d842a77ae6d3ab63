//! RoadHub Dispatch Server
//!
//! Main entry point that wires all crates together and starts the engine:
//! job store, dispatch services, acceptance timers, supervisors, real-time
//! hub, and the HTTP/WS surface.

use std::sync::Arc;
use std::time::Duration;

use tracing;
use tracing_subscriber::{fmt, EnvFilter};

use roadhub_core::config::AppConfig;
use roadhub_core::error::AppError;
use roadhub_dispatch::assignment::{
    AssignmentSelector, AssignmentService, DisabledScoring, ScoringClient,
};
use roadhub_dispatch::availability::AvailabilityService;
use roadhub_dispatch::queue::QueueManager;
use roadhub_dispatch::timer::AcceptanceTimerRegistry;
use roadhub_dispatch::DispatchEngine;
use roadhub_entity::traits::channel::RealtimeChannel;
use roadhub_entity::traits::directory::ContractorDirectory;
use roadhub_entity::traits::notifier::NotificationSender;
use roadhub_entity::traits::scoring::ScoringStrategy;
use roadhub_entity::traits::store::{JobStore, QueueStore};
use roadhub_notify::SmtpNotificationSender;
use roadhub_realtime::RealtimeHub;
use roadhub_supervisor::sweeps::{ReminderSweep, StaleQueueSweep, UnassignedJobMonitor};
use roadhub_supervisor::SupervisorScheduler;

mod routes;
mod state;
mod ws;

use state::AppState;

#[tokio::main]
async fn main() {
    let config = match load_configuration() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    init_logging(&config);

    if let Err(e) = run(config).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}

/// Load configuration from file and environment
fn load_configuration() -> Result<AppConfig, AppError> {
    let env = std::env::var("ROADHUB_ENV").unwrap_or_else(|_| "development".to_string());
    AppConfig::load(&env)
}

/// Initialize tracing/logging
fn init_logging(config: &AppConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    match config.logging.format.as_str() {
        "json" => {
            fmt()
                .json()
                .with_env_filter(filter)
                .with_target(true)
                .init();
        }
        _ => {
            fmt().pretty().with_env_filter(filter).with_target(true).init();
        }
    }
}

/// Main server run function
async fn run(config: AppConfig) -> Result<(), AppError> {
    tracing::info!("Starting RoadHub v{}", env!("CARGO_PKG_VERSION"));

    // ── Step 1: Database connection + migrations ─────────────────
    tracing::info!("Connecting to database...");
    let db = roadhub_database::DatabasePool::connect(&config.database).await?;
    roadhub_database::migration::run_migrations(db.pool()).await?;

    // ── Step 2: Repositories ─────────────────────────────────────
    let jobs: Arc<dyn JobStore> = Arc::new(
        roadhub_database::repositories::JobRepository::new(db.pool().clone()),
    );
    let queue_store: Arc<dyn QueueStore> = Arc::new(
        roadhub_database::repositories::QueueRepository::new(db.pool().clone()),
    );
    let directory: Arc<dyn ContractorDirectory> = Arc::new(
        roadhub_database::repositories::ContractorRepository::new(db.pool().clone()),
    );

    // ── Step 3: Real-time hub ────────────────────────────────────
    let hub = Arc::new(RealtimeHub::new(
        config.realtime.clone(),
        Arc::clone(&jobs),
        Arc::clone(&queue_store),
    ));
    let channel: Arc<dyn RealtimeChannel> = hub.clone();

    // ── Step 4: Notification sender ──────────────────────────────
    let notifier: Arc<dyn NotificationSender> =
        Arc::new(SmtpNotificationSender::new(config.notifier.clone()));

    // ── Step 5: Dispatch engine ──────────────────────────────────
    let scoring: Arc<dyn ScoringStrategy> = match ScoringClient::from_config(&config.dispatch) {
        Some(client) => {
            tracing::info!("AI dispatch scoring enabled");
            Arc::new(client)
        }
        None => {
            tracing::info!("No scoring service configured, proximity fallback only");
            Arc::new(DisabledScoring)
        }
    };

    let availability = AvailabilityService::new(Arc::clone(&directory), Arc::clone(&jobs));
    let selector = AssignmentSelector::new(
        scoring,
        Arc::clone(&directory),
        availability.clone(),
        config.dispatch.clone(),
    );
    let queue_manager = QueueManager::new(
        Arc::clone(&queue_store),
        Arc::clone(&jobs),
        Arc::clone(&notifier),
        Arc::clone(&channel),
    );
    let assignment = Arc::new(AssignmentService::new(
        Arc::clone(&jobs),
        Arc::clone(&queue_store),
        Arc::clone(&directory),
        Arc::clone(&notifier),
        Arc::clone(&channel),
        selector,
        availability,
        queue_manager,
        config.dispatch.clone(),
    ));
    let timers = AcceptanceTimerRegistry::new(Duration::from_secs(
        config.dispatch.acceptance_window_seconds,
    ));
    let engine = Arc::new(DispatchEngine::new(
        Arc::clone(&jobs),
        Arc::clone(&queue_store),
        Arc::clone(&channel),
        assignment,
        timers,
    ));
    tracing::info!("Dispatch engine initialized");

    // ── Step 6: Supervisors ──────────────────────────────────────
    let scheduler = if config.supervisor.enabled {
        let unassigned = Arc::new(UnassignedJobMonitor::new(
            Arc::clone(&jobs),
            Arc::clone(&engine),
            Arc::clone(&notifier),
            config.supervisor.clone(),
        ));
        let reminder = Arc::new(ReminderSweep::new(
            Arc::clone(&jobs),
            Arc::clone(&directory),
            Arc::clone(&notifier),
            config.supervisor.clone(),
        ));
        let stale_queue = Arc::new(StaleQueueSweep::new(
            Arc::clone(&queue_store),
            Arc::clone(&engine),
            config.supervisor.clone(),
        ));

        let scheduler = SupervisorScheduler::new(unassigned, reminder, stale_queue).await?;
        scheduler.register_default_sweeps().await?;
        scheduler.start().await?;
        Some(scheduler)
    } else {
        tracing::info!("Supervisors disabled");
        None
    };

    // ── Step 7: WebSocket keepalive ──────────────────────────────
    let keepalive = {
        let hub = Arc::clone(&hub);
        let interval = Duration::from_secs(config.realtime.ping_interval_seconds);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            loop {
                ticker.tick().await;
                hub.ping_all(chrono::Utc::now().timestamp_millis());
            }
        })
    };

    // ── Step 8: HTTP/WS surface ──────────────────────────────────
    let app_state = AppState {
        engine: Arc::clone(&engine),
        hub: Arc::clone(&hub),
    };
    let app = routes::build_router(app_state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| AppError::internal(format!("Failed to bind {}: {}", addr, e)))?;
    tracing::info!("RoadHub dispatch server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| AppError::internal(format!("Server error: {}", e)))?;

    // ── Step 9: Graceful shutdown ────────────────────────────────
    tracing::info!("Shutting down...");
    keepalive.abort();
    if let Some(scheduler) = scheduler {
        scheduler.shutdown().await?;
    }
    engine.shutdown();
    hub.shutdown().await;
    db.close().await;

    tracing::info!("RoadHub dispatch server shut down gracefully");
    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
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
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
