//! # LearnHub API
//!
//! The API crate provides the web server implementation for the LearnHub
//! e-learning service. It defines RESTful endpoints for events, live
//! sessions and the notification inbox, and owns the wiring of the
//! background lifecycle engine.
//!
//! ## Architecture
//!
//! This crate follows a layered architecture:
//!
//! - **Routes**: Define API endpoints and URL structure
//! - **Handlers**: Implement request processing logic
//! - **Middleware**: Provide cross-cutting concerns like identity resolution and error handling
//! - **Config**: Handle environment and application configuration
//!
//! The API uses Axum as the web framework and SQLx for database
//! interactions; the periodic status, reminder and cleanup work runs on
//! tokio tasks spawned at startup.

/// Configuration module for API settings
pub mod config;
/// Request handlers that implement business logic
pub mod handlers;
/// Middleware for identity, logging, and error handling
pub mod middleware;
/// Route definitions and API endpoint structure
pub mod routes;

use std::sync::Arc;

use axum::Router;
use eyre::Result;
use learnhub_db::stores::PgStore;
use learnhub_engine::{
    checkin::{CheckInCooldowns, CheckInGuard},
    fanout::NotificationFanout,
    ports::{EventStore, NotificationStore, ReminderLedger, SessionStore, UserDirectory},
    push::BroadcastPush,
    reconcile::LifecycleReconciler,
    reminder::ReminderDeduper,
    rooms::{JitsiRooms, RoomProvider},
    scheduler::{Scheduler, SchedulerConfig},
};
use sqlx::PgPool;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::FmtSubscriber;

/// Number of in-flight push messages buffered per broadcast channel.
const PUSH_CHANNEL_CAPACITY: usize = 1024;

/// Shared application state that is accessible to all request handlers
pub struct ApiState {
    /// PostgreSQL connection pool for database operations
    pub db_pool: PgPool,
    /// Notification persistence and delivery pipeline
    pub fanout: Arc<NotificationFanout>,
    /// Check-in validation for the scan endpoint
    pub guard: Arc<CheckInGuard>,
    /// Meeting room provisioning for online events and sessions
    pub rooms: Arc<dyn RoomProvider>,
    /// Push topic; websocket frontends subscribe here
    pub push: Arc<BroadcastPush>,
}

/// Starts the API server with the provided configuration and database
/// connection.
///
/// This function initializes logging, wires the lifecycle engine onto the
/// Postgres-backed stores, spawns the background ticks, and serves the
/// HTTP routes until the process exits.
pub async fn start_server(config: config::ApiConfig, db_pool: PgPool) -> Result<()> {
    // Initialize tracing for logging
    let subscriber = FmtSubscriber::builder()
        .with_max_level(config.log_level)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    // One store handle backs every port the engine consumes.
    let store = Arc::new(PgStore::new(db_pool.clone()));
    let users: Arc<dyn UserDirectory> = store.clone();
    let events: Arc<dyn EventStore> = store.clone();
    let sessions: Arc<dyn SessionStore> = store.clone();
    let ledger: Arc<dyn ReminderLedger> = store.clone();
    let notifications: Arc<dyn NotificationStore> = store;

    let push = Arc::new(BroadcastPush::new(PUSH_CHANNEL_CAPACITY));
    let fanout = Arc::new(NotificationFanout::new(
        Arc::clone(&users),
        notifications,
        push.clone(),
        config.notification_expiry_days,
    ));
    let cooldowns = Arc::new(CheckInCooldowns::new());
    let guard = Arc::new(CheckInGuard::new(
        Arc::clone(&events),
        Arc::clone(&users),
        Arc::clone(&cooldowns),
    ));

    let reconciler = Arc::new(LifecycleReconciler::new(
        Arc::clone(&events),
        sessions,
        Arc::clone(&users),
        Arc::clone(&fanout),
    ));
    let reminders = Arc::new(ReminderDeduper::new(
        events,
        ledger,
        Arc::clone(&fanout),
        config.reminder_hours.clone(),
    ));

    // Background ticks: status reconciliation, reminder sweeps, cooldown
    // sweeps and notification cleanup.
    let handles = Scheduler::new(
        SchedulerConfig::default(),
        reconciler,
        reminders,
        Arc::clone(&fanout),
        cooldowns,
    )
    .spawn();
    info!(tasks = handles.len(), "background scheduler started");

    // Create shared state with dependencies
    let state = Arc::new(ApiState {
        db_pool,
        fanout,
        guard,
        rooms: Arc::new(JitsiRooms::new()),
        push,
    });

    // Build the application router with all routes
    let app = Router::new()
        // Health check endpoints
        .merge(routes::health::routes())
        // Event lifecycle endpoints
        .merge(routes::events::routes())
        // Live session endpoints
        .merge(routes::sessions::routes())
        // Notification inbox endpoints
        .merge(routes::notifications::routes())
        // Attach shared state to all routes
        .with_state(state);

    // Apply CORS configuration if origins are specified
    let app = if let Some(origins) = &config.cors_origins {
        let cors = tower_http::cors::CorsLayer::new()
            .allow_methods([
                axum::http::Method::GET,
                axum::http::Method::POST,
                axum::http::Method::PUT,
                axum::http::Method::DELETE,
                axum::http::Method::OPTIONS,
            ])
            .allow_headers([
                axum::http::header::CONTENT_TYPE,
                axum::http::header::AUTHORIZATION,
                axum::http::header::ACCEPT,
            ])
            .allow_origin(
                origins
                    .iter()
                    .filter_map(|origin| origin.parse().ok())
                    .collect::<Vec<_>>(),
            )
            .allow_credentials(true);

        app.layer(cors)
    } else {
        app
    };

    // Add request timeout and trace middleware
    let app = app
        .layer(tower_http::timeout::TimeoutLayer::new(
            std::time::Duration::from_secs(config.request_timeout),
        ))
        .layer(tower_http::trace::TraceLayer::new_for_http());

    // Start the HTTP server
    let addr = config.server_addr();
    let listener = TcpListener::bind(&addr).await?;
    info!("Server listening on http://{}", addr);
    axum::serve(listener, app).await?;

    Ok(())
}
