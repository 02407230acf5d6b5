//! restcrud API server.
//!
//! Serves the JSON API on `RESTCRUD_HOST:RESTCRUD_PORT` (default
//! 127.0.0.1:8000).
//!
//! # Storage
//!
//! With `RESTCRUD_DATABASE_URL` (or `DATABASE_URL`) set, data and sessions
//! live in `PostgreSQL`. Without it the server runs on an in-memory store
//! that is lost on exit, which is handy for local development.

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::sync::Arc;

use restcrud_api::{
    build_router,
    config::ApiConfig,
    db::{self, InMemoryStore, PgStore},
    state::AppState,
};
use sentry::integrations::tracing as sentry_tracing;
use tower_sessions::MemoryStore;
use tower_sessions_sqlx_store::PostgresStore;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize Sentry error tracking and return guard that must be kept alive.
fn init_sentry(config: &ApiConfig) -> Option<sentry::ClientInitGuard> {
    let dsn = config.sentry.dsn.as_ref()?;

    let guard = sentry::init((
        dsn.as_str(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
            environment: config
                .sentry
                .environment
                .clone()
                .map(std::borrow::Cow::Owned),
            sample_rate: config.sentry.sample_rate,
            traces_sample_rate: config.sentry.traces_sample_rate,
            attach_stacktrace: true,
            ..Default::default()
        },
    ));

    tracing::info!("Sentry initialized");
    Some(guard)
}

/// Filter tracing events to Sentry event types.
fn sentry_event_filter(metadata: &tracing::Metadata<'_>) -> sentry_tracing::EventFilter {
    match *metadata.level() {
        tracing::Level::ERROR | tracing::Level::WARN => sentry_tracing::EventFilter::Event,
        tracing::Level::INFO | tracing::Level::DEBUG => sentry_tracing::EventFilter::Breadcrumb,
        _ => sentry_tracing::EventFilter::Ignore,
    }
}

#[tokio::main]
async fn main() {
    // Load configuration from environment (needed for Sentry init)
    let config = ApiConfig::from_env().expect("Failed to load configuration");

    // Initialize Sentry (must be done before tracing subscriber)
    let _sentry_guard = init_sentry(&config);

    // Defaults to info level for our crate if RUST_LOG is not set
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "restcrud_api=info,tower_http=debug".into());

    let json_layer = config
        .log_json
        .then(|| tracing_subscriber::fmt::layer().json().flatten_event(true));
    let text_layer = (!config.log_json).then(tracing_subscriber::fmt::layer);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(json_layer)
        .with(text_layer)
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();

    let app = if let Some(database_url) = &config.database_url {
        let pool = db::create_pool(database_url, config.max_connections)
            .await
            .expect("Failed to create database pool");
        tracing::info!("Database pool created");

        // NOTE: Migrations are NOT run automatically on startup.
        // Run them explicitly via: cargo run -p restcrud-cli -- migrate

        let session_store = PostgresStore::new(pool.clone());

        let state = AppState::new(config.clone(), Arc::new(PgStore::new(pool)));
        build_router(state, session_store)
    } else {
        tracing::warn!("No database configured; using the in-memory store (data is not persisted)");
        let state = AppState::new(config.clone(), Arc::new(InMemoryStore::new()));
        build_router(state, MemoryStore::default())
    };

    // Start server
    let addr = config.socket_addr();
    tracing::info!("restcrud API listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("Shutdown signal received, starting graceful shutdown");
}
