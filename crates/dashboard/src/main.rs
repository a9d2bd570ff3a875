//! StorePulse Dashboard server.
//!
//! Serves the server-rendered analytics front end (port 3002 by default).
//! Every page is built from calls to the analytics backend configured by
//! `DASHBOARD_BACKEND_URL`; nothing is persisted here. Backend credentials
//! live in the in-memory session store and die with the process.

#![cfg_attr(not(test), forbid(unsafe_code))]

use sentry::integrations::tracing::{self as sentry_tracing, EventFilter};
use storepulse_dashboard::config::DashboardConfig;
use storepulse_dashboard::state::AppState;
use tokio_util::sync::CancellationToken;
use tracing::{Level, Metadata};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

const DEFAULT_LOG_FILTER: &str = "storepulse_dashboard=info,tower_http=debug";

/// Start Sentry when a DSN is configured. The guard flushes events on drop.
fn init_sentry(config: &DashboardConfig) -> Option<sentry::ClientInitGuard> {
    let dsn = config.sentry_dsn.as_deref()?;
    let options = sentry::ClientOptions {
        release: sentry::release_name!(),
        environment: config.sentry_environment.clone().map(Into::into),
        sample_rate: config.sentry_sample_rate,
        traces_sample_rate: config.sentry_traces_sample_rate,
        attach_stacktrace: true,
        ..Default::default()
    };
    Some(sentry::init((dsn, options)))
}

/// Warnings and errors become Sentry events; info and debug are breadcrumbs.
fn sentry_event_filter(metadata: &Metadata<'_>) -> EventFilter {
    match *metadata.level() {
        Level::ERROR | Level::WARN => EventFilter::Event,
        Level::INFO | Level::DEBUG => EventFilter::Breadcrumb,
        _ => EventFilter::Ignore,
    }
}

/// JSON lines on Fly.io, human-readable text everywhere else.
fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    let on_fly = std::env::var_os("FLY_APP_NAME").is_some();

    tracing_subscriber::registry()
        .with(filter)
        .with(on_fly.then(|| fmt::layer().json().flatten_event(true)))
        .with((!on_fly).then(fmt::layer))
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();
}

#[tokio::main]
async fn main() {
    let config = DashboardConfig::from_env().expect("Failed to load configuration");

    // Sentry before tracing so the tracing layer has a client to report to.
    let _sentry = init_sentry(&config);
    init_tracing();
    if config.sentry_dsn.is_some() {
        tracing::info!("Sentry initialized");
    }

    let state = AppState::new(config.clone()).expect("Failed to initialize application state");
    tracing::info!(backend = %config.backend_url, "Analytics backend configured");
    if let Err(e) = state.api().health().await {
        tracing::warn!(error = %e, "Analytics backend is not reachable yet");
    }

    let addr = config.socket_addr();
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");
    tracing::info!(%addr, "dashboard listening");

    let shutdown = state.shutdown_token().clone();
    axum::serve(listener, storepulse_dashboard::app(state))
        .with_graceful_shutdown(shutdown_signal(shutdown))
        .await
        .expect("Server error");
}

/// Resolve on Ctrl+C or SIGTERM, cancelling in-flight backend calls.
async fn shutdown_signal(token: CancellationToken) {
    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        result = tokio::signal::ctrl_c() => {
            if let Err(e) = result {
                tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            }
        }
        () = terminate => {}
    }

    tracing::info!("Shutdown signal received, cancelling backend calls");
    token.cancel();
}
