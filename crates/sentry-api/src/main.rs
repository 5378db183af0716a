//! Axum API server binary: the process entry point. Builds the
//! composition root (`AppState`), merges the C7 stream router with the
//! camera admin surface, and serves until SIGINT/SIGTERM, mirroring
//! `vclip_api::main`.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use sentry_api::{create_router, metrics, ApiConfig, AppState};
use sentry_orchestrator::CameraOrchestrator;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    rustls::crypto::ring::default_provider()
        .install_default()
        .expect("Failed to install rustls crypto provider");

    let use_json = std::env::var("LOG_FORMAT").map(|v| v.to_lowercase() == "json").unwrap_or(false);

    let env_filter = EnvFilter::from_default_env().add_directive("sentry=info".parse().unwrap());

    if use_json {
        tracing_subscriber::registry().with(fmt::layer().json()).with(env_filter).init();
    } else {
        tracing_subscriber::registry()
            .with(fmt::layer().with_ansi(true).with_target(true).with_thread_ids(false).with_file(false).with_line_number(false))
            .with(env_filter)
            .init();
    }

    info!("Starting sentry-api");

    let config = ApiConfig::from_env();
    info!("API config: host={}, port={}", config.host, config.port);

    let state = match AppState::new(config.clone()).await {
        Ok(s) => s,
        Err(e) => {
            error!("Failed to create application state: {}", e);
            std::process::exit(1);
        }
    };

    let metrics_handle = if config.metrics_enabled {
        info!("Prometheus metrics enabled at /metrics");
        Some(metrics::init_metrics())
    } else {
        None
    };

    let orchestrator = state.orchestrator.clone();
    let app = create_router(state, metrics_handle);

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse().expect("Invalid bind address");

    info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await.unwrap();
    axum::serve(listener, app).with_graceful_shutdown(shutdown_signal(orchestrator)).await.unwrap();

    info!("Server shutdown complete");
}

/// Per §5/§6: SIGINT or SIGTERM initiates graceful shutdown, then
/// deactivates every active camera (stopping C1 subprocesses and C5
/// pipeline workers) bounded at 30s, matching `vclip_api::main`'s signal
/// handler extended with this binary's camera teardown.
async fn shutdown_signal(orchestrator: Arc<CameraOrchestrator<sentry_events::InMemoryEventStore>>) {
    let ctrl_c = async {
        tokio::signal::ctrl_c().await.expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }

    info!("received shutdown signal, deactivating active cameras (bounded at 30s)");
    if tokio::time::timeout(Duration::from_secs(30), orchestrator.shutdown_all()).await.is_err() {
        warn!("camera shutdown did not complete within 30s, proceeding with process exit");
    }
}
