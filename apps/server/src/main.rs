//! MPI service - entry point.
//!
//! Starts the HTTP server that mediates patient creation and
//! identity-changing updates against the downstream clinical store.

use anyhow::Context;
use sijil_mpi::{api::create_router, config::Config, logging, state::AppState};

/// Exit code for unrecoverable startup/runtime errors; clean shutdown after
/// a termination signal exits 0.
const EXIT_CODE_FAILURE: i32 = 18;

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("sijil-mpi: {e:#}");
        std::process::exit(EXIT_CODE_FAILURE);
    }
}

async fn run() -> anyhow::Result<()> {
    // Load configuration first to get logging settings
    let config = Config::load().context("Failed to load configuration")?;

    config
        .validate()
        .map_err(|e| anyhow::anyhow!("Invalid configuration: {e}"))?;

    logging::init_logging(&config.logging).context("Failed to initialize logging")?;

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "Starting MPI service");

    let addr = config
        .socket_addr()
        .context("Failed to determine socket address")?;

    tracing::info!(
        clinical_store = %config.clinical.base_url,
        otp_service = %config.otp.base_url,
        listen_addr = %addr,
        "Configuration loaded"
    );

    let state = AppState::new(config);
    let app = create_router(state);

    tracing::info!("MPI service listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind TCP listener on {addr}"))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server terminated unexpectedly")?;

    tracing::info!("Server shutdown complete");

    Ok(())
}

/// Wait for a shutdown signal (SIGTERM, SIGINT, SIGHUP or SIGQUIT).
#[cfg(unix)]
async fn shutdown_signal() {
    use tokio::signal::unix::{signal, SignalKind};

    let mut sigterm =
        signal(SignalKind::terminate()).expect("Failed to install SIGTERM signal handler");
    let mut sighup = signal(SignalKind::hangup()).expect("Failed to install SIGHUP signal handler");
    let mut sigquit = signal(SignalKind::quit()).expect("Failed to install SIGQUIT signal handler");
    let sigint = tokio::signal::ctrl_c();

    tokio::select! {
        _ = sigint => {
            tracing::info!("SIGINT received, starting graceful shutdown...");
        }
        _ = sigterm.recv() => {
            tracing::info!("SIGTERM received, starting graceful shutdown...");
        }
        _ = sighup.recv() => {
            tracing::info!("SIGHUP received, starting graceful shutdown...");
        }
        _ = sigquit.recv() => {
            tracing::info!("SIGQUIT received, starting graceful shutdown...");
        }
    }
}

/// Wait for shutdown signal (SIGINT only on non-Unix platforms)
#[cfg(not(unix))]
async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("Failed to install CTRL+C signal handler");
    tracing::info!("Shutdown signal received, starting graceful shutdown...");
}
