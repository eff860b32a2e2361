//! Server startup: shared state initialization, background poller, shutdown.

use std::sync::Arc;

use tracing::{info, warn};

use waitwatch_core::Config;
use waitwatch_ingest::{QueueTimesClient, TelemetrySource};

use crate::state::AppState;
use crate::{poller, router};

/// Build `AppState` with any persisted history restored, plus the live
/// telemetry source.
pub fn build(config: Config) -> anyhow::Result<(Arc<AppState>, Arc<dyn TelemetrySource>)> {
    let source: Arc<dyn TelemetrySource> = Arc::new(QueueTimesClient::from_config(&config.poller)?);
    let state = AppState::new(config);
    state.restore_snapshot();
    Ok((Arc::new(state), source))
}

/// Run the HTTP server and poller until Ctrl+C / SIGTERM.
pub async fn serve(config: Config) -> anyhow::Result<()> {
    config.log_summary();
    let (state, source) = build(config)?;

    let poller_task = tokio::spawn(poller::run_poller(source, state.clone()));

    let addr = format!("{}:{}", state.config.server.host, state.config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(%addr, "listening");

    let app = router::build_router(state.clone());
    let signal_state = state.clone();
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            shutdown_signal().await;
            signal_state.request_shutdown();
        })
        .await?;

    // Open event streams end on the same signal, so serve returns promptly.
    state.request_shutdown();
    if let Err(e) = poller_task.await {
        warn!(error = %e, "poller task ended abnormally");
    }
    state.save_snapshot().await;
    info!("shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("received Ctrl+C, shutting down"),
        _ = terminate => info!("received terminate signal, shutting down"),
    }
}
