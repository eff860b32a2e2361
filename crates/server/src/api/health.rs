//! Service status and poller progress.

use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use serde::Serialize;

use crate::state::{AppState, PollerStatusView};

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub parks: usize,
    pub rides: usize,
    pub subscribers: usize,
    pub poller: PollerStatusView,
    pub config: serde_json::Value,
}

/// Liveness plus ingestion counters.
#[utoipa::path(
    get,
    path = "/health",
    tag = "Health",
    responses(
        (status = 200, description = "Service status, cycle counters and redacted config")
    )
)]
pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        parks: state.registry.park_count(),
        rides: state.registry.ride_count(),
        subscribers: state.hub.subscriber_count(),
        poller: state.poller.view(),
        config: state.config.redacted_summary(),
    })
}
