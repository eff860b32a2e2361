//! Periodic ingestion from the telemetry source.
//!
//! One cycle lists the tracked parks, fetches every park's readings
//! concurrently and applies each successful fetch to the registry. A park
//! whose fetch fails is skipped for that cycle and keeps its previous state.
//! All fetches finish before anything is applied, so abandoning a cycle
//! never leaves a park half updated.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use futures::future::join_all;
use serde::Serialize;
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use waitwatch_compute::Registry;
use waitwatch_ingest::TelemetrySource;

use crate::state::AppState;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CycleReport {
    pub parks_seen: usize,
    pub parks_updated: usize,
    pub parks_failed: usize,
    pub readings_applied: usize,
    pub readings_skipped: usize,
    pub events: usize,
}

/// Result of one ingestion cycle. Failures are values, never panics or
/// propagated errors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CycleOutcome {
    Completed(CycleReport),
    Failed { reason: String },
}

impl CycleOutcome {
    fn failed(reason: impl Into<String>) -> Self {
        Self::Failed {
            reason: reason.into(),
        }
    }
}

/// Run one cycle, stamping every applied reading with `timestamp`.
pub async fn run_cycle(
    source: &dyn TelemetrySource,
    registry: &Registry,
    timestamp: DateTime<Utc>,
) -> CycleOutcome {
    let parks = match source.list_parks().await {
        Ok(parks) => parks,
        Err(e) => return CycleOutcome::failed(format!("listing parks: {e}")),
    };

    let fetches = parks.iter().map(|park| async move {
        let result = source.list_readings(&park.id).await;
        (park, result)
    });
    let results = join_all(fetches).await;

    let mut report = CycleReport {
        parks_seen: parks.len(),
        ..CycleReport::default()
    };
    for (park, result) in results {
        match result {
            Ok(readings) => {
                let ingested = registry.ingest_at(&park.id, &park.name, &readings, timestamp);
                debug!(
                    park_id = %park.id,
                    applied = ingested.applied,
                    skipped = ingested.skipped,
                    events = ingested.events,
                    "park ingested"
                );
                report.parks_updated += 1;
                report.readings_applied += ingested.applied;
                report.readings_skipped += ingested.skipped;
                report.events += ingested.events;
            }
            Err(e) => {
                warn!(park_id = %park.id, park = %park.name, error = %e, "fetch failed; park skipped this cycle");
                report.parks_failed += 1;
            }
        }
    }
    CycleOutcome::Completed(report)
}

/// [`run_cycle`] at the current time, bounded by `limit` when set.
pub async fn poll_once(
    source: &dyn TelemetrySource,
    registry: &Registry,
    limit: Option<Duration>,
) -> CycleOutcome {
    let cycle = run_cycle(source, registry, Utc::now());
    match limit {
        Some(limit) => tokio::time::timeout(limit, cycle)
            .await
            .unwrap_or_else(|_| CycleOutcome::failed(format!("timed out after {}s", limit.as_secs()))),
        None => cycle.await,
    }
}

/// Resolves once shutdown is requested or the sender is gone.
async fn shutdown_requested(shutdown: &mut watch::Receiver<bool>) {
    let _ = shutdown.wait_for(|stop| *stop).await;
}

/// Poll on a fixed interval until shutdown.
///
/// The first cycle starts immediately. A cycle that overruns the interval
/// delays the next one rather than bunching ticks. Shutdown is honoured
/// between cycles and while a cycle is waiting on the network; the
/// in-flight cycle is then dropped and nothing from it is applied.
pub async fn run_poller(source: Arc<dyn TelemetrySource>, state: Arc<AppState>) {
    let mut shutdown = state.shutdown_signal();
    let poller = &state.config.poller;
    let mut interval = tokio::time::interval(poller.interval());
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    info!(
        interval_secs = poller.interval_secs,
        timeout_secs = ?poller.cycle_timeout_secs,
        "poller started"
    );

    loop {
        tokio::select! {
            _ = interval.tick() => {}
            _ = shutdown_requested(&mut shutdown) => break,
        }

        let outcome = tokio::select! {
            outcome = poll_once(source.as_ref(), &state.registry, poller.cycle_timeout()) => outcome,
            _ = shutdown_requested(&mut shutdown) => {
                info!("shutdown requested; abandoning in-flight cycle");
                break;
            }
        };

        state.poller.record(&outcome);
        match &outcome {
            CycleOutcome::Completed(report) => {
                info!(
                    parks = report.parks_seen,
                    updated = report.parks_updated,
                    failed = report.parks_failed,
                    applied = report.readings_applied,
                    skipped = report.readings_skipped,
                    events = report.events,
                    "ingestion cycle completed"
                );
                state.save_snapshot().await;
            }
            CycleOutcome::Failed { reason } => {
                warn!(reason = %reason, "ingestion cycle failed");
            }
        }
    }

    info!("poller stopped");
}
