//! Shared application state.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::watch;
use tracing::{info, warn};

use waitwatch_compute::Registry;
use waitwatch_core::Config;
use waitwatch_notify::NotificationHub;
use waitwatch_storage::SnapshotStore;

use crate::poller::CycleOutcome;

/// Shared state passed to every handler and to the poller via `Arc<AppState>`.
pub struct AppState {
    pub registry: Registry,
    pub hub: NotificationHub,
    pub config: Config,
    pub poller: PollerStatus,
    /// `None` when persistence is disabled.
    pub store: Option<SnapshotStore>,
    shutdown: watch::Sender<bool>,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        let hub = NotificationHub::new();
        let registry = Registry::new(std::sync::Arc::new(hub.clone()));
        let store = config
            .storage
            .persist
            .then(|| SnapshotStore::new(&config.storage.snapshot_file));
        let (shutdown, _) = watch::channel(false);
        Self {
            registry,
            hub,
            config,
            poller: PollerStatus::default(),
            store,
            shutdown,
        }
    }

    /// Receiver that flips to `true` once shutdown is requested.
    pub fn shutdown_signal(&self) -> watch::Receiver<bool> {
        self.shutdown.subscribe()
    }

    pub fn request_shutdown(&self) {
        self.shutdown.send_replace(true);
    }

    /// Load the persisted registry, if any.
    ///
    /// A missing file starts empty. An unreadable or invalid snapshot is
    /// logged and also starts empty; it is overwritten by the next save.
    pub fn restore_snapshot(&self) {
        let Some(store) = &self.store else {
            return;
        };
        match store.load() {
            Ok(Some(parks)) => match self.registry.restore(parks) {
                Ok(rides) => info!(path = %store.path().display(), rides, "restored wait history"),
                Err(e) => warn!(path = %store.path().display(), error = %e, "snapshot rejected; starting empty"),
            },
            Ok(None) => info!(path = %store.path().display(), "no snapshot yet; starting empty"),
            Err(e) => warn!(path = %store.path().display(), error = %e, "failed to read snapshot; starting empty"),
        }
    }

    /// Write the registry to disk off the async runtime. Failures are logged.
    pub async fn save_snapshot(&self) {
        let Some(store) = self.store.clone() else {
            return;
        };
        let parks = self.registry.to_persisted();
        match tokio::task::spawn_blocking(move || store.save(&parks)).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => warn!(error = %e, "failed to save snapshot"),
            Err(e) => warn!(error = %e, "snapshot save task failed"),
        }
    }
}

// ── Poller status ─────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct LastCycle {
    pub finished_at: DateTime<Utc>,
    #[serde(flatten)]
    pub outcome: CycleOutcome,
}

/// Counters the poller updates after every cycle.
#[derive(Default)]
pub struct PollerStatus {
    completed: AtomicU64,
    failed: AtomicU64,
    last: Mutex<Option<LastCycle>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PollerStatusView {
    pub completed_cycles: u64,
    pub failed_cycles: u64,
    pub last_cycle: Option<LastCycle>,
}

impl PollerStatus {
    pub fn record(&self, outcome: &CycleOutcome) {
        let counter = match outcome {
            CycleOutcome::Completed(_) => &self.completed,
            CycleOutcome::Failed { .. } => &self.failed,
        };
        counter.fetch_add(1, Ordering::Relaxed);
        *self.last.lock().unwrap_or_else(PoisonError::into_inner) = Some(LastCycle {
            finished_at: Utc::now(),
            outcome: outcome.clone(),
        });
    }

    pub fn completed(&self) -> u64 {
        self.completed.load(Ordering::Relaxed)
    }

    pub fn failed(&self) -> u64 {
        self.failed.load(Ordering::Relaxed)
    }

    pub fn view(&self) -> PollerStatusView {
        PollerStatusView {
            completed_cycles: self.completed(),
            failed_cycles: self.failed(),
            last_cycle: self.last.lock().unwrap_or_else(PoisonError::into_inner).clone(),
        }
    }
}
