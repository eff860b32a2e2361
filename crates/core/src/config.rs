use std::env;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::WaitError;

/// Load .env file (silently ignores if missing).
pub fn load_dotenv() {
    dotenvy::dotenv().ok();
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_opt(key: &str) -> Option<String> {
    env::var(key).ok().filter(|s| !s.is_empty())
}

/// Read a profiled env var: tries {PROFILE}_{KEY} first, falls back to {KEY}.
fn profiled_env_opt(profile: &str, key: &str) -> Option<String> {
    if !profile.is_empty() {
        let prefixed = format!("{}_{}", profile, key);
        if let Some(v) = env_opt(&prefixed) {
            return Some(v);
        }
    }
    env_opt(key)
}

fn profiled_env_or(profile: &str, key: &str, default: &str) -> String {
    profiled_env_opt(profile, key).unwrap_or_else(|| default.to_string())
}

fn profiled_env_u16(profile: &str, key: &str, default: u16) -> u16 {
    profiled_env_opt(profile, key)
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn profiled_env_u64(profile: &str, key: &str, default: u64) -> u64 {
    profiled_env_opt(profile, key)
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn profiled_env_bool(profile: &str, key: &str, default: bool) -> bool {
    match profiled_env_opt(profile, key).as_deref() {
        Some("true") | Some("1") | Some("yes") => true,
        Some("false") | Some("0") | Some("no") => false,
        _ => default,
    }
}

// ── Top-level config ──────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Active profile name (empty = default).
    pub profile: String,
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub poller: PollerConfig,
}

impl Config {
    /// Build config from environment variables (call `load_dotenv()` first).
    /// Profile is read from `WAITWATCH_PROFILE`. When set (e.g. `PROD`),
    /// every key is first looked up as `{PROFILE}_{KEY}`, falling back to `{KEY}`.
    pub fn from_env() -> Self {
        let profile = env_or("WAITWATCH_PROFILE", "").to_uppercase();
        Self::for_profile(&profile)
    }

    /// Build config for a specific named profile (empty string = default).
    pub fn for_profile(profile: &str) -> Self {
        let p = profile.to_uppercase();
        let p = p.as_str();
        Self {
            profile: p.to_string(),
            server: ServerConfig::from_env_profiled(p),
            storage: StorageConfig::from_env_profiled(p),
            poller: PollerConfig::from_env_profiled(p),
        }
    }

    pub fn profile_label(&self) -> &str {
        if self.profile.is_empty() { "default" } else { &self.profile }
    }

    /// Reject settings the poller cannot run with.
    pub fn validate(&self) -> Result<(), WaitError> {
        if self.poller.interval_secs == 0 {
            return Err(WaitError::InvalidConfig(
                "POLL_INTERVAL_SECS must be greater than zero".to_string(),
            ));
        }
        if self.poller.cycle_timeout_secs == Some(0) {
            return Err(WaitError::InvalidConfig(
                "POLL_CYCLE_TIMEOUT_SECS must be greater than zero when set".to_string(),
            ));
        }
        if self.poller.group_name.trim().is_empty() {
            return Err(WaitError::InvalidConfig("PARK_GROUP_NAME is empty".to_string()));
        }
        Ok(())
    }

    /// Print a summary for startup logs.
    pub fn log_summary(&self) {
        tracing::info!("Config loaded (profile: {}):", self.profile_label());
        tracing::info!("  server:   {}:{}", self.server.host, self.server.port);
        tracing::info!(
            "  storage:  dir={}, snapshot={}, persist={}",
            self.storage.data_dir.display(),
            self.storage.snapshot_file.display(),
            self.storage.persist
        );
        tracing::info!(
            "  poller:   url={}, group={:?}, interval={}s, timeout={}",
            self.poller.base_url,
            self.poller.group_name,
            self.poller.interval_secs,
            self.poller
                .cycle_timeout_secs
                .map(|s| format!("{s}s"))
                .unwrap_or_else(|| "none".to_string())
        );
    }

    /// Return a view safe for API responses.
    pub fn redacted_summary(&self) -> serde_json::Value {
        serde_json::json!({
            "profile": self.profile_label(),
            "server": { "host": self.server.host, "port": self.server.port },
            "storage": {
                "data_dir": self.storage.data_dir,
                "snapshot_file": self.storage.snapshot_file,
                "persist": self.storage.persist,
            },
            "poller": {
                "base_url": self.poller.base_url,
                "group_name": self.poller.group_name,
                "interval_secs": self.poller.interval_secs,
                "cycle_timeout_secs": self.poller.cycle_timeout_secs,
            },
        })
    }
}

// ── Server ────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub cors_origin: String,
}

impl ServerConfig {
    fn from_env_profiled(p: &str) -> Self {
        Self {
            host: profiled_env_or(p, "HOST", "0.0.0.0"),
            port: profiled_env_u16(p, "PORT", 8000),
            cors_origin: profiled_env_or(p, "CORS_ORIGIN", "*"),
        }
    }
}

// ── Storage ───────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    pub data_dir: PathBuf,
    /// JSON file holding the persisted registry.
    pub snapshot_file: PathBuf,
    /// Load the snapshot at startup and save it after every cycle.
    pub persist: bool,
}

impl StorageConfig {
    fn from_env_profiled(p: &str) -> Self {
        let data_dir = PathBuf::from(profiled_env_or(p, "DATA_DIR", "data"));
        let snapshot_file = profiled_env_opt(p, "SNAPSHOT_FILE")
            .map(PathBuf::from)
            .unwrap_or_else(|| data_dir.join("waits.json"));
        Self {
            data_dir,
            snapshot_file,
            persist: profiled_env_bool(p, "PERSIST", true),
        }
    }
}

// ── Poller (queue-times telemetry source) ─────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollerConfig {
    pub base_url: String,
    /// Only parks listed under this group are tracked.
    pub group_name: String,
    pub user_agent: String,
    pub interval_secs: u64,
    /// No timeout when unset; a slow cycle just delays the next one.
    pub cycle_timeout_secs: Option<u64>,
}

impl PollerConfig {
    fn from_env_profiled(p: &str) -> Self {
        Self {
            base_url: profiled_env_or(p, "QUEUE_TIMES_URL", "https://queue-times.com"),
            group_name: profiled_env_or(p, "PARK_GROUP_NAME", "Walt Disney Attractions"),
            user_agent: profiled_env_or(p, "USER_AGENT", "DisneyWaits/1.0"),
            interval_secs: profiled_env_u64(p, "POLL_INTERVAL_SECS", 300),
            cycle_timeout_secs: profiled_env_opt(p, "POLL_CYCLE_TIMEOUT_SECS")
                .and_then(|v| v.parse().ok()),
        }
    }

    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    pub fn cycle_timeout(&self) -> Option<Duration> {
        self.cycle_timeout_secs.map(Duration::from_secs)
    }
}
