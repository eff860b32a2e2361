//! On-disk snapshot of the registry.
//!
//! One JSON file holds every park with its ride histories. Writes go to a
//! sibling temp file that is then renamed over the target, so a crash
//! mid-save leaves the previous snapshot intact.

pub mod error;

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

pub use error::StorageError;
use waitwatch_compute::PersistedPark;

pub const SNAPSHOT_VERSION: u32 = 1;

#[derive(Serialize, Deserialize)]
struct SnapshotFile {
    version: u32,
    saved_at: DateTime<Utc>,
    parks: Vec<PersistedPark>,
}

#[derive(Serialize)]
struct SnapshotFileRef<'a> {
    version: u32,
    saved_at: DateTime<Utc>,
    parks: &'a [PersistedPark],
}

/// Loads and saves the registry snapshot at a fixed path.
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    path: PathBuf,
}

impl SnapshotStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "snapshot".into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    /// Read the snapshot. `Ok(None)` when no snapshot has been written yet.
    pub fn load(&self) -> Result<Option<Vec<PersistedPark>>, StorageError> {
        let data = match fs::read_to_string(&self.path) {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "no snapshot on disk");
                return Ok(None);
            }
            Err(e) => return Err(e.into()),
        };
        let file: SnapshotFile = serde_json::from_str(&data)?;
        if file.version != SNAPSHOT_VERSION {
            return Err(StorageError::Version {
                found: file.version,
                expected: SNAPSHOT_VERSION,
            });
        }
        info!(
            path = %self.path.display(),
            parks = file.parks.len(),
            saved_at = %file.saved_at,
            "snapshot loaded"
        );
        Ok(Some(file.parks))
    }

    /// Write `parks` atomically, creating the parent directory if needed.
    pub fn save(&self, parks: &[PersistedPark]) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_vec(&SnapshotFileRef {
            version: SNAPSHOT_VERSION,
            saved_at: Utc::now(),
            parks,
        })?;

        let tmp = self.temp_path();
        {
            let mut file = fs::File::create(&tmp)?;
            file.write_all(&data)?;
            file.sync_all()?;
        }
        fs::rename(&tmp, &self.path)?;
        debug!(path = %self.path.display(), parks = parks.len(), bytes = data.len(), "snapshot saved");
        Ok(())
    }
}
