//! Park -> ride -> state mapping, batch ingestion and snapshots.

use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use tracing::debug;

use waitwatch_core::{EventSink, ParkListing, RideReading};

use crate::filter::SnapshotFilter;
use crate::ride::{RideState, RideSummary};

/// A park and its rides, keyed by ride id in first-seen order.
#[derive(Debug, Clone)]
pub struct Park {
    pub id: String,
    pub name: String,
    pub(crate) rides: IndexMap<String, RideState>,
}

impl Park {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            rides: IndexMap::new(),
        }
    }

    pub fn ride(&self, ride_id: &str) -> Option<&RideState> {
        self.rides.get(ride_id)
    }

    pub fn rides(&self) -> impl Iterator<Item = &RideState> + '_ {
        self.rides.values()
    }

    pub fn len(&self) -> usize {
        self.rides.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rides.is_empty()
    }
}

/// Thread-safe handle to one park. All mutation of a park's rides goes
/// through its write lock, so two batches for the same park never interleave.
pub type SharedPark = Arc<RwLock<Park>>;

/// Outcome of one [`Registry::ingest`] call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestReport {
    /// Readings applied to a ride.
    pub applied: usize,
    /// Readings dropped because they carried no id.
    pub skipped: usize,
    /// Events forwarded to the sink.
    pub events: usize,
}

pub(crate) fn read_lock<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(PoisonError::into_inner)
}

pub(crate) fn write_lock<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(PoisonError::into_inner)
}

/// Owns every park seen so far.
///
/// The registry-level lock is held only to look up or create a park entry;
/// ingestion and snapshots then work under that park's own lock, so
/// unrelated parks never wait on each other.
pub struct Registry {
    pub(crate) parks: RwLock<IndexMap<String, SharedPark>>,
    sink: Arc<dyn EventSink>,
}

impl Registry {
    /// Create an empty registry that forwards events to `sink`.
    pub fn new(sink: Arc<dyn EventSink>) -> Self {
        Self {
            parks: RwLock::new(IndexMap::new()),
            sink,
        }
    }

    /// Ingest a batch stamped with the current time.
    pub fn ingest(&self, park_id: &str, park_name: &str, readings: &[RideReading]) -> IngestReport {
        self.ingest_at(park_id, park_name, readings, Utc::now())
    }

    /// Apply one batch of readings to a park.
    ///
    /// Rides are created on first sighting. A reading without an id is
    /// skipped without touching any other ride. Events are forwarded to
    /// the sink in emission order once the whole batch is applied.
    pub fn ingest_at(
        &self,
        park_id: &str,
        park_name: &str,
        readings: &[RideReading],
        timestamp: DateTime<Utc>,
    ) -> IngestReport {
        let park = self.park_entry(park_id, park_name);
        let mut report = IngestReport::default();
        let mut events = Vec::new();

        {
            let mut park = write_lock(&park);
            for reading in readings {
                let Some(ride_id) = reading.id.as_deref().filter(|id| !id.is_empty()) else {
                    debug!(park_id, name = ?reading.name, "skipping reading without id");
                    report.skipped += 1;
                    continue;
                };

                let ride = park.rides.entry(ride_id.to_string()).or_insert_with(|| {
                    let name = reading.name.clone().unwrap_or_else(|| ride_id.to_string());
                    RideState::new(ride_id, name)
                });
                events.extend(ride.update(reading.reported_open(), reading.wait_time, timestamp));
                report.applied += 1;
            }
        }

        report.events = events.len();
        if !events.is_empty() {
            self.sink.publish(events);
        }
        report
    }

    /// Look up a park, creating it on first sighting.
    fn park_entry(&self, park_id: &str, park_name: &str) -> SharedPark {
        if let Some(park) = read_lock(&self.parks).get(park_id) {
            return Arc::clone(park);
        }
        let mut parks = write_lock(&self.parks);
        Arc::clone(
            parks
                .entry(park_id.to_string())
                .or_insert_with(|| Arc::new(RwLock::new(Park::new(park_id, park_name)))),
        )
    }

    /// Handle to one park, if it has been seen.
    pub fn park(&self, park_id: &str) -> Option<SharedPark> {
        read_lock(&self.parks).get(park_id).cloned()
    }

    /// All parks as `(id, name)` in first-seen order.
    pub fn parks(&self) -> Vec<ParkListing> {
        self.park_handles(None)
            .iter()
            .map(|park| {
                let park = read_lock(park);
                ParkListing {
                    id: park.id.clone(),
                    name: park.name.clone(),
                }
            })
            .collect()
    }

    pub fn park_count(&self) -> usize {
        read_lock(&self.parks).len()
    }

    pub fn ride_count(&self) -> usize {
        self.park_handles(None).iter().map(|p| read_lock(p).len()).sum()
    }

    fn park_handles(&self, park_id: Option<&str>) -> Vec<SharedPark> {
        let parks = read_lock(&self.parks);
        match park_id {
            Some(id) => parks.get(id).cloned().into_iter().collect(),
            None => parks.values().cloned().collect(),
        }
    }

    /// Summaries of every ride, optionally limited to one park, keeping the
    /// rows that match `filter`.
    ///
    /// Each park is read under its own lock, so no row mixes two updates.
    /// An unknown park yields an empty list.
    pub fn snapshot(&self, park_id: Option<&str>, filter: &SnapshotFilter) -> Vec<RideSummary> {
        let mut rows = Vec::new();
        for park in self.park_handles(park_id) {
            let park = read_lock(&park);
            rows.extend(
                park.rides
                    .values()
                    .map(RideState::summary)
                    .filter(|row| filter.matches(row)),
            );
        }
        rows
    }
}
