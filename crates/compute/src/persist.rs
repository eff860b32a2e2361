//! Serializable form of the registry.
//!
//! Timestamps serialize as RFC 3339 with nanosecond precision, so a saved
//! history reloads to identical statistics.

use std::sync::{Arc, RwLock};

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::info;

use waitwatch_core::WaitError;

use crate::registry::{read_lock, write_lock, Park, Registry};
use crate::ride::RideState;
use crate::window::{Sample, WindowedStatistic};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistedPark {
    pub id: String,
    pub name: String,
    pub rides: Vec<PersistedRide>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistedRide {
    pub id: String,
    pub name: String,
    /// `(timestamp, value)` pairs, oldest first.
    pub history: Vec<(DateTime<Utc>, i64)>,
    pub current_value: Option<i64>,
    pub is_open: bool,
    pub recently_opened: bool,
}

impl From<&RideState> for PersistedRide {
    fn from(ride: &RideState) -> Self {
        Self {
            id: ride.id.clone(),
            name: ride.name.clone(),
            history: ride.stats().samples().map(|s| (s.timestamp, s.value)).collect(),
            current_value: ride.current_value(),
            is_open: ride.is_open(),
            recently_opened: ride.recently_opened(),
        }
    }
}

impl TryFrom<PersistedRide> for RideState {
    type Error = WaitError;

    fn try_from(ride: PersistedRide) -> Result<Self, Self::Error> {
        if let Some(pair) = ride.history.windows(2).find(|w| w[1].0 < w[0].0) {
            return Err(WaitError::InvalidHistory {
                ride_id: ride.id,
                reason: format!("sample at {} precedes {}", pair[1].0, pair[0].0),
            });
        }
        let samples = ride
            .history
            .into_iter()
            .map(|(timestamp, value)| Sample { timestamp, value });
        let stats = WindowedStatistic::from_history(samples, ride.current_value);
        Ok(RideState::from_parts(
            ride.id,
            ride.name,
            stats,
            ride.is_open,
            ride.recently_opened,
        ))
    }
}

impl Registry {
    /// Copy of every park, taken park by park under each park's read lock.
    pub fn to_persisted(&self) -> Vec<PersistedPark> {
        let handles: Vec<_> = read_lock(&self.parks).values().cloned().collect();
        handles
            .iter()
            .map(|park| {
                let park = read_lock(park);
                PersistedPark {
                    id: park.id.clone(),
                    name: park.name.clone(),
                    rides: park.rides().map(PersistedRide::from).collect(),
                }
            })
            .collect()
    }

    /// Replace the registry contents with persisted parks.
    ///
    /// Everything is validated before anything is swapped in; on error the
    /// registry is unchanged. Returns the number of rides restored.
    pub fn restore(&self, persisted: Vec<PersistedPark>) -> Result<usize, WaitError> {
        let mut parks = IndexMap::with_capacity(persisted.len());
        let mut ride_count = 0;

        for p in persisted {
            if parks.contains_key(&p.id) {
                return Err(WaitError::DuplicatePark(p.id));
            }
            let mut park = Park::new(p.id.clone(), p.name);
            for ride in p.rides {
                let state = RideState::try_from(ride)?;
                if park.rides.contains_key(&state.id) {
                    return Err(WaitError::InvalidHistory {
                        reason: format!("ride listed twice in park '{}'", p.id),
                        ride_id: state.id,
                    });
                }
                park.rides.insert(state.id.clone(), state);
            }
            ride_count += park.len();
            parks.insert(p.id, Arc::new(RwLock::new(park)));
        }

        let park_count = parks.len();
        *write_lock(&self.parks) = parks;
        info!(parks = park_count, rides = ride_count, "registry restored");
        Ok(ride_count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::SnapshotFilter;
    use crate::registry::tests::{t, RecordingSink};
    use waitwatch_core::RideReading;

    fn populated() -> Registry {
        let registry = Registry::new(Arc::new(RecordingSink::default()));
        registry.ingest_at(
            "1",
            "Test Park",
            &[RideReading::open("10", "Ride A", 5), RideReading::closed("11", "Ride B")],
            t(0),
        );
        registry.ingest_at(
            "1",
            "Test Park",
            &[RideReading::open("10", "Ride A", 9), RideReading::open("11", "Ride B", 20)],
            t(5),
        );
        registry
    }

    #[test]
    fn restore_reproduces_statistics() {
        let original = populated();
        let persisted = original.to_persisted();

        let json = serde_json::to_string(&persisted).unwrap();
        let decoded: Vec<PersistedPark> = serde_json::from_str(&json).unwrap();
        assert_eq!(decoded, persisted);

        let restored = Registry::new(Arc::new(RecordingSink::default()));
        assert_eq!(restored.restore(decoded).unwrap(), 2);

        let filter = SnapshotFilter::default();
        assert_eq!(restored.snapshot(None, &filter), original.snapshot(None, &filter));
        assert_eq!(restored.parks(), original.parks());
    }

    #[test]
    fn timestamps_round_trip_with_nanoseconds() {
        let ts = t(0) + chrono::Duration::nanoseconds(123_456_789);
        let ride = PersistedRide {
            id: "10".to_string(),
            name: "Ride".to_string(),
            history: vec![(ts, 5)],
            current_value: Some(5),
            is_open: true,
            recently_opened: false,
        };
        let json = serde_json::to_string(&ride).unwrap();
        let back: PersistedRide = serde_json::from_str(&json).unwrap();
        assert_eq!(back.history[0].0, ts);
    }

    #[test]
    fn restored_edge_flags_survive() {
        let registry = Registry::new(Arc::new(RecordingSink::default()));
        registry.ingest_at("1", "Park", &[RideReading::closed("10", "A")], t(0));
        registry.ingest_at("1", "Park", &[RideReading::open("10", "A", 5)], t(5));

        let restored = Registry::new(Arc::new(RecordingSink::default()));
        restored.restore(registry.to_persisted()).unwrap();
        let rows = restored.snapshot(None, &SnapshotFilter::default());
        assert!(rows[0].recently_opened);
        assert!(rows[0].is_open);
    }

    #[test]
    fn out_of_order_history_is_rejected_and_registry_untouched() {
        let registry = populated();
        let before = registry.snapshot(None, &SnapshotFilter::default());

        let bad = vec![PersistedPark {
            id: "2".to_string(),
            name: "Other".to_string(),
            rides: vec![PersistedRide {
                id: "20".to_string(),
                name: "Backwards".to_string(),
                history: vec![(t(10), 1), (t(0), 2)],
                current_value: Some(2),
                is_open: true,
                recently_opened: false,
            }],
        }];
        let err = registry.restore(bad).unwrap_err();
        assert!(matches!(err, WaitError::InvalidHistory { ref ride_id, .. } if ride_id == "20"));
        assert_eq!(registry.snapshot(None, &SnapshotFilter::default()), before);
    }

    fn persisted_ride(id: &str, value: i64) -> PersistedRide {
        PersistedRide {
            id: id.to_string(),
            name: format!("Ride {id}"),
            history: vec![(t(0), value)],
            current_value: Some(value),
            is_open: true,
            recently_opened: false,
        }
    }

    #[test]
    fn duplicate_park_is_rejected_and_registry_untouched() {
        let registry = populated();
        let before = registry.snapshot(None, &SnapshotFilter::default());

        let dup = vec![
            PersistedPark {
                id: "2".to_string(),
                name: "Other".to_string(),
                rides: vec![persisted_ride("20", 5)],
            },
            PersistedPark {
                id: "2".to_string(),
                name: "Other Again".to_string(),
                rides: vec![persisted_ride("21", 7), persisted_ride("22", 9)],
            },
        ];
        let err = registry.restore(dup).unwrap_err();
        assert!(matches!(err, WaitError::DuplicatePark(ref id) if id == "2"));
        assert_eq!(registry.snapshot(None, &SnapshotFilter::default()), before);
        assert_eq!(registry.parks().len(), 1);
    }

    #[test]
    fn duplicate_ride_within_park_is_rejected() {
        let registry = populated();
        let before = registry.snapshot(None, &SnapshotFilter::default());

        let dup = vec![PersistedPark {
            id: "2".to_string(),
            name: "Other".to_string(),
            rides: vec![persisted_ride("20", 5), persisted_ride("20", 8)],
        }];
        let err = registry.restore(dup).unwrap_err();
        assert!(matches!(err, WaitError::InvalidHistory { ref ride_id, .. } if ride_id == "20"));
        assert_eq!(registry.snapshot(None, &SnapshotFilter::default()), before);
    }
}
