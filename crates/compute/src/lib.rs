//! Per-ride wait statistics and the park registry.
//!
//! - [`WindowedStatistic`]: 5-day rolling samples with mean / stdev and the
//!   unusually-low predicate
//! - [`RideState`]: open/closed state machine with edge-detected reopening
//! - [`Registry`]: park -> ride mapping, batch ingestion, filtered snapshots
//!   and the persisted form

pub mod filter;
pub mod persist;
pub mod registry;
pub mod ride;
pub mod window;

pub use filter::SnapshotFilter;
pub use persist::{PersistedPark, PersistedRide};
pub use registry::{IngestReport, Park, Registry, SharedPark};
pub use ride::{RideState, RideSummary};
pub use window::{Sample, WindowedStatistic};
