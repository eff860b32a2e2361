//! Telemetry sources for park wait times.

pub mod flatten;
pub mod queue_times;
pub mod traits;

pub use queue_times::QueueTimesClient;
pub use traits::{SourceError, TelemetrySource};
