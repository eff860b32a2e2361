use serde::{Deserialize, Serialize};

/// Upstream status strings that mark a ride closed even when its
/// availability flag says open.
pub const CLOSED_STATUSES: &[&str] = &["Closed", "Refurbishment"];

/// A park as listed by the telemetry source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParkListing {
    pub id: String,
    pub name: String,
}

/// One flattened ride record from a park's wait-time payload.
///
/// All fields come from upstream JSON and any of them may be missing;
/// a reading without an `id` is skipped at ingestion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RideReading {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub wait_time: Option<i64>,
    #[serde(default = "default_is_open")]
    pub is_open: bool,
    #[serde(default)]
    pub status: Option<String>,
}

fn default_is_open() -> bool {
    true
}

impl RideReading {
    /// An open reading with a usable wait time.
    pub fn open(id: impl Into<String>, name: impl Into<String>, wait_time: i64) -> Self {
        Self {
            id: Some(id.into()),
            name: Some(name.into()),
            wait_time: Some(wait_time),
            is_open: true,
            status: None,
        }
    }

    /// A reading whose availability flag is false.
    pub fn closed(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            name: Some(name.into()),
            wait_time: Some(0),
            is_open: false,
            status: None,
        }
    }

    /// Whether the source reports the ride as available.
    ///
    /// Either signal is enough to close a ride: the `is_open` flag being
    /// false, or a status string from [`CLOSED_STATUSES`].
    pub fn reported_open(&self) -> bool {
        let closed_status = self
            .status
            .as_deref()
            .map(|s| CLOSED_STATUSES.contains(&s))
            .unwrap_or(false);
        self.is_open && !closed_status
    }
}
