use async_trait::async_trait;
use thiserror::Error;

use waitwatch_core::{ParkListing, RideReading};

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Upstream returned {status} for {url}")]
    Status { status: u16, url: String },

    #[error("Malformed payload: {0}")]
    Payload(String),
}

/// Where park listings and ride readings come from.
#[async_trait]
pub trait TelemetrySource: Send + Sync {
    /// Parks in the tracked group, in upstream order.
    async fn list_parks(&self) -> Result<Vec<ParkListing>, SourceError>;

    /// Flattened ride readings for one park.
    async fn list_readings(&self, park_id: &str) -> Result<Vec<RideReading>, SourceError>;
}
