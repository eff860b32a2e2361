//! Per-ride open/closed state machine.

use chrono::{DateTime, Utc};
use serde::Serialize;

use waitwatch_core::{AnomalyEvent, EventKind};

use crate::window::WindowedStatistic;

/// Live state of one ride.
///
/// A ride starts `Open` with `recently_opened = false`. `recently_opened`
/// is true only right after a closed -> open transition and is cleared by
/// the next update, whatever it reports.
#[derive(Debug, Clone)]
pub struct RideState {
    pub id: String,
    pub name: String,
    stats: WindowedStatistic,
    is_open: bool,
    recently_opened: bool,
}

/// Point-in-time view of a ride, computed fresh from live state.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RideSummary {
    pub id: String,
    pub name: String,
    pub current_value: Option<i64>,
    pub mean: Option<f64>,
    pub stdev: Option<f64>,
    pub is_open: bool,
    pub recently_opened: bool,
    pub is_unusually_low: bool,
}

impl RideState {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            stats: WindowedStatistic::new(),
            is_open: true,
            recently_opened: false,
        }
    }

    /// Rebuild a ride from persisted parts.
    pub(crate) fn from_parts(
        id: String,
        name: String,
        stats: WindowedStatistic,
        is_open: bool,
        recently_opened: bool,
    ) -> Self {
        Self {
            id,
            name,
            stats,
            is_open,
            recently_opened,
        }
    }

    /// Apply one ingestion update and return the events it produced.
    ///
    /// An open report without a usable value counts as closed.
    pub fn update(
        &mut self,
        reported_open: bool,
        value: Option<i64>,
        timestamp: DateTime<Utc>,
    ) -> Vec<AnomalyEvent> {
        let mut events = Vec::new();

        match (reported_open, value) {
            (true, Some(value)) => {
                self.stats.record(value, timestamp);
                self.recently_opened = !self.is_open;
                self.is_open = true;
            }
            _ => {
                self.stats.mark_closed();
                self.is_open = false;
                self.recently_opened = false;
            }
        }

        if self.recently_opened {
            events.push(self.event(EventKind::Opened));
        }
        if self.is_unusually_low() {
            events.push(self.event(EventKind::UnusuallyLow));
        }
        events
    }

    fn event(&self, kind: EventKind) -> AnomalyEvent {
        AnomalyEvent {
            entity_id: self.id.clone(),
            entity_name: self.name.clone(),
            kind,
            current_value: self.stats.current_value(),
        }
    }

    pub fn is_open(&self) -> bool {
        self.is_open
    }

    pub fn recently_opened(&self) -> bool {
        self.recently_opened
    }

    pub fn stats(&self) -> &WindowedStatistic {
        &self.stats
    }

    pub fn current_value(&self) -> Option<i64> {
        self.stats.current_value()
    }

    pub fn is_unusually_low(&self) -> bool {
        self.stats.is_unusually_low(self.stats.current_value())
    }

    pub fn summary(&self) -> RideSummary {
        RideSummary {
            id: self.id.clone(),
            name: self.name.clone(),
            current_value: self.stats.current_value(),
            mean: self.stats.mean(),
            stdev: self.stats.stdev(),
            is_open: self.is_open,
            recently_opened: self.recently_opened,
            is_unusually_low: self.is_unusually_low(),
        }
    }
}
