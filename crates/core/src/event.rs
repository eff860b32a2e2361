use serde::{Deserialize, Serialize};

/// What happened to a ride.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    /// The ride came back after being closed.
    Opened,
    /// The current wait dropped more than one stdev below the window mean.
    UnusuallyLow,
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            EventKind::Opened => "opened",
            EventKind::UnusuallyLow => "unusually_low",
        };
        write!(f, "{s}")
    }
}

/// A state transition worth telling subscribers about.
///
/// Serialized as `{entity_id, entity_name, event, wait}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnomalyEvent {
    pub entity_id: String,
    pub entity_name: String,
    #[serde(rename = "event")]
    pub kind: EventKind,
    #[serde(rename = "wait")]
    pub current_value: Option<i64>,
}

/// Receiver of the events produced by one ingestion batch.
///
/// Implementations must return promptly: `publish` runs on the ingestion path.
pub trait EventSink: Send + Sync {
    fn publish(&self, events: Vec<AnomalyEvent>);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_wire_format() {
        let event = AnomalyEvent {
            entity_id: "10".to_string(),
            entity_name: "Space Mountain".to_string(),
            kind: EventKind::UnusuallyLow,
            current_value: Some(5),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "entity_id": "10",
                "entity_name": "Space Mountain",
                "event": "unusually_low",
                "wait": 5,
            })
        );
    }

    #[test]
    fn null_wait_is_serialized() {
        let event = AnomalyEvent {
            entity_id: "10".to_string(),
            entity_name: "Ride".to_string(),
            kind: EventKind::Opened,
            current_value: None,
        };
        let json = serde_json::to_value(&event).unwrap();
        assert!(json["wait"].is_null());
        assert_eq!(json["event"], "opened");
    }
}
