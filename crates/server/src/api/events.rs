//! Server-sent stream of ride events.

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::response::sse::{Event, KeepAlive, Sse};
use futures::{Stream, StreamExt};
use serde::Deserialize;
use tracing::debug;

use crate::state::AppState;

#[derive(Debug, Default, Deserialize, utoipa::IntoParams)]
pub struct EventsQuery {
    /// Comma-separated ride ids; omit for every ride.
    pub rides: Option<String>,
}

impl EventsQuery {
    fn ride_ids(&self) -> Vec<String> {
        self.rides
            .as_deref()
            .unwrap_or_default()
            .split(',')
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map(str::to_string)
            .collect()
    }
}

/// Live `opened` / `unusually_low` events, one JSON object per `data:` line.
///
/// The subscription ends when the client disconnects or the server shuts down.
#[utoipa::path(
    get,
    path = "/events",
    tag = "Events",
    params(EventsQuery),
    responses(
        (status = 200, description = "text/event-stream of {entity_id, entity_name, event, wait}")
    )
)]
pub async fn events(
    State(state): State<Arc<AppState>>,
    Query(query): Query<EventsQuery>,
) -> Sse<impl Stream<Item = Result<Event, axum::Error>>> {
    let ride_ids = query.ride_ids();
    debug!(rides = ?ride_ids, "event stream opened");

    let subscription = state.hub.subscribe(ride_ids);
    let mut shutdown = state.shutdown_signal();
    let stream = subscription
        .take_until(async move {
            let _ = shutdown.wait_for(|stop| *stop).await;
        })
        .map(|event| Event::default().json_data(event));

    Sse::new(stream).keep_alive(KeepAlive::default())
}
