//! Park listing and wait-time snapshots.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::Json;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use waitwatch_compute::{RideSummary, SnapshotFilter};

use crate::state::AppState;

/// One ride row. Nullable fields serialize as `null`.
#[derive(Debug, Clone, PartialEq, Serialize, utoipa::ToSchema)]
pub struct WaitTimeEntry {
    pub id: String,
    pub name: String,
    /// Latest wait in minutes; `null` while closed.
    pub current_wait: Option<i64>,
    /// Mean wait over the trailing window.
    pub mean: Option<f64>,
    /// Sample standard deviation; `null` with fewer than two samples.
    pub stdev: Option<f64>,
    pub is_open: bool,
    pub recently_opened: bool,
    pub is_unusually_low: bool,
}

impl From<RideSummary> for WaitTimeEntry {
    fn from(row: RideSummary) -> Self {
        Self {
            id: row.id,
            name: row.name,
            current_wait: row.current_value,
            mean: row.mean,
            stdev: row.stdev,
            is_open: row.is_open,
            recently_opened: row.recently_opened,
            is_unusually_low: row.is_unusually_low,
        }
    }
}

/// Exact-match filters. Absent parameters match every row.
#[derive(Debug, Default, Deserialize, utoipa::IntoParams)]
pub struct WaitTimesQuery {
    /// Limit to one park.
    pub park_id: Option<String>,
    pub id: Option<String>,
    pub name: Option<String>,
    #[serde(alias = "current_value")]
    pub current_wait: Option<i64>,
    pub mean: Option<f64>,
    pub stdev: Option<f64>,
    pub is_open: Option<bool>,
    pub recently_opened: Option<bool>,
    pub is_unusually_low: Option<bool>,
}

impl WaitTimesQuery {
    fn into_parts(self) -> (Option<String>, SnapshotFilter) {
        let filter = SnapshotFilter {
            id: self.id,
            name: self.name,
            current_value: self.current_wait,
            mean: self.mean,
            stdev: self.stdev,
            is_open: self.is_open,
            recently_opened: self.recently_opened,
            is_unusually_low: self.is_unusually_low,
        };
        (self.park_id, filter)
    }
}

pub(crate) fn snapshot_entries(
    state: &AppState,
    park_id: Option<&str>,
    filter: &SnapshotFilter,
) -> Vec<WaitTimeEntry> {
    state
        .registry
        .snapshot(park_id, filter)
        .into_iter()
        .map(WaitTimeEntry::from)
        .collect()
}

/// Known parks as `{park_id: park_name}`, in first-seen order.
#[utoipa::path(
    get,
    path = "/parks",
    tag = "Parks",
    responses(
        (status = 200, description = "Object mapping park id to park name")
    )
)]
pub async fn parks(State(state): State<Arc<AppState>>) -> Json<IndexMap<String, String>> {
    Json(
        state
            .registry
            .parks()
            .into_iter()
            .map(|p| (p.id, p.name))
            .collect(),
    )
}

/// Ride summaries across all parks, or one park via `park_id`.
#[utoipa::path(
    get,
    path = "/wait_times",
    tag = "Parks",
    params(WaitTimesQuery),
    responses(
        (status = 200, description = "Matching ride summaries", body = Vec<WaitTimeEntry>)
    )
)]
pub async fn wait_times(
    State(state): State<Arc<AppState>>,
    Query(query): Query<WaitTimesQuery>,
) -> Json<Vec<WaitTimeEntry>> {
    let (park_id, filter) = query.into_parts();
    Json(snapshot_entries(&state, park_id.as_deref(), &filter))
}

/// Ride summaries for one park. An unknown park yields `[]`.
#[utoipa::path(
    get,
    path = "/parks/{park_id}/wait_times",
    tag = "Parks",
    params(
        ("park_id" = String, Path, description = "Park id"),
        WaitTimesQuery
    ),
    responses(
        (status = 200, description = "Matching ride summaries", body = Vec<WaitTimeEntry>)
    )
)]
pub async fn park_wait_times(
    State(state): State<Arc<AppState>>,
    Path(park_id): Path<String>,
    Query(query): Query<WaitTimesQuery>,
) -> Json<Vec<WaitTimeEntry>> {
    let (_, filter) = query.into_parts();
    Json(snapshot_entries(&state, Some(&park_id), &filter))
}
