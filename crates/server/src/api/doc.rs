//! OpenAPI document served via Scalar UI at `/docs`.

use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "waitwatch API",
        version = "0.1.0",
        description = "Theme-park ride wait times with rolling statistics and live anomaly events.",
    ),
    tags(
        (name = "Health", description = "Service status and ingestion progress"),
        (name = "Parks", description = "Park listing and filtered wait-time snapshots"),
        (name = "Events", description = "Server-sent stream of ride reopen and low-wait events"),
    ),
    paths(
        crate::api::health::health,
        crate::api::wait_times::parks,
        crate::api::wait_times::wait_times,
        crate::api::wait_times::park_wait_times,
        crate::api::events::events,
    ),
    components(schemas(
        crate::api::wait_times::WaitTimeEntry,
    ))
)]
pub struct ApiDoc;
