use std::convert::Infallible;

use axum::{
    Json, Router,
    extract::State,
    response::sse::{Event, Sse},
    routing::get,
};
use futures::Stream;
use tracing::info;

use crate::{
    services::sse_service,
    state::{SaveStatus, SharedState},
};

#[utoipa::path(
    get,
    path = "/api/admin/save-status",
    tag = "sse",
    responses((status = 200, description = "Progress of the most recent write", body = SaveStatus))
)]
pub async fn save_status(State(state): State<SharedState>) -> Json<SaveStatus> {
    Json(state.save_status().current())
}

#[utoipa::path(
    get,
    path = "/api/admin/save-status/stream",
    tag = "sse",
    responses((status = 200, description = "Save status and degraded mode changes", content_type = "text/event-stream", body = String))
)]
/// Stream save-status changes (`saving`, `saved`, `error`, back to `idle`) to admin clients.
pub async fn save_status_stream(
    State(state): State<SharedState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    info!("New save status SSE connection");
    sse_service::to_sse_stream(sse_service::subscribe_status(&state))
}

/// Configure the save status endpoints.
pub fn router() -> Router<SharedState> {
    Router::<SharedState>::new()
        .route("/api/admin/save-status", get(save_status))
        .route("/api/admin/save-status/stream", get(save_status_stream))
}
