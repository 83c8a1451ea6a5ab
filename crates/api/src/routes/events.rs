//! Route definitions for the `/internal/events` and `/internal/guests`
//! resources.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::{events, health};
use crate::state::AppState;

/// Routes mounted at `/internal/events`.
///
/// ```text
/// POST /                      -> create_event     (draft)
/// GET  /{event_id}            -> get_event
/// POST /{event_id}/publish    -> publish_event    (draft -> active)
/// GET  /{event_id}/validate   -> validate_event   (scannability probe)
/// POST /{event_id}/guests     -> create_guest
/// GET  /health                -> health
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(events::create_event))
        .route("/{event_id}", get(events::get_event))
        .route("/{event_id}/publish", post(events::publish_event))
        .route("/{event_id}/validate", get(events::validate_event))
        .route("/{event_id}/guests", post(events::create_guest))
        .route("/health", get(health::events))
}

/// Routes mounted at `/internal/guests`.
///
/// ```text
/// POST /{guest_id}/tickets -> issue_ticket
/// ```
pub fn guests_router() -> Router<AppState> {
    Router::new().route("/{guest_id}/tickets", post(events::issue_ticket))
}
