//! Route definitions for the `/internal/tickets` resource.

use axum::routing::get;
use axum::Router;

use crate::handlers::{health, tickets};
use crate::state::AppState;

/// Routes mounted at `/internal/tickets`.
///
/// ```text
/// GET   /{ticket_id}/status        -> get_status
/// GET   /{ticket_id}/scan-history  -> get_scan_history   (?limit&offset&start_date&end_date&location)
/// PATCH /{ticket_id}/status        -> update_status      (admin transitions)
/// GET   /health                    -> health
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/{ticket_id}/status",
            get(tickets::get_status).patch(tickets::update_status),
        )
        .route("/{ticket_id}/scan-history", get(tickets::get_scan_history))
        .route("/health", get(health::tickets))
}
