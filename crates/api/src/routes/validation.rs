//! Route definitions for the `/internal/validation` resource.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::{health, validation};
use crate::state::AppState;

/// Routes mounted at `/internal/validation`.
///
/// ```text
/// POST /validate-ticket         -> validate_ticket
/// POST /validate-ticket-by-code -> validate_ticket_by_code
/// POST /validate-batch          -> validate_batch
/// GET  /health                  -> health
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/validate-ticket", post(validation::validate_ticket))
        .route(
            "/validate-ticket-by-code",
            post(validation::validate_ticket_by_code),
        )
        .route("/validate-batch", post(validation::validate_batch))
        .route("/health", get(health::validation))
}
