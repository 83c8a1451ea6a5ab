//! Root-level liveness route.

use axum::routing::get;
use axum::Router;

use crate::handlers::health;
use crate::state::AppState;

/// Routes mounted at the root.
///
/// ```text
/// GET /health -> live
/// ```
pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health::live))
}
