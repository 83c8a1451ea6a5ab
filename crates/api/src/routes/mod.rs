//! Route definitions, grouped by resource.

pub mod events;
pub mod health;
pub mod tickets;
pub mod validation;

use axum::Router;

use crate::state::AppState;

/// Everything mounted under `/internal`.
pub fn internal_routes() -> Router<AppState> {
    Router::new()
        .nest("/validation", validation::router())
        .nest("/tickets", tickets::router())
        .nest("/events", events::router())
        .nest("/guests", events::guests_router())
}
