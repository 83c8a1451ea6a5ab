//! Component health endpoints.
//!
//! Each component health pings the database so a green answer means the
//! component could actually serve a request, not just that the process is up.

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use serde::Serialize;

use crate::error::AppResult;
use crate::response::ApiResponse;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct HealthStatus {
    pub status: &'static str,
    pub component: &'static str,
    pub database: &'static str,
}

async fn component_health(state: &AppState, component: &'static str) -> AppResult<HealthStatus> {
    tessera_db::health_check(&state.pool).await?;
    Ok(HealthStatus {
        status: "ok",
        component,
        database: "reachable",
    })
}

/// GET /health — process liveness, no dependencies.
pub async fn live() -> impl IntoResponse {
    Json(ApiResponse::ok(HealthStatus {
        status: "ok",
        component: "api",
        database: "not checked",
    }))
}

/// GET /internal/validation/health
pub async fn validation(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    Ok(Json(ApiResponse::ok(component_health(&state, "validation").await?)))
}

/// GET /internal/events/health
pub async fn events(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    Ok(Json(ApiResponse::ok(component_health(&state, "events").await?)))
}

/// GET /internal/tickets/health
pub async fn tickets(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    Ok(Json(ApiResponse::ok(component_health(&state, "tickets").await?)))
}
