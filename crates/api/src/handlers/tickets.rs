//! Handlers for ticket status, scan history, and admin transitions.

use axum::extract::{Path, Query, State};
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;
use tessera_core::error::CoreError;
use tessera_core::state::TicketState;
use tessera_core::types::DbId;
use tessera_db::models::scan_log::{HistoryQuery, ScanLogPage};
use tessera_db::models::ticket::{Ticket, TicketStatusView};
use tessera_db::repositories::{ScanLogRepo, TicketRepo};

use crate::engine;
use crate::error::{AppError, AppResult};
use crate::response::ApiResponse;
use crate::state::AppState;

async fn load_ticket(state: &AppState, id: DbId) -> AppResult<(Ticket, TicketState)> {
    let ticket = TicketRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(CoreError::NotFound {
            entity: "ticket",
            id,
        })?;
    let ticket_state = ticket
        .state()
        .ok_or_else(|| AppError::InternalError(format!("ticket {id} has unknown status")))?;
    Ok((ticket, ticket_state))
}

/// GET /internal/tickets/{ticket_id}/status
///
/// Read-only projection of the ticket and its admission history. Takes no
/// locks; the answer may be stale by the time it is read.
pub async fn get_status(
    State(state): State<AppState>,
    Path(ticket_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let (ticket, ticket_state) = load_ticket(&state, ticket_id).await?;

    let admitted_count = ScanLogRepo::admitted_count_for_ticket(&state.pool, ticket_id).await?;
    let last_admitted_at = ScanLogRepo::last_admitted_at(&state.pool, ticket_id).await?;

    let view = TicketStatusView::build(ticket, ticket_state, admitted_count, last_admitted_at);
    Ok(Json(ApiResponse::ok(view)))
}

/// GET /internal/tickets/{ticket_id}/scan-history
///
/// Paginated scan log for a ticket, newest first, with optional date-range
/// and location filters.
pub async fn get_scan_history(
    State(state): State<AppState>,
    Path(ticket_id): Path<DbId>,
    Query(params): Query<HistoryQuery>,
) -> AppResult<impl IntoResponse> {
    // 404 for unknown tickets rather than an empty page.
    load_ticket(&state, ticket_id).await?;

    let items = ScanLogRepo::history(&state.pool, ticket_id, &params).await?;
    let total = ScanLogRepo::count_history(&state.pool, ticket_id, &params).await?;

    Ok(Json(ApiResponse::ok(ScanLogPage { items, total })))
}

/// Body of `PATCH /internal/tickets/{ticket_id}/status`.
#[derive(Debug, Deserialize)]
pub struct UpdateTicketStatus {
    /// Target state: `cancelled`, `expired`, or `void`.
    pub status: String,
}

/// PATCH /internal/tickets/{ticket_id}/status
///
/// Admin transitions only. The state machine allows active tickets to be
/// cancelled, expired, or voided, and terminal tickets to be voided;
/// everything else is a conflict.
pub async fn update_status(
    State(state): State<AppState>,
    Path(ticket_id): Path<DbId>,
    Json(input): Json<UpdateTicketStatus>,
) -> AppResult<impl IntoResponse> {
    let target = TicketState::parse(&input.status)
        .ok_or_else(|| AppError::BadRequest(format!("unknown ticket status '{}'", input.status)))?;
    if target == TicketState::Active || target == TicketState::Used {
        return Err(AppError::BadRequest(format!(
            "tickets cannot be moved to '{}' by the admin API",
            target.as_str(),
        )));
    }

    let (_, current) = load_ticket(&state, ticket_id).await?;

    if !current.admin_transition_allowed(target) {
        return Err(CoreError::Conflict(format!(
            "cannot move a {} ticket to {}",
            current.as_str(),
            target.as_str(),
        ))
        .into());
    }

    let changed = engine::admin_transition(&state.pool, ticket_id, current, target).await?;
    if !changed {
        // The CAS lost against a concurrent transition.
        return Err(CoreError::Conflict("ticket state changed concurrently".into()).into());
    }

    tracing::info!(
        ticket_id,
        from = current.as_str(),
        to = target.as_str(),
        "Admin ticket transition",
    );

    let (ticket, ticket_state) = load_ticket(&state, ticket_id).await?;
    let admitted_count = ScanLogRepo::admitted_count_for_ticket(&state.pool, ticket_id).await?;
    let last_admitted_at = ScanLogRepo::last_admitted_at(&state.pool, ticket_id).await?;
    Ok(Json(ApiResponse::ok(TicketStatusView::build(
        ticket,
        ticket_state,
        admitted_count,
        last_admitted_at,
    ))))
}
