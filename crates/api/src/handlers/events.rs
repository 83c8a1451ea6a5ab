//! Handlers for event provisioning, guest registration, ticket issuance,
//! and the event-level scannability probe.

use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::Json;
use serde::Serialize;
use tessera_core::codes::RejectCode;
use tessera_core::error::CoreError;
use tessera_core::policy::{minute_of_day, TimeWindow};
use tessera_core::qr::{self, QrPayload};
use tessera_core::state::EventState;
use tessera_core::types::DbId;
use tessera_db::models::event::CreateEvent;
use tessera_db::models::event_guest::CreateEventGuest;
use tessera_db::models::ticket::IssueTicket;
use tessera_db::repositories::{EventGuestRepo, EventRepo, TicketRepo};

use crate::error::{AppError, AppResult};
use crate::response::ApiResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Events
// ---------------------------------------------------------------------------

/// POST /internal/events
///
/// Create a draft event. Publishing is a separate, explicit step.
pub async fn create_event(
    State(state): State<AppState>,
    Json(input): Json<CreateEvent>,
) -> AppResult<impl IntoResponse> {
    if input.title.trim().is_empty() {
        return Err(AppError::BadRequest("title must not be empty".into()));
    }
    if input.starts_at > input.ends_at {
        return Err(AppError::BadRequest("starts_at must not be after ends_at".into()));
    }
    if let Some(max) = input.max_attendees {
        if max < 0 {
            return Err(AppError::BadRequest("max_attendees must not be negative".into()));
        }
    }
    for minute in [input.window_start_minute, input.window_end_minute].into_iter().flatten() {
        if !(0..=1439).contains(&minute) {
            return Err(AppError::BadRequest(
                "time window minutes must be within 0..=1439".into(),
            ));
        }
    }

    let event = EventRepo::create(&state.pool, &input).await?;
    tracing::info!(event_id = event.id, title = %event.title, "Event created");
    Ok(Json(ApiResponse::ok(event)))
}

/// GET /internal/events/{event_id}
pub async fn get_event(
    State(state): State<AppState>,
    Path(event_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let event = EventRepo::find_by_id(&state.pool, event_id)
        .await?
        .ok_or(CoreError::NotFound {
            entity: "event",
            id: event_id,
        })?;
    Ok(Json(ApiResponse::ok(event)))
}

/// POST /internal/events/{event_id}/publish
///
/// Move a draft event to active. Publishing twice is a conflict.
pub async fn publish_event(
    State(state): State<AppState>,
    Path(event_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    EventRepo::find_by_id(&state.pool, event_id)
        .await?
        .ok_or(CoreError::NotFound {
            entity: "event",
            id: event_id,
        })?;

    let published = EventRepo::publish(&state.pool, event_id).await?;
    if !published {
        return Err(CoreError::Conflict("event is not in draft".into()).into());
    }

    tracing::info!(event_id, "Event published");
    let event = EventRepo::find_by_id(&state.pool, event_id)
        .await?
        .ok_or_else(|| AppError::InternalError("published event disappeared".into()))?;
    Ok(Json(ApiResponse::ok(event)))
}

/// Payload of the event scannability probe.
#[derive(Debug, Serialize)]
pub struct EventProbe {
    pub event_id: DbId,
    pub scannable: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

/// GET /internal/events/{event_id}/validate
///
/// Event-level preflight: answers whether a scan could possibly admit right
/// now, using the same event rules (and codes) as the policy evaluator.
pub async fn validate_event(
    State(state): State<AppState>,
    Path(event_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let event = EventRepo::find_by_id(&state.pool, event_id)
        .await?
        .ok_or(CoreError::NotFound {
            entity: "event",
            id: event_id,
        })?;
    let event_state = event
        .state()
        .ok_or_else(|| AppError::InternalError(format!("event {event_id} has unknown status")))?;

    let now = chrono::Utc::now();
    let code = if event_state == EventState::Cancelled {
        Some(RejectCode::EventCancelled)
    } else if event_state != EventState::Active {
        Some(RejectCode::EventNotActive)
    } else if now < event.starts_at {
        Some(RejectCode::EventNotStarted)
    } else if now > event.ends_at {
        Some(RejectCode::EventEnded)
    } else {
        let window = TimeWindow {
            start_minute: event.window_start_minute,
            end_minute: event.window_end_minute,
        };
        let restricted = (event.window_start_minute.is_some()
            || event.window_end_minute.is_some())
            && !window.contains(minute_of_day(now));
        restricted.then_some(RejectCode::TimeRestriction)
    };

    Ok(Json(ApiResponse::ok(EventProbe {
        event_id,
        scannable: code.is_none(),
        code: code.map(|c| c.as_str().to_string()),
    })))
}

// ---------------------------------------------------------------------------
// Guests and ticket issuance
// ---------------------------------------------------------------------------

/// POST /internal/events/{event_id}/guests
pub async fn create_guest(
    State(state): State<AppState>,
    Path(event_id): Path<DbId>,
    Json(input): Json<CreateEventGuest>,
) -> AppResult<impl IntoResponse> {
    if input.guest_name.trim().is_empty() {
        return Err(AppError::BadRequest("guest_name must not be empty".into()));
    }
    if input.invitation_code.trim().is_empty() {
        return Err(AppError::BadRequest("invitation_code must not be empty".into()));
    }

    EventRepo::find_by_id(&state.pool, event_id)
        .await?
        .ok_or(CoreError::NotFound {
            entity: "event",
            id: event_id,
        })?;

    // Duplicate invitation codes surface as 409 via the unique constraint.
    let guest = EventGuestRepo::create(&state.pool, event_id, &input).await?;
    Ok(Json(ApiResponse::ok(guest)))
}

/// POST /internal/guests/{guest_id}/tickets
///
/// Issue a ticket to a guest: generates the unique ticket code and the QR
/// payload carrying the ticket's identity.
pub async fn issue_ticket(
    State(state): State<AppState>,
    Path(guest_id): Path<DbId>,
    Json(input): Json<IssueTicket>,
) -> AppResult<impl IntoResponse> {
    let max_scans = input.max_scans.unwrap_or(1);
    if max_scans < 1 {
        return Err(AppError::BadRequest("max_scans must be at least 1".into()));
    }

    let guest = EventGuestRepo::find_by_id(&state.pool, guest_id)
        .await?
        .ok_or(CoreError::NotFound {
            entity: "event_guest",
            id: guest_id,
        })?;

    let ticket_code = format!("TKT-{}", uuid::Uuid::new_v4());
    let ticket = TicketRepo::issue(&state.pool, guest.id, &ticket_code, None, max_scans).await?;

    // The payload needs the generated ticket id, so it is attached right
    // after the insert. The column is write-once.
    let payload = qr::encode(&QrPayload {
        ticket_id: ticket.id,
        event_id: guest.event_id,
        issued_at: ticket.created_at,
        version: "v1".to_string(),
        algorithm: "plain".to_string(),
    });
    TicketRepo::attach_qr_payload(&state.pool, ticket.id, &payload).await?;

    let ticket = TicketRepo::find_by_id(&state.pool, ticket.id)
        .await?
        .ok_or_else(|| AppError::InternalError("issued ticket disappeared".into()))?;

    tracing::info!(
        ticket_id = ticket.id,
        guest_id,
        event_id = guest.event_id,
        "Ticket issued",
    );
    Ok(Json(ApiResponse::ok(ticket)))
}
