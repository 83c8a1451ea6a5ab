//! Handlers for the scan validation endpoints.
//!
//! These are thin adapters: parse and sanity-check the wire shape, hand the
//! request to the engine, and translate the outcome into the response
//! envelope. All decisions live in the engine and the policy evaluator.

use std::time::Instant;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use tessera_core::policy::ScanContext;
use tessera_core::types::{DbId, Timestamp};

use crate::engine::batch;
use crate::engine::{ScanDecision, ScanOutcome, ScanRequest};
use crate::error::{AppError, AppResult};
use crate::response::{status_for, ApiResponse};
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request types
// ---------------------------------------------------------------------------

/// Wire shape of a scan context.
#[derive(Debug, Clone, Deserialize)]
pub struct ScanContextDto {
    pub location: String,
    pub device_id: String,
    /// Device-claimed scan time; defaults to server time when omitted.
    pub timestamp: Option<Timestamp>,
    pub operator_id: Option<DbId>,
    pub checkpoint_id: Option<String>,
}

impl ScanContextDto {
    fn check(&self) -> Result<(), AppError> {
        if self.location.trim().is_empty() {
            return Err(AppError::BadRequest("scan_context.location must not be empty".into()));
        }
        if self.device_id.trim().is_empty() {
            return Err(AppError::BadRequest("scan_context.device_id must not be empty".into()));
        }
        Ok(())
    }

    fn into_context(self) -> ScanContext {
        ScanContext {
            device_id: self.device_id,
            location: self.location,
            operator_id: self.operator_id,
            checkpoint_id: self.checkpoint_id,
            timestamp: self.timestamp.unwrap_or_else(chrono::Utc::now),
        }
    }
}

/// Body of `POST /internal/validation/validate-ticket`.
#[derive(Debug, Deserialize)]
pub struct ValidateTicketRequest {
    pub ticket_id: DbId,
    pub event_id: DbId,
    /// Accepted for forward compatibility; not used by the policy.
    pub ticket_type: Option<String>,
    pub user_id: Option<DbId>,
    pub scan_context: ScanContextDto,
    pub validation_metadata: Option<ValidationMetadata>,
}

/// Optional scanner-supplied metadata. Informational only: the stored QR
/// payload on the ticket row is authoritative.
#[derive(Debug, Deserialize)]
pub struct ValidationMetadata {
    pub qr_version: Option<String>,
    pub qr_algorithm: Option<String>,
    pub validated_at: Option<Timestamp>,
}

/// Body of `POST /internal/validation/validate-ticket-by-code`.
#[derive(Debug, Deserialize)]
pub struct ValidateByCodeRequest {
    pub ticket_code: String,
    pub scan_context: ScanContextDto,
}

/// Body of `POST /internal/validation/validate-batch`.
#[derive(Debug, Deserialize)]
pub struct ValidateBatchRequest {
    pub tickets: Vec<ValidateTicketRequest>,
    pub batch_id: Option<String>,
    pub metadata: Option<serde_json::Value>,
}

// ---------------------------------------------------------------------------
// Response payload
// ---------------------------------------------------------------------------

/// Payload of a single validation response, admitted or rejected.
#[derive(Debug, Serialize)]
pub struct ValidationResult {
    pub ticket_id: DbId,
    pub event_id: DbId,
    pub admitted: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub restrictions: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scan_log_id: Option<DbId>,
    pub scanned_at: Timestamp,
}

fn outcome_response(outcome: ScanOutcome, started: Instant) -> Response {
    match outcome.decision {
        ScanDecision::Admitted {
            scan_log_id,
            restrictions,
        } => {
            let data = ValidationResult {
                ticket_id: outcome.ticket_id,
                event_id: outcome.event_id,
                admitted: true,
                restrictions,
                scan_log_id: Some(scan_log_id),
                scanned_at: outcome.scanned_at,
            };
            let body = ApiResponse::ok(data).with_processing_time(started);
            (StatusCode::OK, Json(body)).into_response()
        }
        ScanDecision::Rejected { code, reason } => {
            let data = ValidationResult {
                ticket_id: outcome.ticket_id,
                event_id: outcome.event_id,
                admitted: false,
                restrictions: Vec::new(),
                scan_log_id: None,
                scanned_at: outcome.scanned_at,
            };
            let body = ApiResponse::rejected(data, code.as_str(), reason)
                .with_processing_time(started);
            (status_for(code), Json(body)).into_response()
        }
    }
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /internal/validation/validate-ticket
pub async fn validate_ticket(
    State(state): State<AppState>,
    Json(req): Json<ValidateTicketRequest>,
) -> AppResult<Response> {
    let started = Instant::now();
    req.scan_context.check()?;

    let scan_req = ScanRequest {
        ticket_id: req.ticket_id,
        event_id: req.event_id,
        ctx: req.scan_context.into_context(),
    };
    let outcome = state.engine.validate(&scan_req).await?;
    Ok(outcome_response(outcome, started))
}

/// POST /internal/validation/validate-ticket-by-code
pub async fn validate_ticket_by_code(
    State(state): State<AppState>,
    Json(req): Json<ValidateByCodeRequest>,
) -> AppResult<Response> {
    let started = Instant::now();
    req.scan_context.check()?;
    if req.ticket_code.trim().is_empty() {
        return Err(AppError::BadRequest("ticket_code must not be empty".into()));
    }

    let outcome = state
        .engine
        .validate_by_code(&req.ticket_code, req.scan_context.into_context())
        .await?;
    Ok(outcome_response(outcome, started))
}

/// POST /internal/validation/validate-batch
///
/// The batch itself always answers 200; per-item admission and reject codes
/// are inside the payload, in input order.
pub async fn validate_batch(
    State(state): State<AppState>,
    Json(req): Json<ValidateBatchRequest>,
) -> AppResult<Response> {
    let started = Instant::now();
    let max = state.config.batch_max_items;

    if req.tickets.is_empty() {
        return Err(AppError::BadRequest("batch must contain at least one ticket".into()));
    }
    if req.tickets.len() > max {
        return Err(AppError::BadRequest(format!(
            "batch exceeds the maximum of {max} items"
        )));
    }

    let mut items = Vec::with_capacity(req.tickets.len());
    for item in &req.tickets {
        item.scan_context.check()?;
    }
    for item in req.tickets {
        items.push(ScanRequest {
            ticket_id: item.ticket_id,
            event_id: item.event_id,
            ctx: item.scan_context.into_context(),
        });
    }

    if let Some(batch_id) = &req.batch_id {
        tracing::info!(batch_id = %batch_id, items = items.len(), "Processing validation batch");
    }

    let outcome = batch::process(&state.engine, items).await;
    let body = ApiResponse::ok(outcome).with_processing_time(started);
    Ok((StatusCode::OK, Json(body)).into_response())
}
