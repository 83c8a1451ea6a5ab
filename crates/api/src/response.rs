//! Shared response envelope for API handlers.
//!
//! Every response — success or error — uses the same envelope so scan
//! devices can parse one shape:
//! `{ success, data?, error?, code?, error_id, timestamp, processing_time_ms? }`.
//! Use [`ApiResponse`] instead of ad-hoc `serde_json::json!` to get
//! compile-time type safety and consistent serialization.

use axum::http::StatusCode;
use serde::Serialize;
use tessera_core::codes::{CodeCategory, RejectCode};
use tessera_core::types::Timestamp;

/// Standard response envelope.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    /// Correlates a wire response with server logs.
    pub error_id: String,
    pub timestamp: Timestamp,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub processing_time_ms: Option<u64>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            code: None,
            error_id: uuid::Uuid::new_v4().to_string(),
            timestamp: chrono::Utc::now(),
            processing_time_ms: None,
        }
    }

    pub fn rejected(data: T, code: &str, message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: Some(data),
            error: Some(message.into()),
            code: Some(code.to_string()),
            error_id: uuid::Uuid::new_v4().to_string(),
            timestamp: chrono::Utc::now(),
            processing_time_ms: None,
        }
    }

    pub fn with_processing_time(mut self, started: std::time::Instant) -> Self {
        self.processing_time_ms = Some(started.elapsed().as_millis() as u64);
        self
    }
}

impl ApiResponse<()> {
    /// Error envelope with no payload.
    pub fn error(code: &str, message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
            code: Some(code.to_string()),
            error_id: uuid::Uuid::new_v4().to_string(),
            timestamp: chrono::Utc::now(),
            processing_time_ms: None,
        }
    }
}

/// Derive the HTTP status for a reject code.
pub fn status_for(code: RejectCode) -> StatusCode {
    match code.category() {
        CodeCategory::Business => StatusCode::BAD_REQUEST,
        CodeCategory::Security => StatusCode::FORBIDDEN,
        CodeCategory::NotFound => StatusCode::NOT_FOUND,
        CodeCategory::Conflict => StatusCode::CONFLICT,
        CodeCategory::RateLimited => StatusCode::TOO_MANY_REQUESTS,
        CodeCategory::Transient => StatusCode::INTERNAL_SERVER_ERROR,
    }
}
