//! Scan log entity model and DTOs. The table is append-only.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use tessera_core::types::{DbId, Timestamp};

/// Wire values of the `decision` column.
pub const DECISION_ADMITTED: &str = "admitted";
pub const DECISION_REJECTED: &str = "rejected";

/// A row from the `scan_logs` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ScanLog {
    pub id: DbId,
    pub ticket_id: DbId,
    pub event_id: DbId,
    pub operator_id: Option<DbId>,
    pub device_id: String,
    pub location: String,
    pub scanned_at: Timestamp,
    pub decision: String,
    pub rejection_code: Option<String>,
    pub request_fingerprint: String,
}

impl ScanLog {
    pub fn is_admitted(&self) -> bool {
        self.decision == DECISION_ADMITTED
    }
}

/// Insert payload for a scan log entry.
#[derive(Debug, Clone)]
pub struct NewScanLog {
    pub ticket_id: DbId,
    pub event_id: DbId,
    pub operator_id: Option<DbId>,
    pub device_id: String,
    pub location: String,
    pub scanned_at: Timestamp,
    /// `None` for an admission, `Some(code)` for a reject.
    pub rejection_code: Option<String>,
    pub request_fingerprint: String,
}

impl NewScanLog {
    pub fn decision(&self) -> &'static str {
        if self.rejection_code.is_none() {
            DECISION_ADMITTED
        } else {
            DECISION_REJECTED
        }
    }
}

/// Filters for the scan history query.
#[derive(Debug, Default, Deserialize)]
pub struct HistoryQuery {
    /// Maximum number of results. Defaults to 50, capped at 200.
    pub limit: Option<i64>,
    /// Number of results to skip. Defaults to 0.
    pub offset: Option<i64>,
    pub start_date: Option<Timestamp>,
    pub end_date: Option<Timestamp>,
    pub location: Option<String>,
}

/// One page of scan history plus the unpaginated total.
#[derive(Debug, Serialize)]
pub struct ScanLogPage {
    pub items: Vec<ScanLog>,
    pub total: i64,
}
