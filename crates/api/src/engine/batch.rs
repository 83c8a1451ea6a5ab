//! Batch validation coordinator.
//!
//! Items are processed independently: each gets its own engine call (and
//! therefore its own transaction), so one item's failure never rolls back a
//! sibling. Results come back in input order.

use serde::Serialize;
use tessera_core::types::{DbId, Timestamp};

use super::{ScanDecision, ScanOutcome, ScanRequest, ValidationEngine};

/// Per-item result, positionally matching the request's `tickets` array.
#[derive(Debug, Serialize)]
pub struct BatchItemResult {
    pub index: usize,
    pub ticket_id: DbId,
    pub event_id: DbId,
    pub admitted: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    pub scanned_at: Timestamp,
}

/// Aggregate counters over a processed batch.
#[derive(Debug, Serialize)]
pub struct BatchSummary {
    pub total: usize,
    pub admitted: usize,
    pub rejected: usize,
    pub success_rate: f64,
}

/// Full batch response payload.
#[derive(Debug, Serialize)]
pub struct BatchOutcome {
    pub results: Vec<BatchItemResult>,
    pub summary: BatchSummary,
}

/// Process up to the configured maximum of validation requests.
///
/// Never fails as a whole: an item whose engine call errors out becomes a
/// rejected item result, and its siblings proceed.
pub async fn process(engine: &ValidationEngine, items: Vec<ScanRequest>) -> BatchOutcome {
    let total = items.len();
    let mut results = Vec::with_capacity(total);
    let mut admitted = 0usize;

    for (index, item) in items.into_iter().enumerate() {
        let result = match engine.validate(&item).await {
            Ok(outcome) => item_result(index, outcome),
            Err(err) => {
                tracing::error!(
                    index,
                    ticket_id = item.ticket_id,
                    error = %err,
                    "Batch item failed outside the reject vocabulary",
                );
                BatchItemResult {
                    index,
                    ticket_id: item.ticket_id,
                    event_id: item.event_id,
                    admitted: false,
                    code: Some("INTERNAL_ERROR".to_string()),
                    reason: Some("item failed internally".to_string()),
                    scanned_at: chrono::Utc::now(),
                }
            }
        };
        if result.admitted {
            admitted += 1;
        }
        results.push(result);
    }

    let rejected = total - admitted;
    let success_rate = if total == 0 {
        0.0
    } else {
        admitted as f64 / total as f64
    };

    BatchOutcome {
        results,
        summary: BatchSummary {
            total,
            admitted,
            rejected,
            success_rate,
        },
    }
}

fn item_result(index: usize, outcome: ScanOutcome) -> BatchItemResult {
    match outcome.decision {
        ScanDecision::Admitted { .. } => BatchItemResult {
            index,
            ticket_id: outcome.ticket_id,
            event_id: outcome.event_id,
            admitted: true,
            code: None,
            reason: None,
            scanned_at: outcome.scanned_at,
        },
        ScanDecision::Rejected { code, reason } => BatchItemResult {
            index,
            ticket_id: outcome.ticket_id,
            event_id: outcome.event_id,
            admitted: false,
            code: Some(code.as_str().to_string()),
            reason: Some(reason),
            scanned_at: outcome.scanned_at,
        },
    }
}
