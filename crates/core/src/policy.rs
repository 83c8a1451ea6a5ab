//! Scan admission policy — pure logic, no database access.
//!
//! [`evaluate`] encodes every business rule that decides whether a scan
//! admits the ticket holder. Rules run in a fixed order and the first
//! failing rule wins, so a given input always produces the same decision
//! and the same code. The engine supplies all inputs (ticket, event, scan
//! history, in-transaction capacity count); nothing here touches I/O.

use chrono::Timelike;

use crate::codes::RejectCode;
use crate::qr::{QrDecodeError, QrPayload};
use crate::state::{EventState, TicketState};
use crate::types::{DbId, Timestamp};

/// The slice of a ticket row the policy needs.
#[derive(Debug, Clone)]
pub struct TicketFacts {
    pub id: DbId,
    pub event_id: DbId,
    pub status: TicketState,
    pub max_scans: i32,
}

/// Daily scan window in minutes-of-day, inclusive on both ends.
///
/// A missing bound is open: `start_minute` defaults to the start of day and
/// `end_minute` to the end of day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    pub start_minute: Option<i16>,
    pub end_minute: Option<i16>,
}

impl TimeWindow {
    pub fn contains(self, minute_of_day: i16) -> bool {
        let start = self.start_minute.unwrap_or(0);
        let end = self.end_minute.unwrap_or(24 * 60 - 1);
        (start..=end).contains(&minute_of_day)
    }
}

/// Minute-of-day of an instant, in UTC.
pub fn minute_of_day(at: Timestamp) -> i16 {
    (at.hour() * 60 + at.minute()) as i16
}

/// The slice of an event row the policy needs.
#[derive(Debug, Clone)]
pub struct EventFacts {
    pub id: DbId,
    pub status: EventState,
    pub starts_at: Timestamp,
    pub ends_at: Timestamp,
    pub max_attendees: Option<i32>,
    pub allowed_scan_zones: Option<Vec<String>>,
    pub time_window: Option<TimeWindow>,
}

/// Who/where/when of a scan attempt.
#[derive(Debug, Clone)]
pub struct ScanContext {
    pub device_id: String,
    pub location: String,
    pub operator_id: Option<DbId>,
    pub checkpoint_id: Option<String>,
    pub timestamp: Timestamp,
}

/// Per-ticket admission history, read inside the validation transaction.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScanHistory {
    pub admitted_count: i64,
    pub last_admitted_at: Option<Timestamp>,
}

/// Outcome of decoding the ticket's stored QR payload, if one exists.
#[derive(Debug, Clone)]
pub enum QrCheck {
    Decoded(QrPayload),
    Unreadable(QrDecodeError),
}

/// Tunable policy knobs, sourced from configuration.
#[derive(Debug, Clone)]
pub struct PolicyConfig {
    /// Minimum gap between two admissions of the same ticket.
    pub min_scan_interval: chrono::Duration,
    /// QR payload versions this deployment accepts.
    pub supported_qr_versions: Vec<String>,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            min_scan_interval: chrono::Duration::seconds(30),
            supported_qr_versions: vec!["v1".to_string()],
        }
    }
}

/// Admission decision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    /// Entry granted. `restrictions` lists the constraints that applied and
    /// remain relevant to the operator (scan window, zone, remaining scans).
    Admit { restrictions: Vec<String> },
    /// Entry denied with a stable wire code.
    Reject { code: RejectCode, reason: String },
}

impl Decision {
    pub fn is_admit(&self) -> bool {
        matches!(self, Decision::Admit { .. })
    }
}

fn reject(code: RejectCode, reason: impl Into<String>) -> Decision {
    Decision::Reject {
        code,
        reason: reason.into(),
    }
}

/// Evaluate the admission policy for one scan attempt.
///
/// `event_admitted_count` is the number of admitted scans for the whole
/// event, read within the same transaction as the consume so the capacity
/// rule observes a consistent count.
#[allow(clippy::too_many_arguments)]
pub fn evaluate(
    ticket: &TicketFacts,
    event: &EventFacts,
    ctx: &ScanContext,
    now: Timestamp,
    history: ScanHistory,
    qr: Option<&QrCheck>,
    event_admitted_count: i64,
    config: &PolicyConfig,
) -> Decision {
    // Event lifecycle. Cancelled gets its own code and is checked before the
    // generic not-active rule so callers can distinguish the two.
    if event.status == EventState::Cancelled {
        return reject(RejectCode::EventCancelled, "event has been cancelled");
    }
    if event.status != EventState::Active {
        return reject(
            RejectCode::EventNotActive,
            format!("event is {}", event.status.as_str()),
        );
    }

    // Event time bounds, inclusive at both edges.
    if now < event.starts_at {
        return reject(RejectCode::EventNotStarted, "event has not started yet");
    }
    if now > event.ends_at {
        return reject(RejectCode::EventEnded, "event has already ended");
    }

    // Daily scan window, if the event restricts one.
    if let Some(window) = event.time_window {
        if !window.contains(minute_of_day(now)) {
            return reject(
                RejectCode::TimeRestriction,
                "scanning is outside the allowed time window",
            );
        }
    }

    // Zone restriction, if the event names allowed zones.
    if let Some(zones) = &event.allowed_scan_zones {
        if !zones.is_empty() && !zones.iter().any(|z| z == &ctx.location) {
            return reject(
                RejectCode::ZoneRestriction,
                format!("location '{}' is not an allowed scan zone", ctx.location),
            );
        }
    }

    // Ticket lifecycle: every non-active state has its own code. A used
    // ticket with recorded admissions answers as already-validated so a
    // repeated scan gets a deterministic conflict; plain TICKET_USED is
    // reserved for tickets consumed outside the scan path.
    match ticket.status {
        TicketState::Active => {}
        TicketState::Used if history.admitted_count > 0 => {
            return reject(
                RejectCode::TicketAlreadyValidated,
                "ticket was already validated",
            )
        }
        TicketState::Used => return reject(RejectCode::TicketUsed, "ticket already used"),
        TicketState::Cancelled => {
            return reject(RejectCode::TicketCancelled, "ticket has been cancelled")
        }
        TicketState::Expired => return reject(RejectCode::TicketExpired, "ticket has expired"),
        TicketState::Void => return reject(RejectCode::TicketVoid, "ticket has been voided"),
    }

    // QR payload integrity, when the ticket carries one.
    if let Some(check) = qr {
        match check {
            QrCheck::Unreadable(err) => {
                return reject(err.reject_code(), err.to_string());
            }
            QrCheck::Decoded(payload) => {
                if payload.ticket_id != ticket.id || payload.event_id != event.id {
                    return reject(
                        RejectCode::QrTicketMismatch,
                        "QR payload does not match the presented ticket",
                    );
                }
                if !config.supported_qr_versions.contains(&payload.version) {
                    return reject(
                        RejectCode::InvalidQrFormat,
                        format!("unsupported QR payload version '{}'", payload.version),
                    );
                }
            }
        }
    }

    // Per-ticket scan limit.
    if history.admitted_count >= i64::from(ticket.max_scans) {
        return reject(
            RejectCode::ScanLimitReached,
            format!("ticket reached its scan limit of {}", ticket.max_scans),
        );
    }

    // Anti-replay minimum interval between admissions.
    if let Some(last) = history.last_admitted_at {
        if now - last < config.min_scan_interval {
            return reject(
                RejectCode::ScanTooFrequent,
                "ticket was admitted too recently",
            );
        }
    }

    // Event capacity, observed within the enclosing transaction.
    if let Some(max) = event.max_attendees {
        if event_admitted_count >= i64::from(max) {
            return reject(RejectCode::EventFull, "event is at capacity");
        }
    }

    let mut restrictions = Vec::new();
    if let Some(window) = event.time_window {
        restrictions.push(format!(
            "time-window:{}-{}",
            window.start_minute.unwrap_or(0),
            window.end_minute.unwrap_or(24 * 60 - 1),
        ));
    }
    if event.allowed_scan_zones.as_ref().is_some_and(|z| !z.is_empty()) {
        restrictions.push(format!("zone:{}", ctx.location));
    }
    let remaining_after = i64::from(ticket.max_scans) - history.admitted_count - 1;
    if remaining_after > 0 {
        restrictions.push(format!("scans-remaining:{remaining_after}"));
    }

    Decision::Admit { restrictions }
}
