//! Stable, wire-visible rejection and error codes.
//!
//! Every reject path in the validation engine maps to exactly one of these
//! codes. Callers match on codes, never on message text, so the set and the
//! string forms here are a compatibility contract.

use serde::{Deserialize, Serialize};

/// Reject/error code vocabulary for scan validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RejectCode {
    TicketNotFound,
    TicketEventMismatch,
    TicketAlreadyValidated,
    TicketUsed,
    TicketCancelled,
    TicketExpired,
    TicketVoid,
    EventNotActive,
    EventNotStarted,
    EventEnded,
    EventCancelled,
    EventFull,
    TimeRestriction,
    ZoneRestriction,
    ScanLimitReached,
    ScanTooFrequent,
    QrTicketMismatch,
    InvalidQrFormat,
    CorruptedQrCode,
    InvalidReference,
    ReplayRace,
    TransientRetryExhausted,
}

/// Coarse classification of a code, used to derive the HTTP status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodeCategory {
    /// A business rule fired; the request itself was well-formed.
    Business,
    /// The payload failed an integrity or tamper check.
    Security,
    /// The referenced ticket or event does not exist.
    NotFound,
    /// Another admission won a race with this one.
    Conflict,
    /// The caller is scanning too fast.
    RateLimited,
    /// A transient failure persisted past the retry budget.
    Transient,
}

impl RejectCode {
    /// The wire form of the code, e.g. `"TICKET_NOT_FOUND"`.
    pub fn as_str(self) -> &'static str {
        match self {
            RejectCode::TicketNotFound => "TICKET_NOT_FOUND",
            RejectCode::TicketEventMismatch => "TICKET_EVENT_MISMATCH",
            RejectCode::TicketAlreadyValidated => "TICKET_ALREADY_VALIDATED",
            RejectCode::TicketUsed => "TICKET_USED",
            RejectCode::TicketCancelled => "TICKET_CANCELLED",
            RejectCode::TicketExpired => "TICKET_EXPIRED",
            RejectCode::TicketVoid => "TICKET_VOID",
            RejectCode::EventNotActive => "EVENT_NOT_ACTIVE",
            RejectCode::EventNotStarted => "EVENT_NOT_STARTED",
            RejectCode::EventEnded => "EVENT_ENDED",
            RejectCode::EventCancelled => "EVENT_CANCELLED",
            RejectCode::EventFull => "EVENT_FULL",
            RejectCode::TimeRestriction => "TIME_RESTRICTION",
            RejectCode::ZoneRestriction => "ZONE_RESTRICTION",
            RejectCode::ScanLimitReached => "SCAN_LIMIT_REACHED",
            RejectCode::ScanTooFrequent => "SCAN_TOO_FREQUENT",
            RejectCode::QrTicketMismatch => "QR_TICKET_MISMATCH",
            RejectCode::InvalidQrFormat => "INVALID_QR_FORMAT",
            RejectCode::CorruptedQrCode => "CORRUPTED_QR_CODE",
            RejectCode::InvalidReference => "INVALID_REFERENCE",
            RejectCode::ReplayRace => "REPLAY_RACE",
            RejectCode::TransientRetryExhausted => "TRANSIENT_RETRY_EXHAUSTED",
        }
    }

    /// Classify the code for HTTP status mapping.
    pub fn category(self) -> CodeCategory {
        match self {
            RejectCode::TicketNotFound => CodeCategory::NotFound,
            RejectCode::TicketAlreadyValidated
            | RejectCode::ReplayRace => CodeCategory::Conflict,
            RejectCode::ScanTooFrequent => CodeCategory::RateLimited,
            RejectCode::QrTicketMismatch
            | RejectCode::InvalidQrFormat
            | RejectCode::CorruptedQrCode => CodeCategory::Security,
            RejectCode::TransientRetryExhausted => CodeCategory::Transient,
            // Everything else is an ordinary business reject.
            _ => CodeCategory::Business,
        }
    }
}

impl std::fmt::Display for RejectCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for RejectCode {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "TICKET_NOT_FOUND" => Ok(RejectCode::TicketNotFound),
            "TICKET_EVENT_MISMATCH" => Ok(RejectCode::TicketEventMismatch),
            "TICKET_ALREADY_VALIDATED" => Ok(RejectCode::TicketAlreadyValidated),
            "TICKET_USED" => Ok(RejectCode::TicketUsed),
            "TICKET_CANCELLED" => Ok(RejectCode::TicketCancelled),
            "TICKET_EXPIRED" => Ok(RejectCode::TicketExpired),
            "TICKET_VOID" => Ok(RejectCode::TicketVoid),
            "EVENT_NOT_ACTIVE" => Ok(RejectCode::EventNotActive),
            "EVENT_NOT_STARTED" => Ok(RejectCode::EventNotStarted),
            "EVENT_ENDED" => Ok(RejectCode::EventEnded),
            "EVENT_CANCELLED" => Ok(RejectCode::EventCancelled),
            "EVENT_FULL" => Ok(RejectCode::EventFull),
            "TIME_RESTRICTION" => Ok(RejectCode::TimeRestriction),
            "ZONE_RESTRICTION" => Ok(RejectCode::ZoneRestriction),
            "SCAN_LIMIT_REACHED" => Ok(RejectCode::ScanLimitReached),
            "SCAN_TOO_FREQUENT" => Ok(RejectCode::ScanTooFrequent),
            "QR_TICKET_MISMATCH" => Ok(RejectCode::QrTicketMismatch),
            "INVALID_QR_FORMAT" => Ok(RejectCode::InvalidQrFormat),
            "CORRUPTED_QR_CODE" => Ok(RejectCode::CorruptedQrCode),
            "INVALID_REFERENCE" => Ok(RejectCode::InvalidReference),
            "REPLAY_RACE" => Ok(RejectCode::ReplayRace),
            "TRANSIENT_RETRY_EXHAUSTED" => Ok(RejectCode::TransientRetryExhausted),
            _ => Err(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    const ALL: &[RejectCode] = &[
        RejectCode::TicketNotFound,
        RejectCode::TicketEventMismatch,
        RejectCode::TicketAlreadyValidated,
        RejectCode::TicketUsed,
        RejectCode::TicketCancelled,
        RejectCode::TicketExpired,
        RejectCode::TicketVoid,
        RejectCode::EventNotActive,
        RejectCode::EventNotStarted,
        RejectCode::EventEnded,
        RejectCode::EventCancelled,
        RejectCode::EventFull,
        RejectCode::TimeRestriction,
        RejectCode::ZoneRestriction,
        RejectCode::ScanLimitReached,
        RejectCode::ScanTooFrequent,
        RejectCode::QrTicketMismatch,
        RejectCode::InvalidQrFormat,
        RejectCode::CorruptedQrCode,
        RejectCode::InvalidReference,
        RejectCode::ReplayRace,
        RejectCode::TransientRetryExhausted,
    ];

    #[test]
    fn as_str_round_trips_through_from_str() {
        for code in ALL {
            assert_eq!(RejectCode::from_str(code.as_str()), Ok(*code));
        }
    }

    #[test]
    fn serde_uses_wire_form() {
        let json = serde_json::to_string(&RejectCode::TicketNotFound).unwrap();
        assert_eq!(json, "\"TICKET_NOT_FOUND\"");
    }

    #[test]
    fn unknown_string_fails_to_parse() {
        assert!(RejectCode::from_str("NO_SUCH_CODE").is_err());
    }

    #[test]
    fn conflict_codes_classify_as_conflict() {
        assert_eq!(
            RejectCode::TicketAlreadyValidated.category(),
            CodeCategory::Conflict,
        );
        assert_eq!(RejectCode::ReplayRace.category(), CodeCategory::Conflict);
    }

    #[test]
    fn rate_limit_code_classifies_as_rate_limited() {
        assert_eq!(
            RejectCode::ScanTooFrequent.category(),
            CodeCategory::RateLimited,
        );
    }

    #[test]
    fn qr_codes_classify_as_security() {
        assert_eq!(RejectCode::QrTicketMismatch.category(), CodeCategory::Security);
        assert_eq!(RejectCode::InvalidQrFormat.category(), CodeCategory::Security);
        assert_eq!(RejectCode::CorruptedQrCode.category(), CodeCategory::Security);
    }
}
