//! Ticket entity model and DTOs.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use tessera_core::policy::TicketFacts;
use tessera_core::state::TicketState;
use tessera_core::types::{DbId, Timestamp};

/// A ticket row joined with its owning guest's `event_id`.
///
/// Tickets reference events only through `event_guests`, but nearly every
/// caller needs the event, so repository queries materialize it.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Ticket {
    pub id: DbId,
    pub event_guest_id: DbId,
    pub event_id: DbId,
    pub ticket_code: String,
    #[serde(skip_serializing)]
    pub qr_payload: Option<Vec<u8>>,
    pub status_id: i16,
    pub max_scans: i32,
    pub validated_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Ticket {
    pub fn state(&self) -> Option<TicketState> {
        TicketState::from_id(self.status_id)
    }

    /// Project the row into the policy evaluator's input shape.
    pub fn facts(&self, state: TicketState) -> TicketFacts {
        TicketFacts {
            id: self.id,
            event_id: self.event_id,
            status: state,
            max_scans: self.max_scans,
        }
    }
}

/// DTO for issuing a ticket to a guest.
#[derive(Debug, Deserialize)]
pub struct IssueTicket {
    /// Admissions allowed for this ticket. Defaults to 1.
    pub max_scans: Option<i32>,
}

/// Read-only projection returned by the ticket status query.
#[derive(Debug, Serialize)]
pub struct TicketStatusView {
    pub ticket: Ticket,
    pub status: &'static str,
    pub admitted_count: i64,
    pub last_admitted_at: Option<Timestamp>,
    pub remaining_scans: i64,
    pub can_be_scanned: bool,
}

impl TicketStatusView {
    pub fn build(
        ticket: Ticket,
        state: TicketState,
        admitted_count: i64,
        last_admitted_at: Option<Timestamp>,
    ) -> Self {
        let remaining_scans = (i64::from(ticket.max_scans) - admitted_count).max(0);
        let can_be_scanned = state == TicketState::Active && remaining_scans > 0;
        Self {
            ticket,
            status: state.as_str(),
            admitted_count,
            last_admitted_at,
            remaining_scans,
            can_be_scanned,
        }
    }
}
