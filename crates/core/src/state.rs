//! Lifecycle states for events and tickets.
//!
//! Variant discriminants match the seed order (1-based) of the
//! `event_statuses` / `ticket_statuses` lookup tables, so the db layer can
//! bind them directly as SMALLINT status ids.

use serde::{Deserialize, Serialize};

/// Event lifecycle. Created in `Draft`; `Active` on publish; `Ended` and
/// `Cancelled` are terminal.
#[repr(i16)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventState {
    Draft = 1,
    Active = 2,
    Ended = 3,
    Cancelled = 4,
}

/// Ticket lifecycle. Transitions are monotonic out of `Active`; everything
/// after `Active` is terminal except the admin-only move to `Void`.
#[repr(i16)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TicketState {
    Active = 1,
    Used = 2,
    Cancelled = 3,
    Expired = 4,
    Void = 5,
}

impl EventState {
    /// Database status id.
    pub fn id(self) -> i16 {
        self as i16
    }

    pub fn from_id(id: i16) -> Option<Self> {
        match id {
            1 => Some(EventState::Draft),
            2 => Some(EventState::Active),
            3 => Some(EventState::Ended),
            4 => Some(EventState::Cancelled),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            EventState::Draft => "draft",
            EventState::Active => "active",
            EventState::Ended => "ended",
            EventState::Cancelled => "cancelled",
        }
    }
}

impl TicketState {
    /// Database status id.
    pub fn id(self) -> i16 {
        self as i16
    }

    pub fn from_id(id: i16) -> Option<Self> {
        match id {
            1 => Some(TicketState::Active),
            2 => Some(TicketState::Used),
            3 => Some(TicketState::Cancelled),
            4 => Some(TicketState::Expired),
            5 => Some(TicketState::Void),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TicketState::Active => "active",
            TicketState::Used => "used",
            TicketState::Cancelled => "cancelled",
            TicketState::Expired => "expired",
            TicketState::Void => "void",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "active" => Some(TicketState::Active),
            "used" => Some(TicketState::Used),
            "cancelled" => Some(TicketState::Cancelled),
            "expired" => Some(TicketState::Expired),
            "void" => Some(TicketState::Void),
            _ => None,
        }
    }

    /// Whether a scan can ever admit a ticket in this state.
    pub fn is_terminal(self) -> bool {
        !matches!(self, TicketState::Active)
    }

    /// Whether an admin transition from `self` to `target` is allowed.
    ///
    /// Active tickets may be cancelled, expired, or voided. Terminal tickets
    /// accept only the admin-only move to void.
    pub fn admin_transition_allowed(self, target: TicketState) -> bool {
        match (self, target) {
            (TicketState::Active, TicketState::Cancelled)
            | (TicketState::Active, TicketState::Expired)
            | (TicketState::Active, TicketState::Void) => true,
            (TicketState::Used, TicketState::Void)
            | (TicketState::Cancelled, TicketState::Void)
            | (TicketState::Expired, TicketState::Void) => true,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_ids_round_trip() {
        for state in [
            EventState::Draft,
            EventState::Active,
            EventState::Ended,
            EventState::Cancelled,
        ] {
            assert_eq!(EventState::from_id(state.id()), Some(state));
        }
        assert_eq!(EventState::from_id(0), None);
    }

    #[test]
    fn ticket_ids_round_trip() {
        for state in [
            TicketState::Active,
            TicketState::Used,
            TicketState::Cancelled,
            TicketState::Expired,
            TicketState::Void,
        ] {
            assert_eq!(TicketState::from_id(state.id()), Some(state));
        }
        assert_eq!(TicketState::from_id(99), None);
    }

    #[test]
    fn only_active_is_scannable() {
        assert!(!TicketState::Active.is_terminal());
        assert!(TicketState::Used.is_terminal());
        assert!(TicketState::Cancelled.is_terminal());
        assert!(TicketState::Expired.is_terminal());
        assert!(TicketState::Void.is_terminal());
    }

    #[test]
    fn active_can_be_cancelled_expired_or_voided() {
        assert!(TicketState::Active.admin_transition_allowed(TicketState::Cancelled));
        assert!(TicketState::Active.admin_transition_allowed(TicketState::Expired));
        assert!(TicketState::Active.admin_transition_allowed(TicketState::Void));
    }

    #[test]
    fn terminal_states_only_allow_void() {
        assert!(TicketState::Used.admin_transition_allowed(TicketState::Void));
        assert!(!TicketState::Used.admin_transition_allowed(TicketState::Active));
        assert!(!TicketState::Used.admin_transition_allowed(TicketState::Cancelled));
        assert!(!TicketState::Cancelled.admin_transition_allowed(TicketState::Active));
        assert!(!TicketState::Void.admin_transition_allowed(TicketState::Active));
    }

    #[test]
    fn used_to_used_is_not_a_transition() {
        assert!(!TicketState::Used.admin_transition_allowed(TicketState::Used));
    }

    #[test]
    fn wire_form_parses_back() {
        for state in [
            TicketState::Active,
            TicketState::Used,
            TicketState::Cancelled,
            TicketState::Expired,
            TicketState::Void,
        ] {
            assert_eq!(TicketState::parse(state.as_str()), Some(state));
        }
        assert_eq!(TicketState::parse("unknown"), None);
    }
}
