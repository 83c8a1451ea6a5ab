//! Event entity model and DTOs.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use tessera_core::policy::{EventFacts, TimeWindow};
use tessera_core::state::EventState;
use tessera_core::types::{DbId, Timestamp};

/// A row from the `events` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Event {
    pub id: DbId,
    pub title: String,
    pub status_id: i16,
    pub starts_at: Timestamp,
    pub ends_at: Timestamp,
    pub max_attendees: Option<i32>,
    pub allowed_scan_zones: Option<Vec<String>>,
    pub window_start_minute: Option<i16>,
    pub window_end_minute: Option<i16>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Event {
    /// Decode the status id. `None` only if the row predates the enum,
    /// which the migrations make impossible.
    pub fn state(&self) -> Option<EventState> {
        EventState::from_id(self.status_id)
    }

    /// Project the row into the policy evaluator's input shape.
    pub fn facts(&self, state: EventState) -> EventFacts {
        let time_window = if self.window_start_minute.is_some() || self.window_end_minute.is_some()
        {
            Some(TimeWindow {
                start_minute: self.window_start_minute,
                end_minute: self.window_end_minute,
            })
        } else {
            None
        };
        EventFacts {
            id: self.id,
            status: state,
            starts_at: self.starts_at,
            ends_at: self.ends_at,
            max_attendees: self.max_attendees,
            allowed_scan_zones: self.allowed_scan_zones.clone(),
            time_window,
        }
    }
}

/// DTO for creating a draft event.
#[derive(Debug, Deserialize)]
pub struct CreateEvent {
    pub title: String,
    pub starts_at: Timestamp,
    pub ends_at: Timestamp,
    pub max_attendees: Option<i32>,
    pub allowed_scan_zones: Option<Vec<String>>,
    pub window_start_minute: Option<i16>,
    pub window_end_minute: Option<i16>,
}
