//! Event guest entity model and DTOs.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use tessera_core::types::{DbId, Timestamp};

/// A row from the `event_guests` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct EventGuest {
    pub id: DbId,
    pub event_id: DbId,
    pub guest_name: String,
    pub invitation_code: String,
    pub created_at: Timestamp,
}

/// DTO for registering a guest on an event.
#[derive(Debug, Deserialize)]
pub struct CreateEventGuest {
    pub guest_name: String,
    pub invitation_code: String,
}
