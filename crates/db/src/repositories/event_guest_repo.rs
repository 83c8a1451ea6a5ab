//! Repository for the `event_guests` table.

use sqlx::PgPool;
use tessera_core::types::DbId;

use crate::models::event_guest::{CreateEventGuest, EventGuest};

/// Column list for `event_guests` queries.
const COLUMNS: &str = "id, event_id, guest_name, invitation_code, created_at";

/// Provides read/write operations for event guests.
pub struct EventGuestRepo;

impl EventGuestRepo {
    /// Register a guest on an event.
    ///
    /// The invitation code is unique per event; a duplicate surfaces as a
    /// unique-violation database error.
    pub async fn create(
        pool: &PgPool,
        event_id: DbId,
        input: &CreateEventGuest,
    ) -> Result<EventGuest, sqlx::Error> {
        let query = format!(
            "INSERT INTO event_guests (event_id, guest_name, invitation_code) \
             VALUES ($1, $2, $3) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, EventGuest>(&query)
            .bind(event_id)
            .bind(&input.guest_name)
            .bind(&input.invitation_code)
            .fetch_one(pool)
            .await
    }

    /// Find a guest by its ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<EventGuest>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM event_guests WHERE id = $1");
        sqlx::query_as::<_, EventGuest>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }
}
