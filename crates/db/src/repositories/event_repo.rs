//! Repository for the `events` table.

use sqlx::{PgExecutor, PgPool};
use tessera_core::state::EventState;
use tessera_core::types::DbId;

use crate::models::event::{CreateEvent, Event};

/// Column list for `events` queries.
const COLUMNS: &str = "\
    id, title, status_id, starts_at, ends_at, max_attendees, \
    allowed_scan_zones, window_start_minute, window_end_minute, \
    created_at, updated_at";

/// Provides read/write operations for events.
pub struct EventRepo;

impl EventRepo {
    /// Insert a new draft event.
    pub async fn create(pool: &PgPool, input: &CreateEvent) -> Result<Event, sqlx::Error> {
        let query = format!(
            "INSERT INTO events \
                (title, status_id, starts_at, ends_at, max_attendees, \
                 allowed_scan_zones, window_start_minute, window_end_minute) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Event>(&query)
            .bind(&input.title)
            .bind(EventState::Draft.id())
            .bind(input.starts_at)
            .bind(input.ends_at)
            .bind(input.max_attendees)
            .bind(&input.allowed_scan_zones)
            .bind(input.window_start_minute)
            .bind(input.window_end_minute)
            .fetch_one(pool)
            .await
    }

    /// Find an event by its ID. Takes an executor so the engine can read
    /// within the validation transaction.
    pub async fn find_by_id<'e>(
        executor: impl PgExecutor<'e>,
        id: DbId,
    ) -> Result<Option<Event>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM events WHERE id = $1");
        sqlx::query_as::<_, Event>(&query)
            .bind(id)
            .fetch_optional(executor)
            .await
    }

    /// Publish a draft event. Conditional on the current status so a repeat
    /// publish (or publishing a cancelled event) is a no-op.
    ///
    /// Returns `true` iff the event moved from draft to active.
    pub async fn publish(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE events SET status_id = $2, updated_at = NOW() \
             WHERE id = $1 AND status_id = $3",
        )
        .bind(id)
        .bind(EventState::Active.id())
        .bind(EventState::Draft.id())
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Move an event to a terminal state (ended or cancelled).
    pub async fn set_status(
        pool: &PgPool,
        id: DbId,
        state: EventState,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE events SET status_id = $2, updated_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .bind(state.id())
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}
