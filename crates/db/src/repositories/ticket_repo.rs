//! Repository for the `tickets` table.
//!
//! All reads join `event_guests` to materialize the owning `event_id`.
//! The two writes that gate admission — [`TicketRepo::find_for_update`] and
//! [`TicketRepo::mark_consumed`] — are the serialization point for
//! concurrent validations of the same ticket.

use sqlx::{PgConnection, PgExecutor, PgPool};
use tessera_core::state::TicketState;
use tessera_core::types::{DbId, Timestamp};

use crate::models::ticket::Ticket;

/// Column list for joined `tickets` queries (`t` = tickets, `g` = event_guests).
const COLUMNS: &str = "\
    t.id, t.event_guest_id, g.event_id, t.ticket_code, t.qr_payload, \
    t.status_id, t.max_scans, t.validated_at, t.created_at, t.updated_at";

/// Provides read/write operations for tickets.
pub struct TicketRepo;

impl TicketRepo {
    /// Issue a ticket to a guest.
    ///
    /// `ticket_code` is globally unique; a duplicate surfaces as a
    /// unique-violation database error. `qr_payload` is immutable after this
    /// insert.
    pub async fn issue(
        pool: &PgPool,
        event_guest_id: DbId,
        ticket_code: &str,
        qr_payload: Option<&[u8]>,
        max_scans: i32,
    ) -> Result<Ticket, sqlx::Error> {
        let id: DbId = sqlx::query_scalar(
            "INSERT INTO tickets (event_guest_id, ticket_code, qr_payload, status_id, max_scans) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING id",
        )
        .bind(event_guest_id)
        .bind(ticket_code)
        .bind(qr_payload)
        .bind(TicketState::Active.id())
        .bind(max_scans)
        .fetch_one(pool)
        .await?;

        Self::find_by_id(pool, id)
            .await?
            .ok_or(sqlx::Error::RowNotFound)
    }

    /// Store the QR payload generated at issuance.
    ///
    /// Conditional on the column being NULL: the payload is immutable once
    /// set. Returns `true` iff the payload was written.
    pub async fn attach_qr_payload(
        pool: &PgPool,
        ticket_id: DbId,
        payload: &[u8],
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE tickets SET qr_payload = $2, updated_at = NOW() \
             WHERE id = $1 AND qr_payload IS NULL",
        )
        .bind(ticket_id)
        .bind(payload)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() == 1)
    }

    /// Find a ticket by its ID.
    pub async fn find_by_id<'e>(
        executor: impl PgExecutor<'e>,
        id: DbId,
    ) -> Result<Option<Ticket>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM tickets t \
             JOIN event_guests g ON g.id = t.event_guest_id \
             WHERE t.id = $1"
        );
        sqlx::query_as::<_, Ticket>(&query)
            .bind(id)
            .fetch_optional(executor)
            .await
    }

    /// Find a ticket by its unique code.
    pub async fn find_by_code(pool: &PgPool, code: &str) -> Result<Option<Ticket>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM tickets t \
             JOIN event_guests g ON g.id = t.event_guest_id \
             WHERE t.ticket_code = $1"
        );
        sqlx::query_as::<_, Ticket>(&query)
            .bind(code)
            .fetch_optional(pool)
            .await
    }

    /// Lock the ticket row for the duration of the enclosing transaction.
    ///
    /// Returns the joined row so the caller can cross-check the owning
    /// event. Only the ticket row is locked; events stay read-only.
    pub async fn find_for_update(
        conn: &mut PgConnection,
        ticket_id: DbId,
    ) -> Result<Option<Ticket>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM tickets t \
             JOIN event_guests g ON g.id = t.event_guest_id \
             WHERE t.id = $1 \
             FOR UPDATE OF t"
        );
        sqlx::query_as::<_, Ticket>(&query)
            .bind(ticket_id)
            .fetch_optional(conn)
            .await
    }

    /// Conditionally consume the ticket: `active -> used`, stamping
    /// `validated_at`.
    ///
    /// Returns `true` iff exactly one row changed. The condition holds even
    /// under the row lock so non-locking writers (admin tooling) cannot
    /// produce a double admission.
    pub async fn mark_consumed(
        conn: &mut PgConnection,
        ticket_id: DbId,
        now: Timestamp,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE tickets \
             SET status_id = $2, validated_at = $3, updated_at = NOW() \
             WHERE id = $1 AND status_id = $4",
        )
        .bind(ticket_id)
        .bind(TicketState::Used.id())
        .bind(now)
        .bind(TicketState::Active.id())
        .execute(conn)
        .await?;
        Ok(result.rows_affected() == 1)
    }

    /// Conditional status transition for admin tooling.
    ///
    /// Returns `true` iff the ticket was in `from` and moved to `to`. The
    /// allowed transition set is enforced by the caller against the state
    /// machine; this is just the CAS.
    pub async fn set_status(
        pool: &PgPool,
        ticket_id: DbId,
        from: TicketState,
        to: TicketState,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE tickets SET status_id = $2, updated_at = NOW() \
             WHERE id = $1 AND status_id = $3",
        )
        .bind(ticket_id)
        .bind(to.id())
        .bind(from.id())
        .execute(pool)
        .await?;
        Ok(result.rows_affected() == 1)
    }
}
