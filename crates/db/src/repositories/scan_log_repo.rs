//! Repository for the append-only `scan_logs` table.

use sqlx::{PgExecutor, PgPool};
use tessera_core::types::{DbId, Timestamp};

use crate::models::scan_log::{HistoryQuery, NewScanLog, ScanLog, DECISION_ADMITTED};

/// Column list for `scan_logs` queries.
const COLUMNS: &str = "\
    id, ticket_id, event_id, operator_id, device_id, location, \
    scanned_at, decision, rejection_code, request_fingerprint";

/// Maximum page size for history listing.
const MAX_LIMIT: i64 = 200;

/// Default page size for history listing.
const DEFAULT_LIMIT: i64 = 50;

/// Provides append and read operations for scan logs.
pub struct ScanLogRepo;

impl ScanLogRepo {
    /// Append one scan log entry, returning the generated ID.
    ///
    /// Takes an executor: the engine appends within the validation
    /// transaction, while reject audits after a rolled-back attempt go
    /// straight through the pool.
    pub async fn append<'e>(
        executor: impl PgExecutor<'e>,
        entry: &NewScanLog,
    ) -> Result<DbId, sqlx::Error> {
        sqlx::query_scalar(
            "INSERT INTO scan_logs \
                (ticket_id, event_id, operator_id, device_id, location, \
                 scanned_at, decision, rejection_code, request_fingerprint) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) \
             RETURNING id",
        )
        .bind(entry.ticket_id)
        .bind(entry.event_id)
        .bind(entry.operator_id)
        .bind(&entry.device_id)
        .bind(&entry.location)
        .bind(entry.scanned_at)
        .bind(entry.decision())
        .bind(&entry.rejection_code)
        .bind(&entry.request_fingerprint)
        .fetch_one(executor)
        .await
    }

    /// Count admitted scans for one ticket.
    pub async fn admitted_count_for_ticket<'e>(
        executor: impl PgExecutor<'e>,
        ticket_id: DbId,
    ) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar(
            "SELECT COUNT(*) FROM scan_logs WHERE ticket_id = $1 AND decision = $2",
        )
        .bind(ticket_id)
        .bind(DECISION_ADMITTED)
        .fetch_one(executor)
        .await
    }

    /// The most recent admission instant for one ticket, if any.
    pub async fn last_admitted_at<'e>(
        executor: impl PgExecutor<'e>,
        ticket_id: DbId,
    ) -> Result<Option<Timestamp>, sqlx::Error> {
        sqlx::query_scalar(
            "SELECT MAX(scanned_at) FROM scan_logs WHERE ticket_id = $1 AND decision = $2",
        )
        .bind(ticket_id)
        .bind(DECISION_ADMITTED)
        .fetch_one(executor)
        .await
    }

    /// Count admitted scans across the whole event.
    ///
    /// Must be read within the same transaction as the consume so the
    /// capacity rule observes a consistent count.
    pub async fn admitted_count_for_event<'e>(
        executor: impl PgExecutor<'e>,
        event_id: DbId,
    ) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar(
            "SELECT COUNT(*) FROM scan_logs WHERE event_id = $1 AND decision = $2",
        )
        .bind(event_id)
        .bind(DECISION_ADMITTED)
        .fetch_one(executor)
        .await
    }

    /// List scan history for a ticket, newest first, with optional
    /// date-range and location filters.
    pub async fn history(
        pool: &PgPool,
        ticket_id: DbId,
        params: &HistoryQuery,
    ) -> Result<Vec<ScanLog>, sqlx::Error> {
        let limit = params.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);
        let offset = params.offset.unwrap_or(0).max(0);

        let (where_clause, bind_idx) = Self::history_filter(params);
        let query = format!(
            "SELECT {COLUMNS} FROM scan_logs \
             WHERE ticket_id = $1{where_clause} \
             ORDER BY scanned_at DESC \
             LIMIT ${bind_idx} OFFSET ${}",
            bind_idx + 1,
        );

        let mut q = sqlx::query_as::<_, ScanLog>(&query).bind(ticket_id);
        if let Some(start) = params.start_date {
            q = q.bind(start);
        }
        if let Some(end) = params.end_date {
            q = q.bind(end);
        }
        if let Some(location) = &params.location {
            q = q.bind(location);
        }
        q = q.bind(limit).bind(offset);

        q.fetch_all(pool).await
    }

    /// Unpaginated total for the same filters as [`ScanLogRepo::history`].
    pub async fn count_history(
        pool: &PgPool,
        ticket_id: DbId,
        params: &HistoryQuery,
    ) -> Result<i64, sqlx::Error> {
        let (where_clause, _) = Self::history_filter(params);
        let query = format!("SELECT COUNT(*) FROM scan_logs WHERE ticket_id = $1{where_clause}");

        let mut q = sqlx::query_scalar::<_, i64>(&query).bind(ticket_id);
        if let Some(start) = params.start_date {
            q = q.bind(start);
        }
        if let Some(end) = params.end_date {
            q = q.bind(end);
        }
        if let Some(location) = &params.location {
            q = q.bind(location);
        }

        q.fetch_one(pool).await
    }

    /// Build the optional-filter WHERE fragment and return it with the next
    /// free bind index. `$1` is always the ticket ID.
    fn history_filter(params: &HistoryQuery) -> (String, u32) {
        let mut clause = String::new();
        let mut bind_idx: u32 = 2;

        if params.start_date.is_some() {
            clause.push_str(&format!(" AND scanned_at >= ${bind_idx}"));
            bind_idx += 1;
        }
        if params.end_date.is_some() {
            clause.push_str(&format!(" AND scanned_at <= ${bind_idx}"));
            bind_idx += 1;
        }
        if params.location.is_some() {
            clause.push_str(&format!(" AND location = ${bind_idx}"));
            bind_idx += 1;
        }

        (clause, bind_idx)
    }
}
