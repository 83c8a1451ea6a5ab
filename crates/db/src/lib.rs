//! Persistence layer: connection pool, migrations, and repositories.
//!
//! Repositories expose typed operations over the `events`, `event_guests`,
//! `tickets`, and `scan_logs` tables. Operations that must run inside the
//! validation transaction take an executor so callers can pass `&mut *tx`.

use sqlx::postgres::PgPoolOptions;
use sqlx::Executor;

pub mod models;
pub mod repositories;

pub type DbPool = sqlx::PgPool;

/// Create a connection pool from a database URL.
///
/// `statement_timeout_ms` is applied to every pooled connection so a single
/// contended statement cannot hold a ticket row lock past its budget.
pub async fn create_pool(
    database_url: &str,
    statement_timeout_ms: u64,
) -> Result<DbPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(20)
        .after_connect(move |conn, _meta| {
            Box::pin(async move {
                conn.execute(format!("SET statement_timeout = {statement_timeout_ms}").as_str())
                    .await?;
                Ok(())
            })
        })
        .connect(database_url)
        .await
}

/// Verify the database is reachable.
pub async fn health_check(pool: &DbPool) -> Result<(), sqlx::Error> {
    sqlx::query_scalar::<_, i32>("SELECT 1").fetch_one(pool).await?;
    Ok(())
}

/// Apply pending migrations from `crates/db/migrations`.
pub async fn run_migrations(pool: &DbPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("./migrations").run(pool).await
}

/// Coarse classification of database errors.
///
/// Drives the engine's failure mapping: unique violations on the scan log
/// surface as replay races, foreign-key violations as invalid references,
/// and transient failures are retried with backoff.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DbErrorKind {
    /// Serialization failure, deadlock, or a lost connection. Retryable.
    Transient,
    UniqueViolation,
    ForeignKeyViolation,
    NotFound,
    Other,
}

/// Classify a sqlx error by SQLSTATE and error shape.
pub fn error_kind(err: &sqlx::Error) -> DbErrorKind {
    match err {
        sqlx::Error::RowNotFound => DbErrorKind::NotFound,
        sqlx::Error::Database(db_err) => match db_err.code().as_deref() {
            // unique_violation
            Some("23505") => DbErrorKind::UniqueViolation,
            // foreign_key_violation
            Some("23503") => DbErrorKind::ForeignKeyViolation,
            // serialization_failure, deadlock_detected
            Some("40001") | Some("40P01") => DbErrorKind::Transient,
            _ => DbErrorKind::Other,
        },
        sqlx::Error::Io(_) | sqlx::Error::PoolTimedOut => DbErrorKind::Transient,
        _ => DbErrorKind::Other,
    }
}
