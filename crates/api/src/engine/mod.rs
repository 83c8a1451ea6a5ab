//! The scan validation engine.
//!
//! One call to [`ValidationEngine::validate`] is one admission decision:
//! rate-limit pre-check, then a single transaction that locks the ticket
//! row, evaluates the policy, conditionally consumes the ticket, and appends
//! the audit log entry. Concurrent validations of the same ticket serialize
//! on the row lock; the conditional consume is the final gate against
//! double admission even for writers that bypass the lock.

pub mod batch;

use std::sync::Arc;

use rand::Rng;
use sqlx::PgPool;
use tessera_core::clock::Clock;
use tessera_core::codes::RejectCode;
use tessera_core::fingerprint::scan_fingerprint;
use tessera_core::policy::{
    self, Decision, PolicyConfig, QrCheck, ScanContext, ScanHistory,
};
use tessera_core::qr;
use tessera_core::ratelimit::RateLimiter;
use tessera_core::state::TicketState;
use tessera_core::types::{DbId, Timestamp};
use tessera_db::models::scan_log::NewScanLog;
use tessera_db::repositories::{EventRepo, ScanLogRepo, TicketRepo};
use tessera_db::DbErrorKind;

/// Transaction attempts per validation: the first try plus three retries.
const MAX_ATTEMPTS: u32 = 4;

/// Base backoff before each retry; a random jitter of up to the same
/// amount is added on top.
const BACKOFF_MS: [u64; 3] = [2, 8, 32];

/// One validation request, already resolved to identifiers.
#[derive(Debug, Clone)]
pub struct ScanRequest {
    pub ticket_id: DbId,
    pub event_id: DbId,
    pub ctx: ScanContext,
}

/// What the engine decided for one scan attempt.
#[derive(Debug, Clone)]
pub enum ScanDecision {
    Admitted {
        scan_log_id: DbId,
        restrictions: Vec<String>,
    },
    Rejected {
        code: RejectCode,
        reason: String,
    },
}

/// Engine output: the decision plus the identifiers it applies to.
#[derive(Debug, Clone)]
pub struct ScanOutcome {
    pub ticket_id: DbId,
    pub event_id: DbId,
    pub scanned_at: Timestamp,
    pub decision: ScanDecision,
}

impl ScanOutcome {
    pub fn is_admitted(&self) -> bool {
        matches!(self.decision, ScanDecision::Admitted { .. })
    }

    pub fn reject_code(&self) -> Option<RejectCode> {
        match &self.decision {
            ScanDecision::Rejected { code, .. } => Some(*code),
            ScanDecision::Admitted { .. } => None,
        }
    }
}

/// Failures the engine cannot express as a reject code.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error(transparent)]
    Db(#[from] sqlx::Error),

    /// A row decoded into a state the enums do not know. Indicates data
    /// written outside the application.
    #[error("corrupt row: {0}")]
    Corrupt(String),
}

/// Orchestrates scan validation against the store.
pub struct ValidationEngine {
    pool: PgPool,
    limiter: Arc<RateLimiter>,
    clock: Arc<dyn Clock>,
    policy: PolicyConfig,
}

impl ValidationEngine {
    pub fn new(
        pool: PgPool,
        limiter: Arc<RateLimiter>,
        clock: Arc<dyn Clock>,
        policy: PolicyConfig,
    ) -> Self {
        Self {
            pool,
            limiter,
            clock,
            policy,
        }
    }

    /// Validate one scan attempt.
    ///
    /// Business rejects come back as `Ok` with a [`ScanDecision::Rejected`];
    /// `Err` is reserved for failures with no stable wire code.
    pub async fn validate(&self, req: &ScanRequest) -> Result<ScanOutcome, EngineError> {
        let now = self.clock.now();

        // Burst throttle before any database work.
        if !self
            .limiter
            .check_scan(req.ticket_id, &req.ctx.device_id, req.ctx.operator_id, now)
        {
            tracing::debug!(
                ticket_id = req.ticket_id,
                device_id = %req.ctx.device_id,
                "Scan throttled before transaction",
            );
            return Ok(rejected(
                req,
                now,
                RejectCode::ScanTooFrequent,
                "scan rate limit exceeded",
            ));
        }

        let fingerprint = scan_fingerprint(
            req.ticket_id,
            req.event_id,
            &req.ctx.device_id,
            &req.ctx.location,
            req.ctx.timestamp,
        );

        let mut attempt: u32 = 0;
        loop {
            match self.attempt(req, now, &fingerprint).await {
                Ok(outcome) => return Ok(outcome),
                Err(EngineError::Db(err)) => match tessera_db::error_kind(&err) {
                    DbErrorKind::Transient if attempt + 1 < MAX_ATTEMPTS => {
                        let base = BACKOFF_MS[attempt as usize];
                        let jitter = rand::rng().random_range(0..=base);
                        tracing::warn!(
                            ticket_id = req.ticket_id,
                            attempt,
                            delay_ms = base + jitter,
                            error = %err,
                            "Transient store failure, retrying validation",
                        );
                        tokio::time::sleep(std::time::Duration::from_millis(base + jitter)).await;
                        attempt += 1;
                    }
                    DbErrorKind::Transient => {
                        tracing::error!(
                            ticket_id = req.ticket_id,
                            error = %err,
                            "Transient store failure persisted past retry budget",
                        );
                        return Ok(rejected(
                            req,
                            now,
                            RejectCode::TransientRetryExhausted,
                            "temporary failure, please retry",
                        ));
                    }
                    // A concurrent writer slipped a conflicting scan-log row in.
                    DbErrorKind::UniqueViolation => {
                        return Ok(rejected(req, now, RejectCode::ReplayRace, "concurrent scan"));
                    }
                    DbErrorKind::ForeignKeyViolation => {
                        return Ok(rejected(
                            req,
                            now,
                            RejectCode::InvalidReference,
                            "request references an unknown entity",
                        ));
                    }
                    _ => return Err(EngineError::Db(err)),
                },
                Err(other) => return Err(other),
            }
        }
    }

    /// Resolve a ticket code, then run the normal validation path against
    /// the ticket's own event.
    pub async fn validate_by_code(
        &self,
        ticket_code: &str,
        ctx: ScanContext,
    ) -> Result<ScanOutcome, EngineError> {
        let now = self.clock.now();
        let Some(ticket) = TicketRepo::find_by_code(&self.pool, ticket_code).await? else {
            return Ok(ScanOutcome {
                ticket_id: 0,
                event_id: 0,
                scanned_at: now,
                decision: ScanDecision::Rejected {
                    code: RejectCode::TicketNotFound,
                    reason: "unknown ticket code".to_string(),
                },
            });
        };
        let req = ScanRequest {
            ticket_id: ticket.id,
            event_id: ticket.event_id,
            ctx,
        };
        self.validate(&req).await
    }

    /// One transactional attempt.
    async fn attempt(
        &self,
        req: &ScanRequest,
        now: Timestamp,
        fingerprint: &str,
    ) -> Result<ScanOutcome, EngineError> {
        let mut tx = self.pool.begin().await.map_err(EngineError::Db)?;

        // SERIALIZABLE covers what the row lock cannot: concurrent
        // admissions of *different* tickets racing on an event's capacity
        // count. The loser fails with a serialization error, retries, and
        // observes the winner's admission.
        sqlx::query("SET TRANSACTION ISOLATION LEVEL SERIALIZABLE")
            .execute(&mut *tx)
            .await
            .map_err(EngineError::Db)?;

        // Lock the ticket row: all decisions for this ticket serialize here.
        let Some(ticket) = TicketRepo::find_for_update(&mut tx, req.ticket_id)
            .await
            .map_err(EngineError::Db)?
        else {
            // Unknown ticket: nothing to audit against, nothing held.
            tx.rollback().await.map_err(EngineError::Db)?;
            return Ok(rejected(req, now, RejectCode::TicketNotFound, "unknown ticket"));
        };

        let log_base = NewScanLog {
            ticket_id: ticket.id,
            event_id: ticket.event_id,
            operator_id: req.ctx.operator_id,
            device_id: req.ctx.device_id.clone(),
            location: req.ctx.location.clone(),
            scanned_at: now,
            rejection_code: None,
            request_fingerprint: fingerprint.to_string(),
        };

        // The scanner claimed a different event than the ticket belongs to.
        if ticket.event_id != req.event_id {
            let code = RejectCode::TicketEventMismatch;
            Self::append_reject(&mut tx, &log_base, code).await?;
            tx.commit().await.map_err(EngineError::Db)?;
            return Ok(rejected(
                req,
                now,
                code,
                "ticket does not belong to the requested event",
            ));
        }

        let event = EventRepo::find_by_id(&mut *tx, ticket.event_id)
            .await
            .map_err(EngineError::Db)?
            .ok_or_else(|| {
                EngineError::Corrupt(format!("ticket {} references missing event", ticket.id))
            })?;

        let ticket_state = ticket
            .state()
            .ok_or_else(|| EngineError::Corrupt(format!("ticket {} has unknown status", ticket.id)))?;
        let event_state = event
            .state()
            .ok_or_else(|| EngineError::Corrupt(format!("event {} has unknown status", event.id)))?;

        let history = ScanHistory {
            admitted_count: ScanLogRepo::admitted_count_for_ticket(&mut *tx, ticket.id)
                .await
                .map_err(EngineError::Db)?,
            last_admitted_at: ScanLogRepo::last_admitted_at(&mut *tx, ticket.id)
                .await
                .map_err(EngineError::Db)?,
        };
        let event_admitted = ScanLogRepo::admitted_count_for_event(&mut *tx, event.id)
            .await
            .map_err(EngineError::Db)?;

        let qr_check = ticket.qr_payload.as_deref().map(|bytes| match qr::decode(bytes) {
            Ok(payload) => QrCheck::Decoded(payload),
            Err(err) => QrCheck::Unreadable(err),
        });

        let decision = policy::evaluate(
            &ticket.facts(ticket_state),
            &event.facts(event_state),
            &req.ctx,
            now,
            history,
            qr_check.as_ref(),
            event_admitted,
            &self.policy,
        );

        match decision {
            Decision::Admit { restrictions } => {
                // Re-read capacity inside the transaction; losing the race
                // against another admission is an EVENT_FULL.
                if let Some(max) = event.max_attendees {
                    let count = ScanLogRepo::admitted_count_for_event(&mut *tx, event.id)
                        .await
                        .map_err(EngineError::Db)?;
                    if count >= i64::from(max) {
                        let code = RejectCode::EventFull;
                        Self::append_reject(&mut tx, &log_base, code).await?;
                        tx.commit().await.map_err(EngineError::Db)?;
                        return Ok(rejected(req, now, code, "event is at capacity"));
                    }
                }

                // The ticket flips to `used` on its final admission only;
                // earlier admissions of a multi-scan ticket leave it active.
                let final_admission =
                    history.admitted_count + 1 >= i64::from(ticket.max_scans);
                if final_admission {
                    let consumed = TicketRepo::mark_consumed(&mut tx, ticket.id, now)
                        .await
                        .map_err(EngineError::Db)?;
                    if !consumed {
                        // A non-locking writer changed the status underneath us.
                        let code = RejectCode::TicketAlreadyValidated;
                        Self::append_reject(&mut tx, &log_base, code).await?;
                        tx.commit().await.map_err(EngineError::Db)?;
                        return Ok(rejected(
                            req,
                            now,
                            code,
                            "ticket was validated by a concurrent scan",
                        ));
                    }
                }

                let scan_log_id = ScanLogRepo::append(&mut *tx, &log_base)
                    .await
                    .map_err(EngineError::Db)?;
                tx.commit().await.map_err(EngineError::Db)?;

                tracing::info!(
                    ticket_id = ticket.id,
                    event_id = event.id,
                    scan_log_id,
                    final_admission,
                    "Ticket admitted",
                );
                Ok(ScanOutcome {
                    ticket_id: ticket.id,
                    event_id: event.id,
                    scanned_at: now,
                    decision: ScanDecision::Admitted {
                        scan_log_id,
                        restrictions,
                    },
                })
            }
            Decision::Reject { code, reason } => {
                // Audit the reject, then commit: the log row must survive.
                Self::append_reject(&mut tx, &log_base, code).await?;
                tx.commit().await.map_err(EngineError::Db)?;

                tracing::info!(
                    ticket_id = ticket.id,
                    event_id = event.id,
                    code = %code,
                    "Ticket rejected",
                );
                Ok(ScanOutcome {
                    ticket_id: ticket.id,
                    event_id: event.id,
                    scanned_at: now,
                    decision: ScanDecision::Rejected { code, reason },
                })
            }
        }
    }

    async fn append_reject(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        base: &NewScanLog,
        code: RejectCode,
    ) -> Result<DbId, EngineError> {
        let entry = NewScanLog {
            rejection_code: Some(code.as_str().to_string()),
            ..base.clone()
        };
        ScanLogRepo::append(&mut **tx, &entry)
            .await
            .map_err(EngineError::Db)
    }
}

fn rejected(
    req: &ScanRequest,
    now: Timestamp,
    code: RejectCode,
    reason: &str,
) -> ScanOutcome {
    ScanOutcome {
        ticket_id: req.ticket_id,
        event_id: req.event_id,
        scanned_at: now,
        decision: ScanDecision::Rejected {
            code,
            reason: reason.to_string(),
        },
    }
}

/// Apply an admin transition to a ticket, validating it against the state
/// machine before the conditional update.
pub async fn admin_transition(
    pool: &PgPool,
    ticket_id: DbId,
    current: TicketState,
    target: TicketState,
) -> Result<bool, sqlx::Error> {
    if !current.admin_transition_allowed(target) {
        return Ok(false);
    }
    TicketRepo::set_status(pool, ticket_id, current, target).await
}
