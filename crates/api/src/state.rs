use std::sync::Arc;

use tessera_core::clock::Clock;
use tessera_core::ratelimit::RateLimiter;

use crate::config::ServerConfig;
use crate::engine::ValidationEngine;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc` or is already `Clone`).
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: tessera_db::DbPool,
    /// Server configuration.
    pub config: Arc<ServerConfig>,
    /// The scan validation engine (owns the rate limiter and clock).
    pub engine: Arc<ValidationEngine>,
}

impl AppState {
    /// Build state with the production clock and a fresh rate limiter.
    pub fn new(pool: tessera_db::DbPool, config: ServerConfig) -> Self {
        let limiter = Arc::new(RateLimiter::new(
            config.rate_limit_capacity,
            config.rate_limit_refill_per_sec,
        ));
        let clock: Arc<dyn Clock> = Arc::new(tessera_core::clock::SystemClock);
        let engine = Arc::new(ValidationEngine::new(
            pool.clone(),
            limiter,
            clock,
            config.policy(),
        ));
        Self {
            pool,
            config: Arc::new(config),
            engine,
        }
    }
}
