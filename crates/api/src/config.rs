use tessera_core::policy::PolicyConfig;

/// Server configuration loaded from environment variables.
///
/// All fields have sensible defaults suitable for local development.
/// In production, override via environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// Per-request deadline in milliseconds (default: `2000`).
    pub request_deadline_ms: u64,
    /// Per-statement database timeout in milliseconds (default: `500`).
    pub db_statement_timeout_ms: u64,
    /// Token-bucket burst budget per rate-limit key (default: `5`).
    pub rate_limit_capacity: u32,
    /// Token refill rate per second (default: `1`).
    pub rate_limit_refill_per_sec: f64,
    /// Minimum gap between two admissions of the same ticket (default: `30000`).
    pub min_scan_interval_ms: i64,
    /// Maximum items per batch validation request (default: `50`).
    pub batch_max_items: usize,
    /// Accepted QR payload versions, comma-separated (default: `v1`).
    pub qr_supported_versions: Vec<String>,
}

fn env_parsed<T: std::str::FromStr>(name: &str, default: &str) -> T
where
    T::Err: std::fmt::Debug,
{
    std::env::var(name)
        .unwrap_or_else(|_| default.into())
        .parse()
        .unwrap_or_else(|e| panic!("{name} must be a valid value: {e:?}"))
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                    | Default   |
    /// |----------------------------|-----------|
    /// | `HOST`                     | `0.0.0.0` |
    /// | `PORT`                     | `3000`    |
    /// | `CORS_ORIGINS`             | `http://localhost:5173` |
    /// | `REQUEST_DEADLINE_MS`      | `2000`    |
    /// | `DB_STATEMENT_TIMEOUT_MS`  | `500`     |
    /// | `RATE_LIMIT_CAPACITY`      | `5`       |
    /// | `RATE_LIMIT_REFILL_PER_SEC`| `1`       |
    /// | `MIN_SCAN_INTERVAL_MS`     | `30000`   |
    /// | `BATCH_MAX_ITEMS`          | `50`      |
    /// | `QR_SUPPORTED_VERSIONS`    | `v1`      |
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let qr_supported_versions: Vec<String> = std::env::var("QR_SUPPORTED_VERSIONS")
            .unwrap_or_else(|_| "v1".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        Self {
            host,
            port: env_parsed("PORT", "3000"),
            cors_origins,
            request_deadline_ms: env_parsed("REQUEST_DEADLINE_MS", "2000"),
            db_statement_timeout_ms: env_parsed("DB_STATEMENT_TIMEOUT_MS", "500"),
            rate_limit_capacity: env_parsed("RATE_LIMIT_CAPACITY", "5"),
            rate_limit_refill_per_sec: env_parsed("RATE_LIMIT_REFILL_PER_SEC", "1"),
            min_scan_interval_ms: env_parsed("MIN_SCAN_INTERVAL_MS", "30000"),
            batch_max_items: env_parsed("BATCH_MAX_ITEMS", "50"),
            qr_supported_versions,
        }
    }

    /// Project the policy-relevant knobs into the evaluator's config.
    pub fn policy(&self) -> PolicyConfig {
        PolicyConfig {
            min_scan_interval: chrono::Duration::milliseconds(self.min_scan_interval_ms),
            supported_qr_versions: self.qr_supported_versions.clone(),
        }
    }
}
