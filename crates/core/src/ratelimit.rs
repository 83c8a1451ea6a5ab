//! In-process scan-burst throttle.
//!
//! Token buckets keyed by `(ticket_id, device_id)` and by `operator_id`
//! catch replay bursts before a database transaction is opened. This is a
//! single-process best-effort limiter; the policy's min-interval rule is the
//! authoritative check at the database layer, so no cross-instance
//! coordination is needed here.
//!
//! State is sharded to keep lock contention low under concurrent scans, and
//! idle keys are evicted opportunistically so the maps stay bounded.

use std::collections::HashMap;
use std::sync::Mutex;

use crate::types::{DbId, Timestamp};

/// How long a key may sit idle before it is dropped.
const IDLE_TTL_SECS: i64 = 5 * 60;

/// Shard count. Power of two so the hash can be masked.
const SHARDS: usize = 16;

/// Once a shard grows past this, lookups sweep out idle entries first.
const EVICT_SCAN_LEN: usize = 256;

/// Throttle key: one bucket per scanning device per ticket, and one per
/// operator across all their scans.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RateKey {
    TicketDevice { ticket_id: DbId, device_id: String },
    Operator(DbId),
}

#[derive(Debug, Clone, Copy)]
struct TokenBucket {
    tokens: f64,
    last_seen: Timestamp,
}

/// Sharded token-bucket rate limiter.
pub struct RateLimiter {
    shards: Vec<Mutex<HashMap<RateKey, TokenBucket>>>,
    capacity: f64,
    refill_per_sec: f64,
}

impl RateLimiter {
    /// `capacity` is the burst budget per key; `refill_per_sec` restores one
    /// token per second at the default configuration.
    pub fn new(capacity: u32, refill_per_sec: f64) -> Self {
        let shards = (0..SHARDS).map(|_| Mutex::new(HashMap::new())).collect();
        Self {
            shards,
            capacity: f64::from(capacity),
            refill_per_sec,
        }
    }

    /// Take one token for `key` at instant `now`.
    ///
    /// Returns `false` when the key's bucket is exhausted, i.e. the caller
    /// is scanning too frequently.
    pub fn check(&self, key: RateKey, now: Timestamp) -> bool {
        let mut shard = self.shard_for(&key).lock().expect("rate shard poisoned");

        if shard.len() >= EVICT_SCAN_LEN {
            Self::evict_shard(&mut shard, now);
        }

        let bucket = shard.entry(key).or_insert(TokenBucket {
            tokens: self.capacity,
            last_seen: now,
        });

        let elapsed = (now - bucket.last_seen).num_milliseconds().max(0) as f64 / 1000.0;
        bucket.tokens = (bucket.tokens + elapsed * self.refill_per_sec).min(self.capacity);
        bucket.last_seen = now;

        if bucket.tokens >= 1.0 {
            bucket.tokens -= 1.0;
            true
        } else {
            false
        }
    }

    /// Check every key a scan attempt touches. Any exhausted bucket throttles
    /// the whole attempt.
    pub fn check_scan(
        &self,
        ticket_id: DbId,
        device_id: &str,
        operator_id: Option<DbId>,
        now: Timestamp,
    ) -> bool {
        let ticket_ok = self.check(
            RateKey::TicketDevice {
                ticket_id,
                device_id: device_id.to_string(),
            },
            now,
        );
        let operator_ok = match operator_id {
            Some(op) => self.check(RateKey::Operator(op), now),
            None => true,
        };
        ticket_ok && operator_ok
    }

    /// Drop every key that has been idle for longer than the TTL.
    pub fn evict_idle(&self, now: Timestamp) {
        for shard in &self.shards {
            let mut shard = shard.lock().expect("rate shard poisoned");
            Self::evict_shard(&mut shard, now);
        }
    }

    /// Number of live keys across all shards.
    pub fn len(&self) -> usize {
        self.shards
            .iter()
            .map(|s| s.lock().expect("rate shard poisoned").len())
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn evict_shard(shard: &mut HashMap<RateKey, TokenBucket>, now: Timestamp) {
        shard.retain(|_, bucket| (now - bucket.last_seen).num_seconds() <= IDLE_TTL_SECS);
    }

    fn shard_for(&self, key: &RateKey) -> &Mutex<HashMap<RateKey, TokenBucket>> {
        use std::hash::{Hash, Hasher};
        let mut hasher = std::collections::hash_map::DefaultHasher::new();
        key.hash(&mut hasher);
        &self.shards[(hasher.finish() as usize) % SHARDS]
    }
}
