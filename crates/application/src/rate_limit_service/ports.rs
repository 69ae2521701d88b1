use async_trait::async_trait;
use chrono::{DateTime, Utc};

use fundgate_core::AppResult;
use fundgate_domain::{CheckOutcome, RateLimitEntry, RateLimitKey, RateLimitPolicy};

/// Repository port for rate limit state.
#[async_trait]
pub trait RateLimitRepository: Send + Sync {
    /// Evaluates one request for `key` against `policy` at `now`.
    ///
    /// Accepted requests are counted and persisted before returning; rejected
    /// requests leave stored state untouched.
    async fn record_attempt(
        &self,
        key: &RateLimitKey,
        policy: &RateLimitPolicy,
        now: DateTime<Utc>,
    ) -> AppResult<CheckOutcome>;

    /// Returns the stored entry for `key`, including expired ones.
    async fn find_entry(&self, key: &RateLimitKey) -> AppResult<Option<RateLimitEntry>>;

    /// Removes entries whose window closed at or before `now`.
    async fn cleanup_expired(&self, now: DateTime<Utc>) -> AppResult<u64>;
}

/// String-keyed, string-valued store that outlives the process.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Reads the value stored under `key`.
    async fn get(&self, key: &str) -> AppResult<Option<String>>;

    /// Replaces the value stored under `key`.
    async fn set(&self, key: &str, value: &str) -> AppResult<()>;
}

/// Time source used for window accounting.
pub trait Clock: Send + Sync {
    /// Returns the current instant.
    fn now(&self) -> DateTime<Utc>;
}
