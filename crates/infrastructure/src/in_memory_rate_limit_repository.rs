use async_trait::async_trait;
use chrono::{DateTime, Utc};
use fundgate_application::RateLimitRepository;
use fundgate_core::AppResult;
use fundgate_domain::{CheckOutcome, LimiterTable, RateLimitEntry, RateLimitKey, RateLimitPolicy};
use tokio::sync::Mutex;

/// Volatile rate limit repository scoped to the lifetime of the process.
#[derive(Default)]
pub struct InMemoryRateLimitRepository {
    table: Mutex<LimiterTable>,
}

impl InMemoryRateLimitRepository {
    /// Creates an empty repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RateLimitRepository for InMemoryRateLimitRepository {
    async fn record_attempt(
        &self,
        key: &RateLimitKey,
        policy: &RateLimitPolicy,
        now: DateTime<Utc>,
    ) -> AppResult<CheckOutcome> {
        Ok(self.table.lock().await.check(key, policy, now))
    }

    async fn find_entry(&self, key: &RateLimitKey) -> AppResult<Option<RateLimitEntry>> {
        Ok(self.table.lock().await.entry(key).copied())
    }

    async fn cleanup_expired(&self, now: DateTime<Utc>) -> AppResult<u64> {
        let removed = self.table.lock().await.sweep_expired(now);
        Ok(u64::try_from(removed).unwrap_or(u64::MAX))
    }
}
