//! Rate limit repository persisted through a shared key-value store.
//!
//! The whole table lives under one storage key as a JSON list of
//! `[key, entry]` pairs. Every call reloads the table and every mutation writes
//! it back, so the store is the source of truth for all processes sharing it.
//! Calls within one repository are serialized; calls from different processes
//! are not coordinated and the last save wins.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use fundgate_application::{KeyValueStore, RateLimitRepository};
use fundgate_core::AppResult;
use fundgate_domain::{CheckOutcome, LimiterTable, RateLimitEntry, RateLimitKey, RateLimitPolicy};
use tokio::sync::Mutex;
use tracing::warn;

/// Storage key used when none is configured.
pub const DEFAULT_RATE_LIMIT_STORAGE_KEY: &str = "rate_limit_store";

/// Durable implementation of the rate limit repository port.
pub struct DurableRateLimitRepository {
    store: Arc<dyn KeyValueStore>,
    storage_key: String,
    serialize: Mutex<()>,
}

impl DurableRateLimitRepository {
    /// Creates a repository persisting under [`DEFAULT_RATE_LIMIT_STORAGE_KEY`].
    #[must_use]
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self::with_storage_key(store, DEFAULT_RATE_LIMIT_STORAGE_KEY)
    }

    /// Creates a repository persisting under a custom storage key.
    #[must_use]
    pub fn with_storage_key(store: Arc<dyn KeyValueStore>, storage_key: impl Into<String>) -> Self {
        Self {
            store,
            storage_key: storage_key.into(),
            serialize: Mutex::new(()),
        }
    }

    /// Returns the storage key holding the table.
    #[must_use]
    pub fn storage_key(&self) -> &str {
        self.storage_key.as_str()
    }

    /// Reads the table from the store.
    ///
    /// Missing or malformed payloads yield an empty table. A failed read is
    /// returned as an error so a partial view is never saved over the store.
    pub async fn load_table(&self) -> AppResult<LimiterTable> {
        let Some(payload) = self.store.get(self.storage_key.as_str()).await? else {
            return Ok(LimiterTable::new());
        };

        Ok(LimiterTable::from_json(payload.as_str()).unwrap_or_else(|error| {
            warn!(
                storage_key = %self.storage_key,
                error = %error,
                "discarding malformed rate limit table"
            );
            LimiterTable::new()
        }))
    }

    /// Writes the complete table to the store.
    pub async fn save_table(&self, table: &LimiterTable) -> AppResult<()> {
        let payload = table.to_json()?;
        self.store
            .set(self.storage_key.as_str(), payload.as_str())
            .await
    }
}

#[async_trait]
impl RateLimitRepository for DurableRateLimitRepository {
    async fn record_attempt(
        &self,
        key: &RateLimitKey,
        policy: &RateLimitPolicy,
        now: DateTime<Utc>,
    ) -> AppResult<CheckOutcome> {
        let _serialized = self.serialize.lock().await;
        let mut table = self.load_table().await?;
        let outcome = table.check(key, policy, now);
        if outcome.mutated() {
            self.save_table(&table).await?;
        }

        Ok(outcome)
    }

    async fn find_entry(&self, key: &RateLimitKey) -> AppResult<Option<RateLimitEntry>> {
        let _serialized = self.serialize.lock().await;
        Ok(self.load_table().await?.entry(key).copied())
    }

    async fn cleanup_expired(&self, now: DateTime<Utc>) -> AppResult<u64> {
        let _serialized = self.serialize.lock().await;
        let mut table = self.load_table().await?;
        let removed = table.sweep_expired(now);
        if removed > 0 {
            self.save_table(&table).await?;
        }

        Ok(u64::try_from(removed).unwrap_or(u64::MAX))
    }
}
