//! Fakes shared by service tests.

use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Utc};

use fundgate_core::{AppError, AppResult};
use fundgate_domain::{CheckOutcome, LimiterTable, RateLimitEntry, RateLimitKey, RateLimitPolicy};

use crate::{Clock, RateLimitRepository};

pub(crate) struct TestClock {
    now: Mutex<DateTime<Utc>>,
}

impl TestClock {
    pub(crate) fn starting_at(now: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(now),
        }
    }

    pub(crate) fn advance_ms(&self, millis: i64) {
        if let Ok(mut now) = self.now.lock() {
            *now += TimeDelta::milliseconds(millis);
        }
    }
}

impl Clock for TestClock {
    fn now(&self) -> DateTime<Utc> {
        self.now
            .lock()
            .map(|now| *now)
            .unwrap_or_else(|_| unreachable!())
    }
}

#[derive(Default)]
pub(crate) struct FakeRateLimitRepository {
    table: Mutex<LimiterTable>,
}

impl FakeRateLimitRepository {
    fn lock(&self) -> AppResult<std::sync::MutexGuard<'_, LimiterTable>> {
        self.table.lock().map_err(|error| {
            AppError::Internal(format!("failed to lock limiter state: {error}"))
        })
    }
}

#[async_trait]
impl RateLimitRepository for FakeRateLimitRepository {
    async fn record_attempt(
        &self,
        key: &RateLimitKey,
        policy: &RateLimitPolicy,
        now: DateTime<Utc>,
    ) -> AppResult<CheckOutcome> {
        Ok(self.lock()?.check(key, policy, now))
    }

    async fn find_entry(&self, key: &RateLimitKey) -> AppResult<Option<RateLimitEntry>> {
        Ok(self.lock()?.entry(key).copied())
    }

    async fn cleanup_expired(&self, now: DateTime<Utc>) -> AppResult<u64> {
        Ok(self.lock()?.sweep_expired(now) as u64)
    }
}
