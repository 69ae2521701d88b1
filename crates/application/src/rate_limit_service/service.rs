use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use fundgate_core::AppResult;
use fundgate_domain::{CheckOutcome, RateLimitKey, RateLimitPolicy};

use super::ports::{Clock, RateLimitRepository};

/// Named fixed-window limiter.
///
/// Cloning is cheap and clones share the same repository.
#[derive(Clone)]
pub struct WindowLimiter {
    repository: Arc<dyn RateLimitRepository>,
    policy: RateLimitPolicy,
    clock: Arc<dyn Clock>,
}

impl WindowLimiter {
    /// Creates a limiter applying `policy` to state kept in `repository`.
    #[must_use]
    pub fn new(
        repository: Arc<dyn RateLimitRepository>,
        policy: RateLimitPolicy,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            repository,
            policy,
            clock,
        }
    }

    /// Returns the policy enforced by this limiter.
    #[must_use]
    pub fn policy(&self) -> &RateLimitPolicy {
        &self.policy
    }

    /// Counts a request for `key`.
    ///
    /// Returns `true` when the request is rejected and `false` when it was
    /// accepted and counted.
    pub async fn check(&self, key: &RateLimitKey) -> AppResult<bool> {
        let outcome = self
            .repository
            .record_attempt(key, &self.policy, self.clock.now())
            .await?;

        match outcome {
            CheckOutcome::Accepted {
                entry,
                opened_window,
            } => debug!(
                limiter = %self.policy.name(),
                key = %key,
                count = entry.count(),
                opened_window,
                "rate limit check accepted"
            ),
            CheckOutcome::Rejected { entry } => debug!(
                limiter = %self.policy.name(),
                key = %key,
                count = entry.count(),
                window_reset_at = %entry.window_reset_at(),
                "rate limit check rejected"
            ),
        }

        Ok(outcome.is_rejected())
    }

    /// Returns how many requests `key` may still make in its current window.
    pub async fn remaining(&self, key: &RateLimitKey) -> AppResult<u32> {
        let entry = self.repository.find_entry(key).await?;
        Ok(self.policy.remaining(entry.as_ref(), self.clock.now()))
    }

    /// Returns when the current window of `key` closes, if one is open.
    pub async fn reset_at(&self, key: &RateLimitKey) -> AppResult<Option<DateTime<Utc>>> {
        let now = self.clock.now();
        let entry = self.repository.find_entry(key).await?;
        Ok(entry
            .and_then(|entry| entry.active(now).map(|entry| entry.window_reset_at())))
    }

    /// Removes entries whose window has closed.
    pub async fn sweep(&self) -> AppResult<u64> {
        let removed = self.repository.cleanup_expired(self.clock.now()).await?;
        if removed > 0 {
            info!(
                limiter = %self.policy.name(),
                removed,
                "swept expired rate limit entries"
            );
        }

        Ok(removed)
    }
}
