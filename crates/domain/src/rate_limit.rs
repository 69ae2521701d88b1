//! Fixed-window rate limit accounting.
//!
//! Each key owns a counter and the instant its window closes. A window is
//! never adjusted incrementally: once it has closed, the next accepted request
//! replaces the entry with a fresh one. Requests clustered around a window
//! boundary can therefore reach twice the configured budget.

use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

use fundgate_core::{AppError, AppResult, NonEmptyString};

/// Composite limiter key made of a subject and an operation name.
///
/// Serialized as a two element array so identifiers containing separator
/// characters can never collide.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RateLimitKey(NonEmptyString, NonEmptyString);

impl RateLimitKey {
    /// Creates a validated key for a subject and operation.
    pub fn new(subject: impl Into<String>, operation: impl Into<String>) -> AppResult<Self> {
        Ok(Self(
            NonEmptyString::new(subject)?,
            NonEmptyString::new(operation)?,
        ))
    }

    /// Returns the subject part of the key.
    #[must_use]
    pub fn subject(&self) -> &str {
        self.0.as_str()
    }

    /// Returns the operation part of the key.
    #[must_use]
    pub fn operation(&self) -> &str {
        self.1.as_str()
    }
}

impl Display for RateLimitKey {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}-{}", self.subject(), self.operation())
    }
}

/// Counter state for one key within its current window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RateLimitEntry {
    count: u32,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    window_reset_at: DateTime<Utc>,
}

impl RateLimitEntry {
    /// Opens a fresh window at `now` holding one request.
    #[must_use]
    pub fn open(policy: &RateLimitPolicy, now: DateTime<Utc>) -> Self {
        Self {
            count: 1,
            window_reset_at: now
                .checked_add_signed(policy.window())
                .unwrap_or(DateTime::<Utc>::MAX_UTC),
        }
    }

    /// Rebuilds an entry from stored values.
    #[must_use]
    pub fn from_parts(count: u32, window_reset_at: DateTime<Utc>) -> Self {
        Self {
            count,
            window_reset_at,
        }
    }

    /// Number of requests counted in the current window.
    #[must_use]
    pub fn count(&self) -> u32 {
        self.count
    }

    /// Instant at which the current window closes.
    #[must_use]
    pub fn window_reset_at(&self) -> DateTime<Utc> {
        self.window_reset_at
    }

    /// Returns whether the window has closed at `now`.
    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.window_reset_at
    }

    /// Returns the entry only while its window is still open at `now`.
    #[must_use]
    pub fn active(&self, now: DateTime<Utc>) -> Option<&Self> {
        (!self.is_expired(now)).then_some(self)
    }
}

/// Budget applied by one named limiter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateLimitPolicy {
    name: NonEmptyString,
    max_requests: u32,
    window_ms: u64,
}

impl RateLimitPolicy {
    /// Requests allowed per window when no override is configured.
    pub const DEFAULT_MAX_REQUESTS: u32 = 10;
    /// Window length in milliseconds when no override is configured.
    pub const DEFAULT_WINDOW_MS: u64 = 60_000;

    /// Creates a validated policy.
    pub fn new(name: impl Into<String>, max_requests: u32, window_ms: u64) -> AppResult<Self> {
        let name = NonEmptyString::new(name)?;
        if max_requests == 0 {
            return Err(AppError::Validation(format!(
                "rate limit '{}' must allow at least one request",
                name.as_str()
            )));
        }

        let fits = i64::try_from(window_ms)
            .ok()
            .and_then(TimeDelta::try_milliseconds)
            .is_some();
        if window_ms == 0 || !fits {
            return Err(AppError::Validation(format!(
                "rate limit '{}' window must be between 1 and {} milliseconds",
                name.as_str(),
                TimeDelta::MAX.num_milliseconds()
            )));
        }

        Ok(Self {
            name,
            max_requests,
            window_ms,
        })
    }

    /// Creates a policy with the default budget of 10 requests per minute.
    pub fn with_defaults(name: impl Into<String>) -> AppResult<Self> {
        Self::new(name, Self::DEFAULT_MAX_REQUESTS, Self::DEFAULT_WINDOW_MS)
    }

    /// Returns the limiter name.
    #[must_use]
    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    /// Returns the maximum number of requests per window.
    #[must_use]
    pub fn max_requests(&self) -> u32 {
        self.max_requests
    }

    /// Returns the window length in milliseconds.
    #[must_use]
    pub fn window_ms(&self) -> u64 {
        self.window_ms
    }

    /// Returns the window length as a time delta.
    #[must_use]
    pub fn window(&self) -> TimeDelta {
        // Range is validated in the constructor.
        i64::try_from(self.window_ms)
            .ok()
            .and_then(TimeDelta::try_milliseconds)
            .unwrap_or(TimeDelta::MAX)
    }

    /// Returns how many requests are left given the stored entry for a key.
    #[must_use]
    pub fn remaining(&self, entry: Option<&RateLimitEntry>, now: DateTime<Utc>) -> u32 {
        entry
            .and_then(|entry| entry.active(now))
            .map_or(self.max_requests, |entry| {
                self.max_requests.saturating_sub(entry.count)
            })
    }
}

/// Result of evaluating one request against a table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckOutcome {
    /// Request was counted.
    Accepted {
        /// Entry after the request was counted.
        entry: RateLimitEntry,
        /// Whether a new window was opened by this request.
        opened_window: bool,
    },
    /// Request exceeded the budget and was not counted.
    Rejected {
        /// Unchanged entry that caused the rejection.
        entry: RateLimitEntry,
    },
}

impl CheckOutcome {
    /// Returns true when the request was rejected.
    #[must_use]
    pub fn is_rejected(&self) -> bool {
        matches!(self, Self::Rejected { .. })
    }

    /// Returns true when the table changed and must be persisted.
    #[must_use]
    pub fn mutated(&self) -> bool {
        matches!(self, Self::Accepted { .. })
    }

    /// Returns the entry observed or written by the check.
    #[must_use]
    pub fn entry(&self) -> RateLimitEntry {
        match self {
            Self::Accepted { entry, .. } | Self::Rejected { entry } => *entry,
        }
    }
}

/// Registry of fixed-window entries keyed by subject and operation.
///
/// Serialized as a list of `[key, entry]` pairs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    from = "Vec<(RateLimitKey, RateLimitEntry)>",
    into = "Vec<(RateLimitKey, RateLimitEntry)>"
)]
pub struct LimiterTable {
    entries: BTreeMap<RateLimitKey, RateLimitEntry>,
}

impl LimiterTable {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Decodes a table from its JSON representation.
    pub fn from_json(value: &str) -> AppResult<Self> {
        serde_json::from_str(value).map_err(|error| {
            AppError::Validation(format!("invalid rate limit table payload: {error}"))
        })
    }

    /// Encodes the table as JSON.
    pub fn to_json(&self) -> AppResult<String> {
        serde_json::to_string(self).map_err(|error| {
            AppError::Internal(format!("failed to encode rate limit table: {error}"))
        })
    }

    /// Counts a request for `key` unless its window is saturated.
    pub fn check(
        &mut self,
        key: &RateLimitKey,
        policy: &RateLimitPolicy,
        now: DateTime<Utc>,
    ) -> CheckOutcome {
        if let Some(entry) = self
            .entries
            .get_mut(key)
            .filter(|entry| !entry.is_expired(now))
        {
            if entry.count >= policy.max_requests() {
                return CheckOutcome::Rejected { entry: *entry };
            }

            entry.count = entry.count.saturating_add(1);
            return CheckOutcome::Accepted {
                entry: *entry,
                opened_window: false,
            };
        }

        let entry = RateLimitEntry::open(policy, now);
        self.entries.insert(key.clone(), entry);
        CheckOutcome::Accepted {
            entry,
            opened_window: true,
        }
    }

    /// Returns how many requests `key` may still make in its active window.
    #[must_use]
    pub fn remaining(
        &self,
        key: &RateLimitKey,
        policy: &RateLimitPolicy,
        now: DateTime<Utc>,
    ) -> u32 {
        policy.remaining(self.entries.get(key), now)
    }

    /// Returns when the active window of `key` closes.
    #[must_use]
    pub fn reset_at(&self, key: &RateLimitKey, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        self.entries
            .get(key)
            .and_then(|entry| entry.active(now))
            .map(RateLimitEntry::window_reset_at)
    }

    /// Returns the stored entry for `key`, expired or not.
    #[must_use]
    pub fn entry(&self, key: &RateLimitKey) -> Option<&RateLimitEntry> {
        self.entries.get(key)
    }

    /// Removes every entry whose window has closed and returns how many were removed.
    pub fn sweep_expired(&mut self, now: DateTime<Utc>) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, entry| !entry.is_expired(now));
        before - self.entries.len()
    }

    /// Number of stored entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true when no entries are stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl From<Vec<(RateLimitKey, RateLimitEntry)>> for LimiterTable {
    fn from(pairs: Vec<(RateLimitKey, RateLimitEntry)>) -> Self {
        Self {
            entries: pairs.into_iter().collect(),
        }
    }
}

impl From<LimiterTable> for Vec<(RateLimitKey, RateLimitEntry)> {
    fn from(table: LimiterTable) -> Self {
        table.entries.into_iter().collect()
    }
}

#[cfg(test)]
mod tests;
