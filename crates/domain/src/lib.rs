//! Domain entities and invariants.

#![forbid(unsafe_code)]

mod failure;
mod rate_limit;

pub use failure::{FailureKind, Severity};
pub use rate_limit::{CheckOutcome, LimiterTable, RateLimitEntry, RateLimitKey, RateLimitPolicy};
