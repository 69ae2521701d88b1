//! Application services and ports.

#![forbid(unsafe_code)]

mod guard_ports;
mod guarded_executor;
mod rate_limit_service;

#[cfg(test)]
mod test_support;

pub use guard_ports::{IdentityProvider, Notifier};
pub use guarded_executor::{GuardFailure, GuardedExecutor};
pub use rate_limit_service::{Clock, KeyValueStore, RateLimitRepository, WindowLimiter};
