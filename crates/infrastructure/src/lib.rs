//! Infrastructure adapters for application ports.

#![forbid(unsafe_code)]

mod clock;
mod durable_rate_limit_repository;
mod file_key_value_store;
mod in_memory_key_value_store;
mod in_memory_rate_limit_repository;
mod notifier;
mod redis_key_value_store;

pub use clock::{ManualClock, SystemClock};
pub use durable_rate_limit_repository::{DEFAULT_RATE_LIMIT_STORAGE_KEY, DurableRateLimitRepository};
pub use file_key_value_store::FileKeyValueStore;
pub use in_memory_key_value_store::InMemoryKeyValueStore;
pub use in_memory_rate_limit_repository::InMemoryRateLimitRepository;
pub use notifier::{ChannelNotifier, Notification, TracingNotifier};
pub use redis_key_value_store::RedisKeyValueStore;
