//! Fixed-window rate limiting ports and application service.
//!
//! The window algorithm lives in `fundgate_domain::LimiterTable`; repositories
//! only decide where the table is kept. Infrastructure provides a volatile
//! in-memory repository and a durable one that reloads and saves the whole
//! table through a [`KeyValueStore`] on every call.

mod ports;
mod service;

pub use ports::{Clock, KeyValueStore, RateLimitRepository};
pub use service::WindowLimiter;
