//! Fundgate rate limit sweeper.
//!
//! Periodically removes expired windows from the durable rate limit table so
//! the shared store does not grow without bound.

#![forbid(unsafe_code)]

mod config;

use std::sync::Arc;
use std::time::Duration;

use fundgate_application::{Clock, KeyValueStore, RateLimitRepository};
use fundgate_core::{AppError, AppResult};
use fundgate_infrastructure::{
    DurableRateLimitRepository, FileKeyValueStore, RedisKeyValueStore, SystemClock,
};
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use crate::config::{RateLimitStoreConfig, WorkerConfig};

#[tokio::main]
async fn main() -> Result<(), AppError> {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = WorkerConfig::load()?;
    let store = build_store(&config.store)?;
    let repository =
        DurableRateLimitRepository::with_storage_key(store, config.storage_key.clone());
    let clock = SystemClock;

    info!(
        store = ?config.store,
        storage_key = %repository.storage_key(),
        sweep_interval_ms = config.sweep_interval_ms,
        "fundgate-worker started"
    );

    let mut interval = tokio::time::interval(Duration::from_millis(config.sweep_interval_ms));
    loop {
        interval.tick().await;

        match repository.cleanup_expired(clock.now()).await {
            Ok(0) => debug!("no expired rate limit entries"),
            Ok(removed) => info!(removed, "swept expired rate limit entries"),
            Err(error) => warn!(error = %error, "failed to sweep rate limit entries"),
        }
    }
}

fn build_store(config: &RateLimitStoreConfig) -> AppResult<Arc<dyn KeyValueStore>> {
    match config {
        RateLimitStoreConfig::File { path } => Ok(Arc::new(FileKeyValueStore::new(path.clone()))),
        RateLimitStoreConfig::Redis { url } => {
            let client = redis::Client::open(url.as_str())
                .map_err(|error| AppError::Validation(format!("invalid REDIS_URL: {error}")))?;
            Ok(Arc::new(RedisKeyValueStore::new(client, "fundgate")))
        }
    }
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .compact()
        .init();
}
