use std::collections::HashMap;
use std::env;
use std::path::PathBuf;

use fundgate_core::{AppError, AppResult};
use fundgate_infrastructure::DEFAULT_RATE_LIMIT_STORAGE_KEY;

const DEFAULT_FILE_PATH: &str = ".fundgate/store.json";
const DEFAULT_SWEEP_INTERVAL_MS: u64 = 60_000;

/// Backend holding the durable rate limit table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RateLimitStoreConfig {
    File { path: PathBuf },
    Redis { url: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerConfig {
    pub store: RateLimitStoreConfig,
    pub storage_key: String,
    pub sweep_interval_ms: u64,
}

impl WorkerConfig {
    pub fn load() -> AppResult<Self> {
        let variables: HashMap<String, String> = env::vars().collect();
        Self::from_lookup(|name| variables.get(name).cloned())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> AppResult<Self> {
        let non_empty = |name: &str| {
            lookup(name)
                .map(|value| value.trim().to_owned())
                .filter(|value| !value.is_empty())
        };

        let store = match non_empty("RATE_LIMIT_STORE")
            .unwrap_or_else(|| "file".to_owned())
            .as_str()
        {
            "file" => RateLimitStoreConfig::File {
                path: non_empty("RATE_LIMIT_FILE_PATH")
                    .map_or_else(|| PathBuf::from(DEFAULT_FILE_PATH), PathBuf::from),
            },
            "redis" => RateLimitStoreConfig::Redis {
                url: non_empty("REDIS_URL").ok_or_else(|| {
                    AppError::Validation(
                        "REDIS_URL is required when RATE_LIMIT_STORE=redis".to_owned(),
                    )
                })?,
            },
            other => {
                return Err(AppError::Validation(format!(
                    "RATE_LIMIT_STORE must be either 'file' or 'redis', got '{other}'"
                )));
            }
        };

        let storage_key = non_empty("RATE_LIMIT_STORAGE_KEY")
            .unwrap_or_else(|| DEFAULT_RATE_LIMIT_STORAGE_KEY.to_owned());

        let sweep_interval_ms = match non_empty("RATE_LIMIT_SWEEP_INTERVAL_MS") {
            Some(value) => value.parse::<u64>().map_err(|error| {
                AppError::Validation(format!(
                    "invalid RATE_LIMIT_SWEEP_INTERVAL_MS value '{value}': {error}"
                ))
            })?,
            None => DEFAULT_SWEEP_INTERVAL_MS,
        };
        if sweep_interval_ms == 0 {
            return Err(AppError::Validation(
                "RATE_LIMIT_SWEEP_INTERVAL_MS must be greater than zero".to_owned(),
            ));
        }

        Ok(Self {
            store,
            storage_key,
            sweep_interval_ms,
        })
    }
}
