use std::collections::HashMap;

use async_trait::async_trait;
use fundgate_application::KeyValueStore;
use fundgate_core::AppResult;
use tokio::sync::RwLock;

/// Process-local key-value store.
///
/// Share one instance through an `Arc` to let several repositories observe
/// the same state, the way several windows share one browser profile.
#[derive(Default)]
pub struct InMemoryKeyValueStore {
    values: RwLock<HashMap<String, String>>,
}

impl InMemoryKeyValueStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KeyValueStore for InMemoryKeyValueStore {
    async fn get(&self, key: &str) -> AppResult<Option<String>> {
        Ok(self.values.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> AppResult<()> {
        self.values
            .write()
            .await
            .insert(key.to_owned(), value.to_owned());
        Ok(())
    }
}
