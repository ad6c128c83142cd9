use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value as JsonValue;
use std::collections::HashMap;
use tokio::sync::RwLock;

use crate::models::Record;

/// Remote key-value storage used by the request handlers.
///
/// Implementations must be safe to share across concurrent requests; the
/// service holds a single instance for the lifetime of the process.
#[async_trait]
pub trait KvStore: Send + Sync {
    /// Look up the value stored under `key`.
    ///
    /// # Returns
    /// * `Ok(Some(value))` - Record found
    /// * `Ok(None)` - No record for this key
    /// * `Err(_)` - The store could not be reached or returned an error
    async fn get(&self, key: &str) -> Result<Option<JsonValue>>;

    /// Unconditionally create or overwrite the record for `record.key`.
    async fn put(&self, record: Record) -> Result<()>;

    /// Verify the store is reachable.
    async fn health_check(&self) -> Result<()>;
}

/// In-process store backed by a `HashMap`
#[derive(Default)]
pub struct MemoryStore {
    records: RwLock<HashMap<String, JsonValue>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KvStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<JsonValue>> {
        let value = self.records.read().await.get(key).cloned();
        tracing::debug!("Memory store lookup for key '{}': hit={}", key, value.is_some());
        Ok(value)
    }

    async fn put(&self, record: Record) -> Result<()> {
        tracing::debug!("Memory store write for key '{}'", record.key);
        self.records.write().await.insert(record.key, record.value);
        Ok(())
    }

    async fn health_check(&self) -> Result<()> {
        Ok(())
    }
}
