//! Persisted collection store contract
//!
//! The engine's only persistence boundary: named, JSON-serializable
//! collections loaded and saved as a whole. Local mode backs this with an
//! in-process store; central mode implements the same trait over the
//! shared backend.

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::RwLock;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::error::{AppError, AppResult};

/// Abstract get/set of named collections, keyed by a mode+scope identifier
#[async_trait]
pub trait CollectionStore: Send + Sync {
    /// Load a collection; an absent key yields an empty collection
    async fn load(&self, key: &str) -> AppResult<Vec<Value>>;

    /// Replace a collection atomically
    async fn save(&self, key: &str, records: Vec<Value>) -> AppResult<()>;
}

/// Load a collection and deserialize its records
pub async fn load_collection<T: DeserializeOwned>(
    store: &dyn CollectionStore,
    key: &str,
) -> AppResult<Vec<T>> {
    let raw = store.load(key).await?;
    raw.into_iter()
        .map(|value| {
            serde_json::from_value(value)
                .map_err(|e| AppError::Storage(format!("corrupt record in {}: {}", key, e)))
        })
        .collect()
}

/// Serialize records and save them as a collection
pub async fn save_collection<T: Serialize>(
    store: &dyn CollectionStore,
    key: &str,
    records: &[T],
) -> AppResult<()> {
    let raw = records
        .iter()
        .map(|record| {
            serde_json::to_value(record)
                .map_err(|e| AppError::Storage(format!("unserializable record for {}: {}", key, e)))
        })
        .collect::<AppResult<Vec<Value>>>()?;
    store.save(key, raw).await
}

/// In-process store used in local mode and in tests
#[derive(Default)]
pub struct MemoryStore {
    collections: RwLock<HashMap<String, Vec<Value>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CollectionStore for MemoryStore {
    async fn load(&self, key: &str) -> AppResult<Vec<Value>> {
        Ok(self
            .collections
            .read()
            .get(key)
            .cloned()
            .unwrap_or_default())
    }

    async fn save(&self, key: &str, records: Vec<Value>) -> AppResult<()> {
        self.collections.write().insert(key.to_string(), records);
        Ok(())
    }
}
