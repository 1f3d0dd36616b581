//! Storage abstractions for service layer
//!
//! The gateway only needs `get_item` / `put_item` on a table keyed by the
//! canonical urn. Two backends are provided: a JSON-file table and an
//! in-memory map.

pub mod file_store;
pub mod memory;

use std::sync::Arc;

use async_trait::async_trait;
use configs::{StorageBackend, StorageConfig};
use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

pub use file_store::FileKvStore;
pub use memory::MemoryKvStore;

/// One persisted item. `Data` holds the JSON payload as text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredItem {
    #[serde(rename = "URN")]
    pub urn: String,
    #[serde(rename = "Data")]
    pub data: String,
}

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("corrupt table: {0}")]
    Corrupt(String),
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Minimal key-value capability over a single table.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Fetch the item stored under `key`. A table that does not exist yet reads as empty.
    async fn get_item(&self, key: &str) -> Result<Option<StoredItem>, StorageError>;
    /// Store `item`, replacing whatever was stored under `item.urn`.
    async fn put_item(&self, item: StoredItem) -> Result<(), StorageError>;
}

static STORE: OnceCell<Arc<dyn KeyValueStore>> = OnceCell::new();

/// Process-wide store handle, built from `cfg` on first call.
pub fn shared_store(cfg: &StorageConfig) -> Arc<dyn KeyValueStore> {
    Arc::clone(STORE.get_or_init(|| build_store(cfg)))
}

/// Build a fresh store for `cfg` without touching the shared handle.
pub fn build_store(cfg: &StorageConfig) -> Arc<dyn KeyValueStore> {
    match cfg.backend {
        StorageBackend::File => {
            let store = FileKvStore::new(&cfg.data_dir, &cfg.table_name);
            info!(path = %store.path().display(), "using file-backed attribute table");
            Arc::new(store)
        }
        StorageBackend::Memory => {
            info!("using in-memory attribute table");
            Arc::new(MemoryKvStore::default())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stored_item_uses_table_field_names() -> Result<(), serde_json::Error> {
        let item = StoredItem { urn: "YWJj".into(), data: r#"{"a":1}"#.into() };
        let json = serde_json::to_value(&item)?;
        assert_eq!(json, serde_json::json!({"URN": "YWJj", "Data": "{\"a\":1}"}));
        Ok(())
    }

    #[test]
    fn shared_store_is_built_once() {
        let cfg = StorageConfig { backend: StorageBackend::Memory, ..StorageConfig::default() };
        let a = shared_store(&cfg);
        let b = shared_store(&cfg);
        assert!(Arc::ptr_eq(&a, &b));
    }
}
