use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{KeyValueStore, StorageError, StoredItem};

/// In-process table. Counts every call so tests can assert on store traffic.
#[derive(Default)]
pub struct MemoryKvStore {
    items: RwLock<HashMap<String, StoredItem>>,
    gets: AtomicUsize,
    puts: AtomicUsize,
    unavailable: AtomicBool,
}

impl MemoryKvStore {
    pub fn get_calls(&self) -> usize {
        self.gets.load(Ordering::SeqCst)
    }

    pub fn put_calls(&self) -> usize {
        self.puts.load(Ordering::SeqCst)
    }

    pub fn total_calls(&self) -> usize {
        self.get_calls() + self.put_calls()
    }

    /// Make every subsequent call fail with [`StorageError::Unavailable`].
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn check_available(&self) -> Result<(), StorageError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StorageError::Unavailable("memory store switched off".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl KeyValueStore for MemoryKvStore {
    async fn get_item(&self, key: &str) -> Result<Option<StoredItem>, StorageError> {
        self.gets.fetch_add(1, Ordering::SeqCst);
        self.check_available()?;
        Ok(self.items.read().await.get(key).cloned())
    }

    async fn put_item(&self, item: StoredItem) -> Result<(), StorageError> {
        self.puts.fetch_add(1, Ordering::SeqCst);
        self.check_available()?;
        self.items.write().await.insert(item.urn.clone(), item);
        Ok(())
    }
}
