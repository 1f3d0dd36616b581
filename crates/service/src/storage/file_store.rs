use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use tokio::sync::{OnceCell, RwLock};
use tracing::{info, instrument};

use super::{KeyValueStore, StorageError, StoredItem};

type Table = BTreeMap<String, StoredItem>;

/// JSON file-backed table, one file per table.
///
/// The file holds an array of `{"URN", "Data"}` items. It is created on first
/// use, and every write replaces it through a temporary file and a rename.
pub struct FileKvStore {
    path: PathBuf,
    table: OnceCell<RwLock<Table>>,
}

impl FileKvStore {
    pub fn new<P: Into<PathBuf>>(data_dir: P, table_name: &str) -> Self {
        let path = data_dir.into().join(format!("{table_name}.json"));
        Self { path, table: OnceCell::new() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn table(&self) -> Result<&RwLock<Table>, StorageError> {
        self.table.get_or_try_init(|| self.provision()).await
    }

    /// Load the table, creating an empty one if it does not exist yet.
    async fn provision(&self) -> Result<RwLock<Table>, StorageError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).await?;
        }
        let table = match fs::read(&self.path).await {
            Ok(bytes) => {
                let items: Vec<StoredItem> = serde_json::from_slice(&bytes)
                    .map_err(|e| StorageError::Corrupt(format!("{}: {e}", self.path.display())))?;
                items.into_iter().map(|item| (item.urn.clone(), item)).collect()
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                info!(path = %self.path.display(), "creating attribute table");
                let empty = Table::new();
                self.persist(&empty).await?;
                empty
            }
            Err(e) => return Err(e.into()),
        };
        Ok(RwLock::new(table))
    }

    async fn persist(&self, table: &Table) -> Result<(), StorageError> {
        let items: Vec<&StoredItem> = table.values().collect();
        let data = serde_json::to_vec_pretty(&items)?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, data).await?;
        fs::rename(&tmp, &self.path).await?;
        Ok(())
    }
}

#[async_trait]
impl KeyValueStore for FileKvStore {
    async fn get_item(&self, key: &str) -> Result<Option<StoredItem>, StorageError> {
        let table = self.table().await?.read().await;
        Ok(table.get(key).cloned())
    }

    #[instrument(skip(self, item), fields(urn = %item.urn))]
    async fn put_item(&self, item: StoredItem) -> Result<(), StorageError> {
        let mut table = self.table().await?.write().await;
        let key = item.urn.clone();
        let previous = table.insert(key.clone(), item);
        if let Err(e) = self.persist(&table).await {
            // keep memory in step with the file that is still on disk
            match previous {
                Some(prev) => table.insert(key, prev),
                None => table.remove(&key),
            };
            return Err(e);
        }
        Ok(())
    }
}
