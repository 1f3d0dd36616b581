//! Runtime environment helpers
//!
//! Thin wrapper around `common::env` so the server only needs the storage
//! configuration to prepare the data directory.

use configs::{StorageBackend, StorageConfig};

/// Ensure the table directory exists when the file backend is selected.
pub async fn ensure_storage(cfg: &StorageConfig) -> anyhow::Result<()> {
    if cfg.backend == StorageBackend::File {
        common::env::ensure_data_dir(&cfg.data_dir).await?;
    }
    Ok(())
}
