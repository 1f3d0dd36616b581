use serde::{Deserialize, Serialize};

use crate::storage::{StorageError, StoredItem};

/// A stored attribute payload as handed back to callers.
///
/// `urn` is the canonical key the record is stored under.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttributeRecord {
    pub urn: String,
    pub data: serde_json::Value,
}

impl TryFrom<StoredItem> for AttributeRecord {
    type Error = StorageError;

    fn try_from(item: StoredItem) -> Result<Self, Self::Error> {
        let data = serde_json::from_str(&item.data)
            .map_err(|e| StorageError::Corrupt(format!("item {} holds invalid JSON: {e}", item.urn)))?;
        Ok(Self { urn: item.urn, data })
    }
}
