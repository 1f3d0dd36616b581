use std::sync::Arc;

use tracing::{debug, error, info, instrument, warn};

use super::domain::AttributeRecord;
use super::errors::AttributeError;
use crate::authz::{self, AuthDecision, Authorizer, DenialReason};
use crate::canonical::canonicalize;
use crate::storage::{KeyValueStore, StorageError, StoredItem};

/// Attribute business service independent of web framework.
///
/// Every verb validates its input, asks the authorizer about the raw urn, and
/// only then touches the store under the canonical key. Nothing is retried and
/// no lock is taken: two racing creates for one key may both pass the
/// existence check, in which case the later put wins.
pub struct AttributeService {
    authorizer: Arc<dyn Authorizer>,
    store: Arc<dyn KeyValueStore>,
}

impl AttributeService {
    pub fn new(authorizer: Arc<dyn Authorizer>, store: Arc<dyn KeyValueStore>) -> Self {
        Self { authorizer, store }
    }

    /// Store `data` (JSON text) for `urn`, failing with `Conflict` if a record exists.
    #[instrument(skip_all, fields(urn = %urn))]
    pub async fn create(
        &self,
        credential: Option<&str>,
        urn: &str,
        data: &str,
    ) -> Result<AttributeRecord, AttributeError> {
        require_urn(urn)?;
        let value = parse_data(data)?;
        self.authorize(credential, urn).await?;

        let key = canonical_key(urn)?;
        if self.store.get_item(&key).await.map_err(storage_failure)?.is_some() {
            warn!(%key, "attributes already exist");
            return Err(AttributeError::Conflict(key));
        }
        self.store
            .put_item(StoredItem { urn: key.clone(), data: data.to_string() })
            .await
            .map_err(storage_failure)?;
        info!(%key, "attributes_created");
        Ok(AttributeRecord { urn: key, data: value })
    }

    /// Fetch the record for `urn`; `Ok(None)` when nothing is stored.
    #[instrument(skip_all, fields(urn = %urn))]
    pub async fn read(&self, credential: Option<&str>, urn: &str) -> Result<Option<AttributeRecord>, AttributeError> {
        require_urn(urn)?;
        self.authorize(credential, urn).await?;

        let key = canonical_key(urn)?;
        let item = self.store.get_item(&key).await.map_err(storage_failure)?;
        match item {
            Some(item) => Ok(Some(AttributeRecord::try_from(item).map_err(storage_failure)?)),
            None => {
                debug!(%key, "no attributes stored");
                Ok(None)
            }
        }
    }

    /// Overwrite (or create) the record for `path_urn`. The body must name the same urn.
    #[instrument(skip_all, fields(urn = %path_urn))]
    pub async fn replace(
        &self,
        credential: Option<&str>,
        path_urn: &str,
        body_urn: &str,
        data: &str,
    ) -> Result<AttributeRecord, AttributeError> {
        if path_urn != body_urn {
            return Err(AttributeError::UrnMismatch { path: path_urn.to_string(), body: body_urn.to_string() });
        }
        require_urn(path_urn)?;
        let value = parse_data(data)?;
        self.authorize(credential, path_urn).await?;

        let key = canonical_key(path_urn)?;
        self.store
            .put_item(StoredItem { urn: key.clone(), data: data.to_string() })
            .await
            .map_err(storage_failure)?;
        info!(%key, "attributes_replaced");
        Ok(AttributeRecord { urn: key, data: value })
    }

    async fn authorize(&self, credential: Option<&str>, urn: &str) -> Result<(), AttributeError> {
        match authz::authorize(self.authorizer.as_ref(), credential, urn).await? {
            AuthDecision::Authorized => Ok(()),
            AuthDecision::Denied { reason: DenialReason::MissingCredential, .. } => {
                debug!("request carries no credential");
                Err(AttributeError::Unauthorized)
            }
            AuthDecision::Denied { reason: DenialReason::Rejected, status } => {
                debug!(status, "authorizer denied access");
                Err(AttributeError::Denied { status })
            }
        }
    }
}

fn require_urn(urn: &str) -> Result<(), AttributeError> {
    if urn.trim().is_empty() {
        return Err(AttributeError::InvalidInput("urn is required".into()));
    }
    Ok(())
}

fn parse_data(data: &str) -> Result<serde_json::Value, AttributeError> {
    serde_json::from_str(data).map_err(|e| AttributeError::InvalidInput(format!("data is not valid JSON: {e}")))
}

fn canonical_key(urn: &str) -> Result<String, AttributeError> {
    let key = canonicalize(urn)?;
    if key.is_empty() {
        return Err(AttributeError::InvalidInput("urn has no identifier after the scheme marker".into()));
    }
    Ok(key)
}

fn storage_failure(e: StorageError) -> AttributeError {
    error!(error = %e, "attribute storage failed");
    AttributeError::Storage(e)
}
