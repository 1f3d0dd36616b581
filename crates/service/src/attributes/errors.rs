use thiserror::Error;

use crate::authz::AuthzError;
use crate::canonical::CanonicalizationError;
use crate::storage::StorageError;

/// Business errors for attribute operations
#[derive(Debug, Error)]
pub enum AttributeError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("path urn {path:?} does not match body urn {body:?}")]
    UrnMismatch { path: String, body: String },
    #[error("no credential presented")]
    Unauthorized,
    #[error("access denied (status {status})")]
    Denied { status: u16 },
    #[error("authorizer unavailable: {0}")]
    AuthorizerUnavailable(String),
    #[error("attributes already exist for {0}")]
    Conflict(String),
    #[error(transparent)]
    Canonicalization(#[from] CanonicalizationError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl AttributeError {
    /// Stable numeric code for external mapping/logging
    pub fn code(&self) -> u16 {
        match self {
            AttributeError::InvalidInput(_) => 2001,
            AttributeError::UrnMismatch { .. } => 2002,
            AttributeError::Canonicalization(_) => 2003,
            AttributeError::Unauthorized => 2101,
            AttributeError::Denied { .. } => 2102,
            AttributeError::AuthorizerUnavailable(_) => 2103,
            AttributeError::Conflict(_) => 2201,
            AttributeError::Storage(_) => 2301,
        }
    }

    /// Whether the caller's input was at fault.
    pub fn is_client_input(&self) -> bool {
        matches!(
            self,
            AttributeError::InvalidInput(_) | AttributeError::UrnMismatch { .. } | AttributeError::Canonicalization(_)
        )
    }
}

impl From<AuthzError> for AttributeError {
    fn from(e: AuthzError) -> Self {
        AttributeError::AuthorizerUnavailable(e.to_string())
    }
}
