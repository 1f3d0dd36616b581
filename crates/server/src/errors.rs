use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use service::attributes::AttributeError;
use thiserror::Error;
use tracing::{debug, error};

/// Error response carrying only the status and its canonical reason phrase.
#[derive(Debug)]
pub struct JsonApiError {
    pub status: StatusCode,
    pub error: String,
}

impl JsonApiError {
    pub fn new(status: StatusCode, error: impl Into<String>) -> Self {
        Self { status, error: error.into() }
    }

    pub fn from_status(status: StatusCode) -> Self {
        Self::new(status, status.canonical_reason().unwrap_or("Error"))
    }
}

impl IntoResponse for JsonApiError {
    fn into_response(self) -> Response {
        (self.status, Json(serde_json::json!({"error": self.error}))).into_response()
    }
}

impl From<AttributeError> for JsonApiError {
    fn from(e: AttributeError) -> Self {
        let status = match &e {
            AttributeError::InvalidInput(_)
            | AttributeError::UrnMismatch { .. }
            | AttributeError::Canonicalization(_) => StatusCode::BAD_REQUEST,
            AttributeError::Unauthorized => StatusCode::UNAUTHORIZED,
            AttributeError::Denied { status } => denial_status(*status),
            AttributeError::AuthorizerUnavailable(_) => StatusCode::BAD_GATEWAY,
            AttributeError::Conflict(_) => StatusCode::CONFLICT,
            AttributeError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status.is_server_error() {
            error!(code = e.code(), error = %e, "attribute request failed");
        } else {
            debug!(code = e.code(), error = %e, "attribute request rejected");
        }
        Self::from_status(status)
    }
}

/// Pass an upstream denial status through; anything that is not an error status
/// cannot describe a denial and is reported as a bad gateway.
fn denial_status(status: u16) -> StatusCode {
    StatusCode::from_u16(status)
        .ok()
        .filter(|s| s.is_client_error() || s.is_server_error())
        .unwrap_or(StatusCode::BAD_GATEWAY)
}

impl From<JsonRejection> for JsonApiError {
    fn from(rejection: JsonRejection) -> Self {
        debug!(error = %rejection.body_text(), "malformed attributes payload");
        Self::from_status(StatusCode::BAD_REQUEST)
    }
}

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("runtime check failed: {0}")]
    Runtime(String),
    #[error(transparent)]
    Any(#[from] anyhow::Error),
}

#[cfg(test)]
mod tests {
    use super::*;
    use service::canonical::CanonicalizationError;
    use service::storage::StorageError;

    fn status_of(e: AttributeError) -> StatusCode {
        JsonApiError::from(e).status
    }

    #[test]
    fn attribute_errors_map_to_statuses() {
        assert_eq!(status_of(AttributeError::InvalidInput("x".into())), StatusCode::BAD_REQUEST);
        assert_eq!(
            status_of(AttributeError::UrnMismatch { path: "a".into(), body: "b".into() }),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_of(AttributeError::Canonicalization(CanonicalizationError::MalformedPadding { len: 5 })),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(status_of(AttributeError::Unauthorized), StatusCode::UNAUTHORIZED);
        assert_eq!(status_of(AttributeError::Denied { status: 404 }), StatusCode::NOT_FOUND);
        assert_eq!(status_of(AttributeError::Denied { status: 42 }), StatusCode::BAD_GATEWAY);
        assert_eq!(status_of(AttributeError::Denied { status: 503 }), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(status_of(AttributeError::AuthorizerUnavailable("down".into())), StatusCode::BAD_GATEWAY);
        assert_eq!(status_of(AttributeError::Conflict("k".into())), StatusCode::CONFLICT);
        assert_eq!(
            status_of(AttributeError::Storage(StorageError::Unavailable("x".into()))),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn non_error_denial_statuses_become_bad_gateway() {
        for status in [100, 200, 201, 204, 302] {
            assert_eq!(status_of(AttributeError::Denied { status }), StatusCode::BAD_GATEWAY, "status {status}");
        }
    }

    #[test]
    fn error_body_hides_details() {
        let err = JsonApiError::from(AttributeError::Storage(StorageError::Corrupt("secret path".into())));
        assert_eq!(err.error, "Internal Server Error");
    }
}
