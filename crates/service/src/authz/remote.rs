use std::time::Duration;

use async_trait::async_trait;
use configs::AuthorizerConfig;
use reqwest::header::{HeaderValue, AUTHORIZATION};
use reqwest::{StatusCode, Url};
use tracing::{debug, instrument, warn};

use super::{AuthDecision, Authorizer, AuthzError, DenialReason};

/// Asks the upstream API whether the caller's credential can see a resource.
///
/// The caller's `Authorization` header is forwarded verbatim to
/// `{base_url}/{check_path}` and only the response status is inspected. A `200`
/// means the caller can read the resource; any other status is handed back as
/// the denial status.
#[derive(Clone)]
pub struct RemoteAuthorizer {
    client: reqwest::Client,
    base_url: Url,
    check_path: String,
}

impl RemoteAuthorizer {
    /// Build from configuration using the process-wide HTTP client.
    pub fn from_config(cfg: &AuthorizerConfig) -> Result<Self, AuthzError> {
        let client = common::http::shared_client(Duration::from_secs(cfg.timeout_secs))
            .map_err(|e| AuthzError::Config(e.to_string()))?
            .clone();
        Self::with_client(client, &cfg.base_url, &cfg.check_path)
    }

    pub fn with_client(client: reqwest::Client, base_url: &str, check_path: &str) -> Result<Self, AuthzError> {
        let base_url = Url::parse(base_url).map_err(|e| AuthzError::Config(format!("base_url: {e}")))?;
        if base_url.cannot_be_a_base() {
            return Err(AuthzError::Config("base_url cannot carry a path".into()));
        }
        Ok(Self { client, base_url, check_path: check_path.to_string() })
    }

    /// URL probed for `resource`. The resource is encoded as a single path segment.
    pub fn check_url(&self, resource: &str) -> Result<Url, AuthzError> {
        let mut url = self.base_url.clone();
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|_| AuthzError::Config("base_url cannot carry a path".into()))?;
            segments.pop_if_empty();
            for part in self.check_path.split('/').filter(|p| !p.is_empty()) {
                segments.push(&part.replace("{urn}", resource));
            }
        }
        Ok(url)
    }
}

#[async_trait]
impl Authorizer for RemoteAuthorizer {
    #[instrument(skip_all, fields(resource = %resource))]
    async fn check(&self, credential: &str, resource: &str) -> Result<AuthDecision, AuthzError> {
        // dot segments are dropped by the url builder and would probe the parent path
        if resource == "." || resource == ".." {
            return Ok(AuthDecision::Denied { reason: DenialReason::Rejected, status: 400 });
        }
        let header = match HeaderValue::from_str(credential) {
            Ok(h) => h,
            Err(_) => {
                debug!("credential is not a valid header value");
                return Ok(AuthDecision::Denied { reason: DenialReason::Rejected, status: 401 });
            }
        };

        let url = self.check_url(resource)?;
        let res = self
            .client
            .get(url)
            .header(AUTHORIZATION, header)
            .send()
            .await
            .map_err(|e| {
                warn!(error = %e, "authorization request failed");
                AuthzError::Transport(e.to_string())
            })?;

        let status = res.status();
        if status == StatusCode::OK {
            Ok(AuthDecision::Authorized)
        } else {
            debug!(status = status.as_u16(), "authorization denied upstream");
            Ok(AuthDecision::Denied { reason: DenialReason::Rejected, status: status.as_u16() })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    use axum::extract::{Path, State};
    use axum::http::{HeaderMap, StatusCode as AxumStatus};
    use axum::routing::get;
    use axum::Router;
    use tokio::net::TcpListener;

    const CHECK_PATH: &str = "modelderivative/v2/designdata/{urn}/metadata";

    #[derive(Clone, Default)]
    struct Upstream {
        hits: Arc<AtomicUsize>,
        seen: Arc<Mutex<Vec<String>>>,
    }

    async fn metadata(State(up): State<Upstream>, Path(urn): Path<String>, headers: HeaderMap) -> AxumStatus {
        up.hits.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut seen) = up.seen.lock() {
            seen.push(urn);
        }
        match headers.get("authorization").and_then(|v| v.to_str().ok()) {
            Some("Bearer good") => AxumStatus::OK,
            Some("Bearer gone") => AxumStatus::NOT_FOUND,
            Some(_) => AxumStatus::FORBIDDEN,
            None => AxumStatus::UNAUTHORIZED,
        }
    }

    async fn start_upstream() -> anyhow::Result<(String, Upstream)> {
        let up = Upstream::default();
        let app = Router::new()
            .route("/modelderivative/v2/designdata/:urn/metadata", get(metadata))
            .with_state(up.clone());
        let listener = TcpListener::bind((std::net::Ipv4Addr::LOCALHOST, 0)).await?;
        let addr = listener.local_addr()?;
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });
        Ok((format!("http://{addr}"), up))
    }

    fn authorizer(base: &str) -> Result<RemoteAuthorizer, AuthzError> {
        RemoteAuthorizer::with_client(reqwest::Client::new(), base, CHECK_PATH)
    }

    #[test]
    fn check_url_encodes_resource_as_one_segment() -> Result<(), AuthzError> {
        let authz = authorizer("https://developer.api.autodesk.com/")?;
        let url = authz.check_url("a/b c")?;
        assert_eq!(
            url.as_str(),
            "https://developer.api.autodesk.com/modelderivative/v2/designdata/a%2Fb%20c/metadata"
        );
        Ok(())
    }

    #[tokio::test]
    async fn ok_status_authorizes_and_forwards_header() -> anyhow::Result<()> {
        let (base, up) = start_upstream().await?;
        let authz = authorizer(&base)?;
        let decision = authz.check("Bearer good", "dXJuOmFiYw").await?;
        assert_eq!(decision, AuthDecision::Authorized);
        assert_eq!(up.hits.load(Ordering::SeqCst), 1);
        assert_eq!(up.seen.lock().map(|s| s.clone()).unwrap_or_default(), vec!["dXJuOmFiYw".to_string()]);
        Ok(())
    }

    #[tokio::test]
    async fn upstream_status_is_propagated() -> anyhow::Result<()> {
        let (base, _up) = start_upstream().await?;
        let authz = authorizer(&base)?;
        assert_eq!(
            authz.check("Bearer bad", "doc1").await?,
            AuthDecision::Denied { reason: DenialReason::Rejected, status: 403 }
        );
        assert_eq!(
            authz.check("Bearer gone", "doc1").await?,
            AuthDecision::Denied { reason: DenialReason::Rejected, status: 404 }
        );
        Ok(())
    }

    #[tokio::test]
    async fn every_check_is_a_fresh_round_trip() -> anyhow::Result<()> {
        let (base, up) = start_upstream().await?;
        let authz = authorizer(&base)?;
        authz.check("Bearer good", "doc1").await?;
        authz.check("Bearer good", "doc1").await?;
        authz.check("Bearer good", "doc2").await?;
        assert_eq!(up.hits.load(Ordering::SeqCst), 3);
        Ok(())
    }

    #[tokio::test]
    async fn unreachable_upstream_is_a_transport_error() -> anyhow::Result<()> {
        let listener = TcpListener::bind((std::net::Ipv4Addr::LOCALHOST, 0)).await?;
        let addr = listener.local_addr()?;
        drop(listener);
        let authz = authorizer(&format!("http://{addr}"))?;
        let res = authz.check("Bearer good", "doc1").await;
        assert!(matches!(res, Err(AuthzError::Transport(_))));
        Ok(())
    }

    #[tokio::test]
    async fn dot_segments_are_refused_locally() -> anyhow::Result<()> {
        let (base, up) = start_upstream().await?;
        let authz = authorizer(&base)?;
        assert_eq!(
            authz.check("Bearer good", "..").await?,
            AuthDecision::Denied { reason: DenialReason::Rejected, status: 400 }
        );
        assert_eq!(up.hits.load(Ordering::SeqCst), 0);
        Ok(())
    }
}
