//! Delegated authorization.
//!
//! Whether a caller may touch a resource is decided by an external service. The
//! gateway only sees the [`Authorizer`] trait so tests can swap in
//! [`mock::StaticAuthorizer`].

pub mod mock;
pub mod remote;

use async_trait::async_trait;
use thiserror::Error;

pub use remote::RemoteAuthorizer;

/// Status reported when the caller presented no credential at all.
pub const MISSING_CREDENTIAL_STATUS: u16 = 401;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenialReason {
    MissingCredential,
    Rejected,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthDecision {
    Authorized,
    Denied { reason: DenialReason, status: u16 },
}

#[derive(Debug, Error)]
pub enum AuthzError {
    #[error("authorizer unreachable: {0}")]
    Transport(String),
    #[error("invalid authorizer configuration: {0}")]
    Config(String),
}

/// Decides whether `credential` grants access to `resource`.
///
/// Implementations must not cache decisions across resources.
#[async_trait]
pub trait Authorizer: Send + Sync {
    async fn check(&self, credential: &str, resource: &str) -> Result<AuthDecision, AuthzError>;
}

/// Run the check for a request. A missing or blank credential is denied with 401
/// without contacting the authorizer.
pub async fn authorize(
    authorizer: &dyn Authorizer,
    credential: Option<&str>,
    resource: &str,
) -> Result<AuthDecision, AuthzError> {
    match credential {
        Some(c) if !c.trim().is_empty() => authorizer.check(c, resource).await,
        _ => Ok(AuthDecision::Denied {
            reason: DenialReason::MissingCredential,
            status: MISSING_CREDENTIAL_STATUS,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::mock::StaticAuthorizer;
    use super::*;

    #[tokio::test]
    async fn missing_credential_never_reaches_authorizer() -> Result<(), AuthzError> {
        let authz = StaticAuthorizer::allow();
        for credential in [None, Some(""), Some("   ")] {
            let decision = authorize(&authz, credential, "doc1").await?;
            assert_eq!(
                decision,
                AuthDecision::Denied { reason: DenialReason::MissingCredential, status: 401 }
            );
        }
        assert_eq!(authz.calls(), 0);
        Ok(())
    }

    #[tokio::test]
    async fn present_credential_is_delegated() -> Result<(), AuthzError> {
        let authz = StaticAuthorizer::deny(403);
        let decision = authorize(&authz, Some("Bearer t"), "doc1").await?;
        assert_eq!(decision, AuthDecision::Denied { reason: DenialReason::Rejected, status: 403 });
        assert_eq!(authz.calls(), 1);
        assert_eq!(authz.last_call(), Some(("Bearer t".to_string(), "doc1".to_string())));
        Ok(())
    }
}
