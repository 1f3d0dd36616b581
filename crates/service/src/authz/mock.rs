//! Deterministic authorizer for tests and local runs.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use super::{AuthDecision, Authorizer, AuthzError, DenialReason};

pub struct StaticAuthorizer {
    decision: AuthDecision,
    calls: AtomicUsize,
    last: Mutex<Option<(String, String)>>,
}

impl StaticAuthorizer {
    pub fn allow() -> Self {
        Self::with_decision(AuthDecision::Authorized)
    }

    pub fn deny(status: u16) -> Self {
        Self::with_decision(AuthDecision::Denied { reason: DenialReason::Rejected, status })
    }

    pub fn with_decision(decision: AuthDecision) -> Self {
        Self { decision, calls: AtomicUsize::new(0), last: Mutex::new(None) }
    }

    /// Number of `check` invocations so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// The `(credential, resource)` pair of the most recent check.
    pub fn last_call(&self) -> Option<(String, String)> {
        self.last.lock().ok().and_then(|g| g.clone())
    }
}

#[async_trait]
impl Authorizer for StaticAuthorizer {
    async fn check(&self, credential: &str, resource: &str) -> Result<AuthDecision, AuthzError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut last) = self.last.lock() {
            *last = Some((credential.to_string(), resource.to_string()));
        }
        Ok(self.decision)
    }
}
