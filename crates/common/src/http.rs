//! Process-wide outbound HTTP client.
//!
//! The client is built on first use and reused for the lifetime of the process.
//! `reqwest::Client` is internally reference counted and safe to share across tasks.

use std::time::Duration;

use once_cell::sync::OnceCell;
use tracing::info;

static CLIENT: OnceCell<reqwest::Client> = OnceCell::new();

/// Return the shared client, building it with `timeout` on the first call.
///
/// Later calls ignore `timeout` and hand back the client built first.
pub fn shared_client(timeout: Duration) -> Result<&'static reqwest::Client, reqwest::Error> {
    CLIENT.get_or_try_init(|| {
        info!(timeout_ms = timeout.as_millis() as u64, "building shared http client");
        reqwest::Client::builder().timeout(timeout).build()
    })
}
