//! HTTP fetching: a shared client, per-call timeouts, and a per-operation
//! error type.
//!
//! Every outbound request — feed endpoints and story pages alike — goes
//! through [`fetch_bytes`] with the fixed crawler User-Agent. A failure is
//! always local to the URL being fetched: callers log it and move on, they
//! never abort sibling fetches. There are no retries; one best-effort attempt
//! per source per run.

use once_cell::sync::Lazy;
use reqwest::{Client, StatusCode};
use std::fmt;
use std::time::Duration;
use tracing::debug;

/// Fixed identifying header sent on every request.
pub const USER_AGENT: &str = "Mozilla/5.0 (BreakthroughBeat/0.1; +GitHubPages Agent)";

/// Timeout for syndication feed fetches.
pub const FEED_TIMEOUT: Duration = Duration::from_secs(25);
/// Timeout for story page fetches during thumbnail enrichment.
pub const PAGE_TIMEOUT: Duration = Duration::from_secs(12);

static CLIENT: Lazy<Client> = Lazy::new(|| {
    Client::builder()
        .user_agent(USER_AGENT)
        .build()
        .expect("failed to build HTTP client")
});

/// Why a single fetch failed.
///
/// The pipeline's policy is to swallow these and continue, but the reason is
/// carried explicitly so failures stay observable in the logs.
#[derive(Debug)]
pub enum FetchError {
    /// Network error, timeout, or body read failure.
    Transport(reqwest::Error),
    /// The server answered with a non-2xx status.
    Status(StatusCode),
}

impl fmt::Display for FetchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchError::Transport(e) => write!(f, "transport error: {e}"),
            FetchError::Status(code) => write!(f, "unexpected status: {code}"),
        }
    }
}

impl std::error::Error for FetchError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            FetchError::Transport(e) => Some(e),
            FetchError::Status(_) => None,
        }
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(e: reqwest::Error) -> Self {
        FetchError::Transport(e)
    }
}

/// Fetch one URL, returning the raw body bytes.
///
/// Non-2xx responses are an error; redirects are followed by the client.
pub async fn fetch_bytes(url: &str, timeout: Duration) -> Result<Vec<u8>, FetchError> {
    let resp = CLIENT.get(url).timeout(timeout).send().await?;
    let status = resp.status();
    if !status.is_success() {
        return Err(FetchError::Status(status));
    }
    let body = resp.bytes().await?;
    debug!(%url, bytes = body.len(), "Fetched");
    Ok(body.to_vec())
}
