//! Single-page HTTP fetching.

use std::time::Duration;

use reqwest::Client;
use reqwest::header::USER_AGENT;
use tracing::debug;
use url::Url;

use waymark_shared::{Result, WaymarkError};

/// Fetch one page and return its body as text.
///
/// Issues a single GET on the shared pooled client with a per-request
/// timeout and user-agent header; redirects follow the client's policy.
/// Non-success terminal statuses, timeouts, and connection failures are all
/// classified as network errors. Never retries.
pub async fn fetch_html(
    client: &Client,
    url: &Url,
    timeout: Duration,
    user_agent: &str,
) -> Result<String> {
    debug!(%url, "fetching page");

    let response = client
        .get(url.as_str())
        .timeout(timeout)
        .header(USER_AGENT, user_agent)
        .send()
        .await
        .map_err(|e| classify_send_error(url, &e))?;

    let status = response.status();
    if !status.is_success() {
        return Err(WaymarkError::Network(format!("{url}: HTTP {status}")));
    }

    response
        .text()
        .await
        .map_err(|e| WaymarkError::Network(format!("{url}: body read failed: {e}")))
}

/// Keep timeout and connection failures distinguishable by message.
fn classify_send_error(url: &Url, e: &reqwest::Error) -> WaymarkError {
    if e.is_timeout() {
        WaymarkError::Network(format!("{url}: request timed out: {e}"))
    } else if e.is_connect() {
        WaymarkError::Network(format!("{url}: connection failed: {e}"))
    } else {
        WaymarkError::Network(format!("{url}: {e}"))
    }
}
