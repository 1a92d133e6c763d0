//! Source URL discovery for places.
//!
//! Enrichment needs one page URL per place. The [`SearchProvider`] trait is
//! the contract with the outbound search collaborator: one free-text query
//! in, a free-text blob out, with no structure assumed beyond "text that may
//! contain URLs". [`pick_best_url`] then selects the URL to scrape.
//!
//! The trait is object-safe so orchestration code can take
//! `Arc<dyn SearchProvider>` and tests can substitute a mock.

mod picker;

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::USER_AGENT;
use tracing::{debug, instrument};

use waymark_shared::{EnrichConfig, Result, WaymarkError};

pub use picker::pick_best_url;

/// Outbound URL-discovery collaborator.
#[async_trait]
pub trait SearchProvider: Send + Sync {
    /// Run one search and return the raw result text.
    async fn search(&self, query: &str) -> Result<String>;
}

/// Search provider backed by an HTML search endpoint queried over HTTP.
///
/// Issues `GET <endpoint>?q=<query>` through the shared client with a
/// rotated user agent and the configured per-request timeout; the response
/// body is returned as-is. Any transport failure or non-success status is a
/// resolution error.
pub struct HttpSearchProvider {
    client: Client,
    config: Arc<EnrichConfig>,
}

impl HttpSearchProvider {
    pub fn new(client: Client, config: Arc<EnrichConfig>) -> Self {
        Self { client, config }
    }
}

#[async_trait]
impl SearchProvider for HttpSearchProvider {
    #[instrument(skip_all)]
    async fn search(&self, query: &str) -> Result<String> {
        debug!(endpoint = %self.config.search_endpoint, "querying search endpoint");

        let response = self
            .client
            .get(&self.config.search_endpoint)
            .query(&[("q", query)])
            .timeout(self.config.request_timeout)
            .header(USER_AGENT, self.config.user_agent())
            .send()
            .await
            .map_err(|e| WaymarkError::Resolution(format!("search request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(WaymarkError::Resolution(format!(
                "search endpoint returned HTTP {status}"
            )));
        }

        response
            .text()
            .await
            .map_err(|e| WaymarkError::Resolution(format!("failed to read search response: {e}")))
    }
}
