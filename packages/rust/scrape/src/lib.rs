//! Page fetching and structured-data extraction.
//!
//! This crate provides:
//! - [`fetch`] — single-GET page fetching over a shared pooled client
//! - [`extract`] — JSON-LD place-fact extraction
//! - [`scrape_place`] — the composition of both for one place page

pub mod extract;
pub mod fetch;

use std::time::Duration;

use reqwest::Client;
use tracing::{info, instrument};
use url::Url;

use waymark_shared::Result;

pub use extract::{PlaceFacts, extract_place_facts};
pub use fetch::fetch_html;

/// Options for scraping one page.
#[derive(Debug, Clone)]
pub struct ScrapeOptions {
    /// Per-request timeout.
    pub timeout: Duration,
    /// User agent sent with the request.
    pub user_agent: String,
    /// JSON-LD `@type` allow-list.
    pub place_types: Vec<String>,
}

/// Fetch `url` and extract place facts from its structured data.
///
/// A fetched page is considered its own canonical source: when the
/// structured data declares no website URL, the fetched URL is used.
#[instrument(skip_all, fields(url = %url))]
pub async fn scrape_place(client: &Client, url: &Url, opts: &ScrapeOptions) -> Result<PlaceFacts> {
    let html = fetch_html(client, url, opts.timeout, &opts.user_agent).await?;

    let mut facts = extract_place_facts(&html, &opts.place_types);
    if facts.website_url.is_none() {
        facts.website_url = Some(url.to_string());
    }

    info!(
        hours = facts.operating_hours.is_some(),
        rating = facts.rating.is_some(),
        "scraped place page"
    );

    Ok(facts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use waymark_shared::WaymarkError;

    fn opts() -> ScrapeOptions {
        ScrapeOptions {
            timeout: Duration::from_secs(5),
            user_agent: "waymark-test".into(),
            place_types: [
                "Place",
                "LocalBusiness",
                "Restaurant",
                "TouristAttraction",
                "Museum",
            ]
            .map(String::from)
            .to_vec(),
        }
    }

    fn load_fixture(name: &str) -> String {
        let path = format!("../../../fixtures/html/{name}");
        std::fs::read_to_string(&path).unwrap_or_else(|_| panic!("missing fixture: {path}"))
    }

    #[tokio::test]
    async fn scrape_extracts_declared_fields() {
        let server = wiremock::MockServer::start().await;

        wiremock::Mock::given(wiremock::matchers::method("GET"))
            .and(wiremock::matchers::path("/restaurant"))
            .respond_with(
                wiremock::ResponseTemplate::new(200)
                    .set_body_string(load_fixture("restaurant.html")),
            )
            .mount(&server)
            .await;

        let url = Url::parse(&format!("{}/restaurant", server.uri())).unwrap();
        let facts = scrape_place(&Client::new(), &url, &opts()).await.unwrap();

        assert_eq!(
            facts.operating_hours.as_deref(),
            Some("Mo-Fr 11:00-22:00, Sa-Su 10:00-23:00")
        );
        assert_eq!(facts.rating.as_deref(), Some("4.7"));
        // The declared canonical URL wins over the fetched one.
        assert_eq!(facts.website_url.as_deref(), Some("https://official-x.com"));
    }

    #[tokio::test]
    async fn scrape_defaults_website_url_to_fetched_page() {
        let server = wiremock::MockServer::start().await;

        wiremock::Mock::given(wiremock::matchers::method("GET"))
            .and(wiremock::matchers::path("/plain"))
            .respond_with(
                wiremock::ResponseTemplate::new(200).set_body_string(load_fixture("plain.html")),
            )
            .mount(&server)
            .await;

        let url = Url::parse(&format!("{}/plain", server.uri())).unwrap();
        let facts = scrape_place(&Client::new(), &url, &opts()).await.unwrap();

        assert_eq!(facts.operating_hours, None);
        assert_eq!(facts.rating, None);
        assert_eq!(facts.website_url.as_deref(), Some(url.as_str()));
    }

    #[tokio::test]
    async fn scrape_propagates_fetch_failure() {
        let server = wiremock::MockServer::start().await;

        wiremock::Mock::given(wiremock::matchers::method("GET"))
            .respond_with(wiremock::ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let url = Url::parse(&server.uri()).unwrap();
        let err = scrape_place(&Client::new(), &url, &opts()).await.unwrap_err();
        assert!(matches!(err, WaymarkError::Network(_)));
    }
}
