//! Per-place enrichment task.
//!
//! One task resolves a source URL for its place, scrapes it, and assembles
//! the live data. The task is infallible by contract: every failure mode is
//! folded into an error-carrying [`LiveData`] for this single place, so no
//! failure ever reaches sibling tasks.

use std::sync::Arc;

use chrono::Utc;
use tracing::{info, instrument, warn};
use url::Url;

use waymark_discovery::pick_best_url;
use waymark_scrape::{PlaceFacts, ScrapeOptions, scrape_place};
use waymark_shared::{LiveData, Place, Result, WaymarkError};

use crate::enrich::EnrichContext;

/// Enrich one place end to end.
///
/// Holds a concurrency-gate slot for the whole resolve/fetch chain; the
/// permit drops on every exit path.
#[instrument(skip_all, fields(place = %place.name))]
pub(crate) async fn enrich_place(place: Place, ctx: Arc<EnrichContext>) -> LiveData {
    let started_at = Utc::now();

    let _permit = ctx
        .gate
        .clone()
        .acquire_owned()
        .await
        .expect("semaphore closed");

    match resolve_and_scrape(&place, &ctx).await {
        Ok(facts) => LiveData {
            operating_hours: facts.operating_hours,
            rating: facts.rating,
            website_url: facts.website_url,
            scraped_at: started_at,
            error: None,
        },
        Err(e) => {
            warn!(error = %e, "enrichment failed for place");
            LiveData::failed(started_at, e.to_string())
        }
    }
}

/// Resolve a source URL via search, then scrape it.
async fn resolve_and_scrape(place: &Place, ctx: &EnrichContext) -> Result<PlaceFacts> {
    let query = format!(
        r#""{}" "{}" official website hours rating"#,
        place.name, place.note
    );

    info!("resolving source URL");
    let results = match ctx.search.search(&query).await {
        Ok(results) => results,
        Err(e) => {
            warn!(error = %e, "search provider failed");
            return Err(e);
        }
    };

    // Distinct from a provider failure: the provider answered, but with
    // nothing usable.
    let Some(picked) = pick_best_url(&results, &ctx.config.preferred_domains) else {
        info!("search results contained no usable URL");
        return Err(WaymarkError::Resolution(
            "no suitable URL found in search results".into(),
        ));
    };

    let url = Url::parse(&picked)
        .map_err(|e| WaymarkError::validation(format!("picked URL '{picked}' is invalid: {e}")))?;

    info!(%url, "scraping resolved URL");
    let opts = ScrapeOptions {
        timeout: ctx.config.request_timeout,
        user_agent: ctx.config.user_agent().to_string(),
        place_types: ctx.config.place_types.clone(),
    };

    scrape_place(&ctx.client, &url, &opts).await
}
