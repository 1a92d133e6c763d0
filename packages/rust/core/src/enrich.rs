//! Itinerary enrichment orchestration: fan out one task per place under the
//! concurrency gate, fan the results back into the original nested shape.

use std::sync::Arc;

use chrono::Utc;
use reqwest::Client;
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tracing::{info, instrument, warn};

use waymark_discovery::SearchProvider;
use waymark_shared::{
    EnrichConfig, EnrichedDay, EnrichedItinerary, EnrichedPlace, Itinerary, LiveData, Place,
};

use crate::task;

// ---------------------------------------------------------------------------
// EnrichContext
// ---------------------------------------------------------------------------

/// Shared resources for one enrichment run: the pooled HTTP client, the
/// search collaborator, the concurrency gate, and the immutable config.
pub struct EnrichContext {
    pub client: Client,
    pub search: Arc<dyn SearchProvider>,
    pub config: Arc<EnrichConfig>,
    /// Bounds concurrent resolve/fetch chains across all tasks.
    pub(crate) gate: Arc<Semaphore>,
}

impl EnrichContext {
    pub fn new(client: Client, search: Arc<dyn SearchProvider>, config: Arc<EnrichConfig>) -> Self {
        // A zero-capacity gate would block every task forever.
        let gate = Arc::new(Semaphore::new(config.concurrency.max(1)));
        Self {
            client,
            search,
            config,
            gate,
        }
    }
}

// ---------------------------------------------------------------------------
// Progress reporting
// ---------------------------------------------------------------------------

/// Progress callbacks for reporting enrichment status.
pub trait EnrichProgress: Send + Sync {
    /// Called when entering a new phase.
    fn phase(&self, name: &str);
    /// Called when one place finishes (successfully or not).
    fn place_done(&self, name: &str, current: usize, total: usize);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl EnrichProgress for SilentProgress {
    fn phase(&self, _name: &str) {}
    fn place_done(&self, _name: &str, _current: usize, _total: usize) {}
}

// ---------------------------------------------------------------------------
// Orchestrator
// ---------------------------------------------------------------------------

/// Enrich every place of `itinerary` with live web data.
///
/// All places run concurrently, bounded only by the context's gate; one
/// place's failure never cancels or delays its siblings. The output mirrors
/// the input's day/segment count and order exactly: results are collected
/// in flattening order and reattached positionally, so two places with
/// identical name and note cannot collide.
#[instrument(skip_all, fields(title = %itinerary.title))]
pub async fn enrich_itinerary(
    itinerary: &Itinerary,
    ctx: Arc<EnrichContext>,
    progress: &dyn EnrichProgress,
) -> EnrichedItinerary {
    let places: Vec<Place> = itinerary
        .days
        .iter()
        .flat_map(|day| day.segments.iter().cloned())
        .collect();
    let total = places.len();

    if total == 0 {
        info!("itinerary has no segments, nothing to enrich");
        return reassemble(itinerary, Vec::new());
    }

    info!(
        places = total,
        concurrency = ctx.config.concurrency,
        "starting enrichment"
    );
    progress.phase("Enriching places");

    let names: Vec<String> = places.iter().map(|place| place.name.clone()).collect();

    let handles: Vec<JoinHandle<LiveData>> = places
        .into_iter()
        .map(|place| tokio::spawn(task::enrich_place(place, Arc::clone(&ctx))))
        .collect();

    // Await in spawn order; completion order underneath is unconstrained.
    let mut results: Vec<LiveData> = Vec::with_capacity(total);
    for (i, handle) in handles.into_iter().enumerate() {
        let live = match handle.await {
            Ok(live) => live,
            Err(e) => {
                warn!(place = %names[i], error = %e, "enrichment task aborted");
                LiveData::failed(Utc::now(), format!("enrichment task aborted: {e}"))
            }
        };
        progress.place_done(&names[i], i + 1, total);
        results.push(live);
    }

    let failed = results.iter().filter(|live| live.error.is_some()).count();
    info!(places = total, failed, "enrichment complete");

    reassemble(itinerary, results)
}

/// Walk the original nested structure and attach results positionally.
///
/// Results arrive in flattening order, so a single cursor suffices.
fn reassemble(itinerary: &Itinerary, results: Vec<LiveData>) -> EnrichedItinerary {
    let mut cursor = results.into_iter();

    EnrichedItinerary {
        title: itinerary.title.clone(),
        days: itinerary
            .days
            .iter()
            .map(|day| EnrichedDay {
                index: day.index,
                segments: day
                    .segments
                    .iter()
                    .map(|place| EnrichedPlace {
                        name: place.name.clone(),
                        note: place.note.clone(),
                        live_data: cursor.next(),
                    })
                    .collect(),
            })
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use async_trait::async_trait;
    use waymark_shared::{Day, Result, WaymarkError};

    // -----------------------------------------------------------------------
    // Test doubles
    // -----------------------------------------------------------------------

    /// Returns the same result text for every query.
    struct FixedProvider {
        text: String,
    }

    #[async_trait]
    impl SearchProvider for FixedProvider {
        async fn search(&self, _query: &str) -> Result<String> {
            Ok(self.text.clone())
        }
    }

    /// Fails queries containing `fail_marker`, answers the rest.
    struct FlakyProvider {
        fail_marker: String,
        text: String,
    }

    #[async_trait]
    impl SearchProvider for FlakyProvider {
        async fn search(&self, query: &str) -> Result<String> {
            if query.contains(&self.fail_marker) {
                return Err(WaymarkError::Resolution(
                    "search provider unreachable".into(),
                ));
            }
            Ok(self.text.clone())
        }
    }

    /// Tracks how many searches run at once.
    struct CountingProvider {
        active: AtomicUsize,
        max_active: AtomicUsize,
    }

    impl CountingProvider {
        fn new() -> Self {
            Self {
                active: AtomicUsize::new(0),
                max_active: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl SearchProvider for CountingProvider {
        async fn search(&self, _query: &str) -> Result<String> {
            let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_active.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(25)).await;
            self.active.fetch_sub(1, Ordering::SeqCst);
            Ok(String::new())
        }
    }

    /// Panics if the orchestrator launches any work.
    struct UnreachableProvider;

    #[async_trait]
    impl SearchProvider for UnreachableProvider {
        async fn search(&self, _query: &str) -> Result<String> {
            unreachable!("no search should run for an empty itinerary");
        }
    }

    /// Counts progress callbacks.
    struct CountingProgress {
        done: AtomicUsize,
    }

    impl EnrichProgress for CountingProgress {
        fn phase(&self, _name: &str) {}
        fn place_done(&self, _name: &str, _current: usize, _total: usize) {
            self.done.fetch_add(1, Ordering::SeqCst);
        }
    }

    // -----------------------------------------------------------------------
    // Helpers
    // -----------------------------------------------------------------------

    fn place(name: &str, note: &str) -> Place {
        Place {
            name: name.into(),
            note: note.into(),
        }
    }

    fn ctx(search: Arc<dyn SearchProvider>, config: EnrichConfig) -> Arc<EnrichContext> {
        Arc::new(EnrichContext::new(Client::new(), search, Arc::new(config)))
    }

    fn restaurant_fixture() -> String {
        std::fs::read_to_string("../../../fixtures/html/restaurant.html")
            .expect("read restaurant fixture")
    }

    // -----------------------------------------------------------------------
    // Orchestrator tests
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn empty_itinerary_echoes_shape_without_work() {
        let itinerary = Itinerary {
            title: "Quiet Trip".into(),
            days: vec![
                Day {
                    index: 1,
                    segments: vec![],
                },
                Day {
                    index: 2,
                    segments: vec![],
                },
            ],
        };

        let ctx = ctx(Arc::new(UnreachableProvider), EnrichConfig::default());
        let enriched = enrich_itinerary(&itinerary, ctx, &SilentProgress).await;

        assert_eq!(enriched.title, "Quiet Trip");
        assert_eq!(enriched.days.len(), 2);
        assert_eq!(enriched.days[0].index, 1);
        assert!(enriched.days.iter().all(|day| day.segments.is_empty()));
    }

    #[tokio::test]
    async fn enriches_all_places_preserving_shape() {
        let server = wiremock::MockServer::start().await;
        wiremock::Mock::given(wiremock::matchers::method("GET"))
            .respond_with(
                wiremock::ResponseTemplate::new(200).set_body_string(restaurant_fixture()),
            )
            .mount(&server)
            .await;

        let before = Utc::now();
        let itinerary = Itinerary {
            title: "Food Tour".into(),
            days: vec![
                Day {
                    index: 1,
                    segments: vec![place("Bistro A", "old town"), place("Cafe B", "riverside")],
                },
                Day {
                    index: 2,
                    segments: vec![place("Diner C", "station")],
                },
            ],
        };

        let provider = Arc::new(FixedProvider {
            text: format!("Best match: {}/page", server.uri()),
        });
        let progress = CountingProgress {
            done: AtomicUsize::new(0),
        };
        let enriched = enrich_itinerary(
            &itinerary,
            ctx(provider, EnrichConfig::default()),
            &progress,
        )
        .await;

        assert_eq!(enriched.days.len(), 2);
        assert_eq!(enriched.days[0].segments.len(), 2);
        assert_eq!(enriched.days[1].segments.len(), 1);
        assert_eq!(enriched.days[0].segments[1].name, "Cafe B");
        assert_eq!(progress.done.load(Ordering::SeqCst), 3);

        for day in &enriched.days {
            for segment in &day.segments {
                let live = segment.live_data.as_ref().expect("live data attached");
                assert_eq!(live.error, None);
                assert_eq!(live.rating.as_deref(), Some("4.7"));
                assert!(live.scraped_at >= before);
            }
        }
    }

    #[tokio::test]
    async fn duplicate_places_each_keep_their_own_result() {
        let server = wiremock::MockServer::start().await;
        wiremock::Mock::given(wiremock::matchers::method("GET"))
            .respond_with(
                wiremock::ResponseTemplate::new(200).set_body_string(restaurant_fixture()),
            )
            .mount(&server)
            .await;

        let twin = place("Twin Cafe", "same note");
        let itinerary = Itinerary {
            title: "Twins".into(),
            days: vec![Day {
                index: 1,
                segments: vec![twin.clone(), twin],
            }],
        };

        let provider = Arc::new(FixedProvider {
            text: format!("{}/page", server.uri()),
        });
        let enriched = enrich_itinerary(
            &itinerary,
            ctx(provider, EnrichConfig::default()),
            &SilentProgress,
        )
        .await;

        let segments = &enriched.days[0].segments;
        assert_eq!(segments.len(), 2);
        assert!(segments[0].live_data.is_some());
        assert!(segments[1].live_data.is_some());
    }

    #[tokio::test]
    async fn one_failing_place_does_not_affect_siblings() {
        let server = wiremock::MockServer::start().await;
        wiremock::Mock::given(wiremock::matchers::method("GET"))
            .respond_with(
                wiremock::ResponseTemplate::new(200).set_body_string(restaurant_fixture()),
            )
            .mount(&server)
            .await;

        let itinerary = Itinerary {
            title: "Mixed Luck".into(),
            days: vec![Day {
                index: 1,
                segments: vec![place("Doomed Bar", "nowhere"), place("Lucky Cafe", "center")],
            }],
        };

        let provider = Arc::new(FlakyProvider {
            fail_marker: "Doomed Bar".into(),
            text: format!("{}/page", server.uri()),
        });
        let enriched = enrich_itinerary(
            &itinerary,
            ctx(provider, EnrichConfig::default()),
            &SilentProgress,
        )
        .await;

        let segments = &enriched.days[0].segments;

        let doomed = segments[0].live_data.as_ref().unwrap();
        assert!(doomed.error.as_deref().unwrap().contains("unreachable"));
        assert_eq!(doomed.operating_hours, None);
        assert_eq!(doomed.website_url, None);

        let lucky = segments[1].live_data.as_ref().unwrap();
        assert_eq!(lucky.error, None);
        assert_eq!(lucky.rating.as_deref(), Some("4.7"));
    }

    #[tokio::test]
    async fn urlless_search_results_fail_resolution_without_fetching() {
        let server = wiremock::MockServer::start().await;
        // The pipeline must never reach the page server.
        wiremock::Mock::given(wiremock::matchers::method("GET"))
            .respond_with(wiremock::ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let itinerary = Itinerary {
            title: "Dead End".into(),
            days: vec![Day {
                index: 1,
                segments: vec![place("Ghost Spot", "unknown")],
            }],
        };

        let provider = Arc::new(FixedProvider {
            text: "Sorry, nothing matched your query.".into(),
        });
        let enriched = enrich_itinerary(
            &itinerary,
            ctx(provider, EnrichConfig::default()),
            &SilentProgress,
        )
        .await;

        let live = enriched.days[0].segments[0].live_data.as_ref().unwrap();
        assert!(live.error.as_deref().unwrap().contains("no suitable URL"));
        assert_eq!(live.website_url, None);
    }

    #[tokio::test]
    async fn fetch_failures_become_item_errors() {
        // Connection refused: nothing listens on port 1.
        let itinerary = Itinerary {
            title: "Unlucky".into(),
            days: vec![Day {
                index: 1,
                segments: vec![place("Refused Cafe", "somewhere")],
            }],
        };

        let provider = Arc::new(FixedProvider {
            text: "http://127.0.0.1:1/page".into(),
        });
        let enriched = enrich_itinerary(
            &itinerary,
            ctx(provider, EnrichConfig::default()),
            &SilentProgress,
        )
        .await;

        let live = enriched.days[0].segments[0].live_data.as_ref().unwrap();
        assert!(live.error.as_deref().unwrap().contains("network error"));
        assert_eq!(live.operating_hours, None);
        assert_eq!(live.rating, None);
        assert_eq!(live.website_url, None);
    }

    #[tokio::test]
    async fn slow_page_times_out_as_item_error() {
        let server = wiremock::MockServer::start().await;
        wiremock::Mock::given(wiremock::matchers::method("GET"))
            .respond_with(
                wiremock::ResponseTemplate::new(200)
                    .set_delay(Duration::from_millis(500))
                    .set_body_string("late"),
            )
            .mount(&server)
            .await;

        let itinerary = Itinerary {
            title: "Slowpoke".into(),
            days: vec![Day {
                index: 1,
                segments: vec![place("Sleepy Inn", "uphill")],
            }],
        };

        let config = EnrichConfig {
            request_timeout: Duration::from_millis(50),
            ..EnrichConfig::default()
        };
        let provider = Arc::new(FixedProvider {
            text: format!("{}/page", server.uri()),
        });
        let enriched = enrich_itinerary(&itinerary, ctx(provider, config), &SilentProgress).await;

        let live = enriched.days[0].segments[0].live_data.as_ref().unwrap();
        assert!(live.error.as_deref().unwrap().contains("timed out"));
        assert_eq!(live.rating, None);
    }

    #[tokio::test]
    async fn gate_bounds_concurrent_operations() {
        let itinerary = Itinerary {
            title: "Crowd".into(),
            days: vec![Day {
                index: 1,
                segments: (0..8)
                    .map(|i| place(&format!("Spot {i}"), "busy street"))
                    .collect(),
            }],
        };

        let provider = Arc::new(CountingProvider::new());
        let config = EnrichConfig {
            concurrency: 2,
            ..EnrichConfig::default()
        };
        let enriched = enrich_itinerary(
            &itinerary,
            ctx(Arc::clone(&provider) as Arc<dyn SearchProvider>, config),
            &SilentProgress,
        )
        .await;

        assert_eq!(enriched.days[0].segments.len(), 8);
        assert!(provider.max_active.load(Ordering::SeqCst) <= 2);
    }
}
