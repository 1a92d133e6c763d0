//! Bounded-concurrency itinerary enrichment.
//!
//! This crate ties discovery and scraping together into the end-to-end
//! pipeline: flatten an itinerary into places, enrich every place under a
//! global concurrency cap, and reassemble the results into the original
//! day/segment shape.

pub mod enrich;
mod task;

pub use enrich::{EnrichContext, EnrichProgress, SilentProgress, enrich_itinerary};
