//! Core domain types for waymark itineraries.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Input types
// ---------------------------------------------------------------------------

/// A single point of interest to be enriched, as given in the request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Place {
    /// Place name, e.g. "Eiffel Tower".
    pub name: String,
    /// Additional context, e.g. "Paris, France" or a user-provided note.
    pub note: String,
}

/// One day of an itinerary, containing an ordered list of places.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Day {
    /// Day number within the itinerary.
    pub index: u32,
    /// Places to visit, in order. Order is preserved end-to-end.
    pub segments: Vec<Place>,
}

/// The root input document. Read-only during enrichment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Itinerary {
    pub title: String,
    pub days: Vec<Day>,
}

// ---------------------------------------------------------------------------
// Output types
// ---------------------------------------------------------------------------

/// Live data scraped for a single place.
///
/// Data fields and `error` are mutually exclusive in practice: a failed
/// attempt carries only `error`, a successful one carries whatever the page
/// declared (all data fields may still be `None` if the page had nothing).
/// `scraped_at` always marks when the attempt began. Fields serialize as
/// explicit nulls so the response shape is stable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiveData {
    pub operating_hours: Option<String>,
    pub rating: Option<String>,
    pub website_url: Option<String>,
    pub scraped_at: DateTime<Utc>,
    pub error: Option<String>,
}

impl LiveData {
    /// Live data for a failed attempt: only `error` and `scraped_at` set.
    pub fn failed(scraped_at: DateTime<Utc>, error: impl Into<String>) -> Self {
        Self {
            operating_hours: None,
            rating: None,
            website_url: None,
            scraped_at,
            error: Some(error.into()),
        }
    }
}

/// A [`Place`] plus the live data scraped for it.
///
/// `live_data` is `None` only when a result could not be attached during
/// reassembly; positional reassembly makes that unreachable, but the field
/// stays optional to keep the serialized shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnrichedPlace {
    pub name: String,
    pub note: String,
    pub live_data: Option<LiveData>,
}

/// A day composed of enriched places.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnrichedDay {
    pub index: u32,
    pub segments: Vec<EnrichedPlace>,
}

/// The final enriched itinerary, mirroring the input's nested shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnrichedItinerary {
    pub title: String,
    pub days: Vec<EnrichedDay>,
}
