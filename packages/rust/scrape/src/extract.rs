//! Structured-data extraction from fetched pages.
//!
//! Pages that describe venues usually embed schema.org JSON-LD blocks
//! (`<script type="application/ld+json">`). Those are far more reliable
//! than free-text heuristics, so they are the extraction source here.
//! Parsing is tolerant throughout: a malformed block or an unexpected shape
//! means "field not found", never a failed extraction.

use scraper::{Html, Selector};
use serde_json::{Map, Value};
use tracing::warn;

/// Fields extracted from a page's structured data.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlaceFacts {
    pub operating_hours: Option<String>,
    pub rating: Option<String>,
    pub website_url: Option<String>,
}

impl PlaceFacts {
    /// Hours and rating are the fields worth scanning further blocks for;
    /// the website URL has a fallback.
    fn is_complete(&self) -> bool {
        self.operating_hours.is_some() && self.rating.is_some()
    }
}

/// Extract place facts from the JSON-LD blocks of `html`.
///
/// Only candidate objects whose `@type` is in `place_types` are considered.
/// Fields are filled opportunistically across candidates, first value wins;
/// the scan stops early once hours and rating are both filled.
pub fn extract_place_facts(html: &str, place_types: &[String]) -> PlaceFacts {
    let doc = Html::parse_document(html);
    let selector =
        Selector::parse(r#"script[type="application/ld+json"]"#).expect("ld+json selector");

    let mut facts = PlaceFacts::default();

    'blocks: for script in doc.select(&selector) {
        let raw = script.inner_html();

        let value: Value = match serde_json::from_str(&raw) {
            Ok(value) => value,
            Err(e) => {
                warn!(error = %e, "skipping malformed JSON-LD block");
                continue;
            }
        };

        for candidate in candidate_objects(&value) {
            if !is_place_type(candidate, place_types) {
                continue;
            }

            fill_facts(&mut facts, candidate);

            if facts.is_complete() {
                break 'blocks;
            }
        }
    }

    facts
}

/// Normalize a parsed block into its candidate objects: the members of a
/// `@graph` array if present, else the object itself, else the members of a
/// top-level array.
fn candidate_objects(value: &Value) -> Vec<&Map<String, Value>> {
    match value {
        Value::Object(obj) => match obj.get("@graph") {
            Some(Value::Array(items)) => items.iter().filter_map(Value::as_object).collect(),
            _ => vec![obj],
        },
        Value::Array(items) => items.iter().filter_map(Value::as_object).collect(),
        _ => Vec::new(),
    }
}

/// A candidate counts only when its `@type` is a string on the allow-list.
fn is_place_type(item: &Map<String, Value>, place_types: &[String]) -> bool {
    item.get("@type")
        .and_then(Value::as_str)
        .is_some_and(|t| place_types.iter().any(|allowed| allowed == t))
}

/// Fill any still-empty fact from this candidate.
fn fill_facts(facts: &mut PlaceFacts, item: &Map<String, Value>) {
    if facts.operating_hours.is_none() {
        if let Some(hours) = item.get("openingHours") {
            facts.operating_hours = stringify_hours(hours);
        }
    }

    if facts.rating.is_none() {
        facts.rating = item
            .get("aggregateRating")
            .and_then(|rating| rating.get("ratingValue"))
            .and_then(stringify_scalar);
    }

    if facts.website_url.is_none() {
        facts.website_url = item
            .get("url")
            .and_then(Value::as_str)
            .map(str::to_string);
    }
}

/// `openingHours` may be a list of spans or a single scalar.
fn stringify_hours(value: &Value) -> Option<String> {
    match value {
        Value::Array(parts) => {
            let joined: Vec<String> = parts.iter().filter_map(stringify_scalar).collect();
            if joined.is_empty() {
                None
            } else {
                Some(joined.join(", "))
            }
        }
        other => stringify_scalar(other),
    }
}

fn stringify_scalar(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
