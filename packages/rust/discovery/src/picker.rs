//! Search-result URL selection.
//!
//! Search providers return free text; this module pulls the absolute URLs
//! out of it and picks the most promising one: the first URL on a preferred
//! domain, else the first URL found.

use regex::Regex;
use std::sync::LazyLock;
use tracing::debug;

/// Matches absolute http/https URLs embedded in free text.
static URL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"https?://[^\s/$.?#].[^\s]*").expect("URL regex")
});

/// Pick the best URL out of a search-result blob.
///
/// Preferred domains are scanned in order; the first domain that appears as
/// a substring of any extracted URL wins, and the first extracted URL
/// containing it is returned. With no preferred match the first URL found
/// wins. Returns `None` when the text contains no URLs at all.
///
/// Deterministic and side-effect-free.
pub fn pick_best_url(search_results: &str, preferred_domains: &[String]) -> Option<String> {
    let urls: Vec<&str> = URL_RE
        .find_iter(search_results)
        .map(|m| m.as_str())
        .collect();

    if urls.is_empty() {
        return None;
    }

    for domain in preferred_domains {
        if let Some(url) = urls.iter().find(|url| url.contains(domain.as_str())) {
            debug!(%url, %domain, "picked preferred-domain URL");
            return Some((*url).to_string());
        }
    }

    debug!(url = urls[0], "no preferred domain matched, falling back to first URL");
    Some(urls[0].to_string())
}
