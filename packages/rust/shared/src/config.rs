//! Application configuration for waymark.
//!
//! User config lives at `~/.waymark/waymark.toml`.
//! CLI flags override config file values, which override defaults.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Result, WaymarkError};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "waymark.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".waymark";

/// Built-in user agent used when the configured pool is empty.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/109.0.0.0 Safari/537.36";

// ---------------------------------------------------------------------------
// Config structs (matching waymark.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Enrichment pipeline settings.
    #[serde(default)]
    pub enrichment: EnrichmentConfig,

    /// Source URL discovery settings.
    #[serde(default)]
    pub search: SearchConfig,

    /// Page scraping settings.
    #[serde(default)]
    pub scrape: ScrapeConfig,
}

/// `[enrichment]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnrichmentConfig {
    /// Maximum concurrent resolve/fetch operations.
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    /// Timeout in seconds for each outbound request.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl Default for EnrichmentConfig {
    fn default() -> Self {
        Self {
            concurrency: default_concurrency(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

fn default_concurrency() -> usize {
    8
}
fn default_request_timeout_secs() -> u64 {
    10
}

/// `[search]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Search endpoint queried with `?q=<query>`; the response body is
    /// treated as free text that may contain URLs.
    #[serde(default = "default_search_endpoint")]
    pub endpoint: String,

    /// Domains preferred when picking a URL out of search results,
    /// scanned in order.
    #[serde(default = "default_preferred_domains")]
    pub preferred_domains: Vec<String>,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            endpoint: default_search_endpoint(),
            preferred_domains: default_preferred_domains(),
        }
    }
}

fn default_search_endpoint() -> String {
    "https://html.duckduckgo.com/html/".into()
}
fn default_preferred_domains() -> Vec<String> {
    ["maps.google.com", "tripadvisor.com", "yelp.com"]
        .map(String::from)
        .to_vec()
}

/// `[scrape]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScrapeConfig {
    /// User agents rotated across scraping requests.
    #[serde(default = "default_user_agents")]
    pub user_agents: Vec<String>,

    /// JSON-LD `@type` values accepted as place-like entities.
    #[serde(default = "default_place_types")]
    pub place_types: Vec<String>,
}

impl Default for ScrapeConfig {
    fn default() -> Self {
        Self {
            user_agents: default_user_agents(),
            place_types: default_place_types(),
        }
    }
}

fn default_user_agents() -> Vec<String> {
    [
        "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/109.0.0.0 Safari/537.36",
        "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/109.0.0.0 Safari/537.36",
        "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/110.0.0.0 Safari/537.36",
        "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/16.3 Safari/605.1.15",
        "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/109.0.0.0 Safari/537.36",
    ]
    .map(String::from)
    .to_vec()
}

fn default_place_types() -> Vec<String> {
    [
        "Place",
        "LocalBusiness",
        "Restaurant",
        "TouristAttraction",
        "Museum",
    ]
    .map(String::from)
    .to_vec()
}

// ---------------------------------------------------------------------------
// Enrich config (runtime, merged from config + CLI flags)
// ---------------------------------------------------------------------------

/// Runtime enrichment configuration — merged from config file + CLI flags,
/// immutable for the duration of a run and passed explicitly to components.
#[derive(Debug, Clone)]
pub struct EnrichConfig {
    /// Maximum concurrent resolve/fetch operations.
    pub concurrency: usize,
    /// Per-request timeout.
    pub request_timeout: Duration,
    /// Search endpoint base URL.
    pub search_endpoint: String,
    /// Preferred domains for URL picking, scanned in order.
    pub preferred_domains: Vec<String>,
    /// User agent pool.
    pub user_agents: Vec<String>,
    /// JSON-LD `@type` allow-list.
    pub place_types: Vec<String>,
}

impl From<&AppConfig> for EnrichConfig {
    fn from(config: &AppConfig) -> Self {
        Self {
            concurrency: config.enrichment.concurrency,
            request_timeout: Duration::from_secs(config.enrichment.request_timeout_secs),
            search_endpoint: config.search.endpoint.clone(),
            preferred_domains: config.search.preferred_domains.clone(),
            user_agents: config.scrape.user_agents.clone(),
            place_types: config.scrape.place_types.clone(),
        }
    }
}

impl Default for EnrichConfig {
    fn default() -> Self {
        Self::from(&AppConfig::default())
    }
}

impl EnrichConfig {
    /// Pick a user agent from the pool, falling back to the built-in
    /// default when the pool is empty.
    pub fn user_agent(&self) -> &str {
        if self.user_agents.is_empty() {
            return DEFAULT_USER_AGENT;
        }
        &self.user_agents[fastrand::usize(..self.user_agents.len())]
    }
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.waymark/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| WaymarkError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.waymark/waymark.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| WaymarkError::io(path, e))?;

    toml::from_str(&content)
        .map_err(|e| WaymarkError::config(format!("failed to parse {}: {e}", path.display())))
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| WaymarkError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| WaymarkError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| WaymarkError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}
