//! Shared types, error model, and configuration for waymark.
//!
//! This crate is the foundation depended on by all other waymark crates.
//! It provides:
//! - [`WaymarkError`] — the unified error type
//! - Domain types ([`Itinerary`], [`Day`], [`Place`], [`LiveData`], enriched counterparts)
//! - Configuration ([`AppConfig`], [`EnrichConfig`], config loading)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, DEFAULT_USER_AGENT, EnrichConfig, EnrichmentConfig, ScrapeConfig, SearchConfig,
    config_dir, config_file_path, init_config, load_config, load_config_from,
};
pub use error::{Result, WaymarkError};
pub use types::{Day, EnrichedDay, EnrichedItinerary, EnrichedPlace, Itinerary, LiveData, Place};
