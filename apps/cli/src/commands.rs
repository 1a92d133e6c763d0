//! CLI command definitions, routing, and tracing setup.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, eyre};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

use waymark_core::{EnrichContext, EnrichProgress, enrich_itinerary};
use waymark_discovery::HttpSearchProvider;
use waymark_shared::{AppConfig, EnrichConfig, Itinerary, init_config, load_config};

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// waymark — enrich travel itineraries with live place data.
#[derive(Parser)]
#[command(
    name = "waymark",
    version,
    about = "Enrich itinerary documents with live operating hours, ratings, and website URLs.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Enrich an itinerary document with live place data.
    Enrich {
        /// Path to the itinerary JSON document.
        input: PathBuf,

        /// Write the enriched JSON to this file instead of stdout.
        #[arg(short, long)]
        out: Option<PathBuf>,

        /// Maximum concurrent resolve/fetch operations.
        #[arg(long)]
        concurrency: Option<usize>,

        /// Per-request timeout in seconds.
        #[arg(long)]
        timeout_secs: Option<u64>,
    },

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "waymark=info",
        1 => "waymark=debug",
        _ => "waymark=trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .init();
        }
        LogFormat::Json => {
            fmt().json().with_env_filter(env_filter).init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Enrich {
            input,
            out,
            concurrency,
            timeout_secs,
        } => cmd_enrich(&input, out.as_deref(), concurrency, timeout_secs).await,
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init().await,
            ConfigAction::Show => cmd_config_show().await,
        },
    }
}

// ---------------------------------------------------------------------------
// enrich
// ---------------------------------------------------------------------------

async fn cmd_enrich(
    input: &Path,
    out: Option<&Path>,
    concurrency: Option<usize>,
    timeout_secs: Option<u64>,
) -> Result<()> {
    let app_config = load_config()?;

    // CLI flags override config file values.
    let mut enrich_config = EnrichConfig::from(&app_config);
    if let Some(n) = concurrency {
        if n == 0 {
            return Err(eyre!("--concurrency must be at least 1"));
        }
        enrich_config.concurrency = n;
    }
    if let Some(secs) = timeout_secs {
        enrich_config.request_timeout = Duration::from_secs(secs);
    }

    let content = std::fs::read_to_string(input)
        .map_err(|e| eyre!("cannot read '{}': {e}", input.display()))?;
    let itinerary: Itinerary = serde_json::from_str(&content)
        .map_err(|e| eyre!("invalid itinerary document: {e}"))?;

    let client = reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::limited(5))
        .build()
        .map_err(|e| eyre!("failed to build HTTP client: {e}"))?;

    let config = Arc::new(enrich_config);
    let search = Arc::new(HttpSearchProvider::new(client.clone(), Arc::clone(&config)));
    let ctx = Arc::new(EnrichContext::new(client, search, config));

    let place_count: usize = itinerary.days.iter().map(|day| day.segments.len()).sum();
    info!(
        title = %itinerary.title,
        days = itinerary.days.len(),
        places = place_count,
        "enriching itinerary"
    );

    let started = std::time::Instant::now();
    let reporter = CliProgress::new();
    let enriched = enrich_itinerary(&itinerary, ctx, &reporter).await;
    reporter.finish();

    let json = serde_json::to_string_pretty(&enriched)?;

    let failed = enriched
        .days
        .iter()
        .flat_map(|day| &day.segments)
        .filter(|segment| {
            segment
                .live_data
                .as_ref()
                .is_none_or(|live| live.error.is_some())
        })
        .count();

    match out {
        Some(path) => {
            std::fs::write(path, &json)
                .map_err(|e| eyre!("cannot write '{}': {e}", path.display()))?;

            println!();
            println!("  Itinerary enriched!");
            println!("  Title:    {}", enriched.title);
            println!("  Places:   {place_count}");
            println!("  Failed:   {failed}");
            println!("  Output:   {}", path.display());
            println!("  Time:     {:.1}s", started.elapsed().as_secs_f64());
            println!();
        }
        None => {
            // Keep stdout clean for piping.
            println!("{json}");
        }
    }

    info!(
        places = place_count,
        failed,
        elapsed_ms = started.elapsed().as_millis(),
        "enrichment finished"
    );

    Ok(())
}

// ---------------------------------------------------------------------------
// CLI progress reporter
// ---------------------------------------------------------------------------

/// CLI progress reporter using an indicatif spinner.
struct CliProgress {
    spinner: ProgressBar,
}

impl CliProgress {
    fn new() -> Self {
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {msg}")
                .unwrap()
                .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
        );
        spinner.enable_steady_tick(std::time::Duration::from_millis(80));
        Self { spinner }
    }

    fn finish(&self) {
        self.spinner.finish_and_clear();
    }
}

impl EnrichProgress for CliProgress {
    fn phase(&self, name: &str) {
        self.spinner.set_message(name.to_string());
    }

    fn place_done(&self, name: &str, current: usize, total: usize) {
        self.spinner
            .set_message(format!("Enriched [{current}/{total}] {name}"));
    }
}

// ---------------------------------------------------------------------------
// config
// ---------------------------------------------------------------------------

async fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

async fn cmd_config_show() -> Result<()> {
    let config: AppConfig = load_config()?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}
