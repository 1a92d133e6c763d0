//! waymark CLI — itinerary live-data enrichment tool.
//!
//! Takes an itinerary document (title, days, place segments) and enriches
//! every place with live web data: operating hours, rating, website URL.

mod commands;

use clap::Parser;
use color_eyre::eyre::Result;

use commands::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    commands::init_tracing(&cli);
    commands::run(cli).await
}
