//! # Breakthrough Beat
//!
//! A science and health news aggregator that pulls a fixed catalog of
//! RSS/Atom feeds plus query-driven search feeds, de-duplicates and enriches
//! the results, and emits a dated, browsable dataset.
//!
//! ## Pipeline
//!
//! 1. **Catalog**: search feeds (Google News, PubMed) first, then the static
//!    science/health list
//! 2. **Fetch**: one best-effort attempt per endpoint, concurrent with pacing
//! 3. **Normalize**: syndication payloads into uniform items with canonical
//!    UTC dates
//! 4. **Dedupe**: first-seen copy of a story wins, capped total
//! 5. **Enrich**: budgeted thumbnail extraction from story pages
//! 6. **Rank & partition**: newest first, grouped by `YYYY-MM`
//! 7. **Output**: `data/items.json`, per-month archive JSON, static site
//!
//! ## Usage
//!
//! ```sh
//! breakthrough_beat --query "longevity OR aging OR randomized trial"
//! ```
//!
//! Partial failure is the expected steady state: an unreachable feed or
//! story page only reduces the dataset, it never aborts the run.

use clap::Parser;
use std::error::Error;
use tracing::{error, info, instrument};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod catalog;
mod cli;
mod feed;
mod fetch;
mod models;
mod outputs;
mod pipeline;
mod thumbs;

use cli::Cli;
use outputs::{ensure_writable_dir, json, site};
use pipeline::AggregateOptions;

#[tokio::main]
#[instrument]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    info!("breakthrough_beat starting up");

    let args = Cli::parse();

    // Early check: ensure the output dir is writable before any network I/O
    if let Err(e) = ensure_writable_dir(&args.output_dir).await {
        error!(
            path = %args.output_dir,
            error = %e,
            "Output directory is not writable (fix perms or choose a different path)"
        );
        return Err(e);
    }

    // ---- Build the source catalog ----
    let base = match &args.feeds {
        Some(path) => catalog::load_feeds_file(path)?,
        None => catalog::base_feeds(),
    };
    let feeds = catalog::build_catalog(&args.query, base);
    info!(sources = feeds.len(), query = %args.query, "Catalog built");

    // ---- Run the pipeline ----
    let opts = AggregateOptions {
        max_total: args.max_total,
        thumb_budget: args.thumb_budget,
    };
    let items = pipeline::aggregate(&feeds, &opts).await;
    info!(count = items.len(), "Aggregation complete");

    let groups = pipeline::partition(&items);
    info!(groups = groups.len(), "Partitioned into archive groups");

    // ---- Emit the dataset and the site ----
    json::write_dataset(&items, &args.output_dir).await?;
    json::write_archive_groups(&groups, &args.output_dir).await?;
    site::write_shell(&args.output_dir).await?;
    site::write_archive_pages(&groups, &args.output_dir).await?;

    let elapsed = start_time.elapsed();
    info!(
        ?elapsed,
        secs = elapsed.as_secs(),
        items = items.len(),
        groups = groups.len(),
        "Execution complete"
    );

    Ok(())
}
