//! Command-line interface definitions for Breakthrough Beat.
//!
//! This module defines the CLI arguments and options using the `clap` crate.

use clap::Parser;

/// Command-line arguments for the aggregator.
///
/// # Examples
///
/// ```sh
/// # Basic usage
/// breakthrough_beat --query "longevity OR aging OR randomized trial"
///
/// # Custom output directory and a smaller thumbnail budget
/// breakthrough_beat -q crispr -o ./site --thumb-budget 50
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Search query for the news and literature search feeds
    #[arg(short, long)]
    pub query: String,

    /// Output directory for the dataset and browsing site
    #[arg(short, long, default_value = "output")]
    pub output_dir: String,

    /// Optional YAML file replacing the built-in static feed list
    #[arg(short, long)]
    pub feeds: Option<String>,

    /// Maximum total items kept after de-duplication
    #[arg(long, default_value_t = 600)]
    pub max_total: usize,

    /// Maximum number of story pages fetched for thumbnails per run
    #[arg(long, default_value_t = 220)]
    pub thumb_budget: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parsing_defaults() {
        let cli = Cli::parse_from(["breakthrough_beat", "--query", "crispr"]);
        assert_eq!(cli.query, "crispr");
        assert_eq!(cli.output_dir, "output");
        assert_eq!(cli.max_total, 600);
        assert_eq!(cli.thumb_budget, 220);
        assert!(cli.feeds.is_none());
    }

    #[test]
    fn test_cli_short_flags() {
        let cli = Cli::parse_from([
            "breakthrough_beat",
            "-q",
            "longevity OR aging",
            "-o",
            "/tmp/site",
            "-f",
            "feeds.yaml",
        ]);
        assert_eq!(cli.query, "longevity OR aging");
        assert_eq!(cli.output_dir, "/tmp/site");
        assert_eq!(cli.feeds.as_deref(), Some("feeds.yaml"));
    }

    #[test]
    fn test_cli_overrides() {
        let cli = Cli::parse_from([
            "breakthrough_beat",
            "-q",
            "crispr",
            "--max-total",
            "100",
            "--thumb-budget",
            "0",
        ]);
        assert_eq!(cli.max_total, 100);
        assert_eq!(cli.thumb_budget, 0);
    }
}
