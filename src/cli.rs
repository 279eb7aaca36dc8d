// src/cli.rs
// =============================================================================
// This file defines our command-line interface using the `clap` crate.
//
// Two subcommands:
// - analyze: crawl one site and print its readiness report
// - compare: analyze two sites and print how the first one stacks up
//
// Both share the same crawl flags, which live in CrawlArgs and get pulled
// into each subcommand with #[command(flatten)].
//
// Rust concepts:
// - Derive macros: clap generates the parser from these types
// - Option<T>: a flag the user didn't pass stays None, so the engine's own
//   default applies
// =============================================================================

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use site_readiness::AnalyzeOptions;

// The whole CLI: one subcommand plus global flags
#[derive(Parser, Debug)]
#[command(
    name = "site-readiness",
    version,
    about = "Score how ready a website is for AI-powered search",
    long_about = "site-readiness crawls a website, measures how its pages are structured \
                  (headings, depth, schema markup, FAQ content, readability) and prints a \
                  0-100 readiness score with prioritized recommendations."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Show debug logs on stderr
    ///
    /// RUST_LOG overrides this when set.
    #[arg(long, short, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Crawl a website and print its readiness report
    ///
    /// Example: site-readiness analyze https://example.com --max-pages 20
    Analyze {
        /// Website URL to analyze (e.g., https://example.com)
        url: String,

        #[command(flatten)]
        crawl: CrawlArgs,

        /// Exit with code 1 when the score is below this value
        ///
        /// Handy in CI: `--fail-under 60` fails the build on a weak score.
        #[arg(long, default_value_t = 0)]
        fail_under: u8,
    },

    /// Analyze two websites and show the score differences
    ///
    /// Example: site-readiness compare https://example.com https://competitor.com
    Compare {
        /// Your website
        url: String,

        /// The website to compare against
        competitor_url: String,

        #[command(flatten)]
        crawl: CrawlArgs,
    },
}

/// Crawl and output flags shared by every subcommand.
#[derive(Args, Debug, Clone)]
pub struct CrawlArgs {
    /// Maximum number of pages to fetch (default: 10)
    #[arg(long)]
    pub max_pages: Option<usize>,

    /// Maximum number of simultaneous requests (default: 5)
    #[arg(long)]
    pub max_concurrency: Option<usize>,

    /// Maximum link depth from the start page (default: 3)
    #[arg(long)]
    pub max_depth: Option<usize>,

    /// Per-request timeout in milliseconds (default: 10000)
    #[arg(long)]
    pub timeout_ms: Option<u64>,

    /// Pause after each request in milliseconds (default: 100, 0 disables)
    #[arg(long)]
    pub delay_ms: Option<u64>,

    /// Also queue pages listed in robots.txt and sitemap.xml
    #[arg(long)]
    pub sitemaps: bool,

    /// TOML file with custom weights and thresholds
    #[arg(long, value_name = "FILE")]
    pub rubric: Option<PathBuf>,

    /// Output results in JSON format instead of a table
    #[arg(long)]
    pub json: bool,
}

impl CrawlArgs {
    pub fn options(&self) -> AnalyzeOptions {
        AnalyzeOptions {
            max_pages: self.max_pages,
            max_concurrency: self.max_concurrency,
            max_depth: self.max_depth,
            timeout_ms: self.timeout_ms,
            request_delay_ms: self.delay_ms,
            use_sitemaps: self.sitemaps.then_some(true),
        }
    }
}


// -----------------------------------------------------------------------------
// BEGINNER NOTES:
//
// 1. Why Option<usize> instead of default_value_t?
//    - None means "the user didn't say", which lets the library decide
//    - The defaults then live in one place (src/config.rs)
//
// 2. What does #[command(flatten)] do?
//    - It copies every flag from CrawlArgs into the subcommand
//    - Both `analyze` and `compare` accept --max-pages, --json, etc.
//
// 3. What does global = true mean?
//    - The flag can appear before or after the subcommand name
//    - `site-readiness -v analyze URL` and `site-readiness analyze URL -v`
//      both work
// -----------------------------------------------------------------------------
