// src/main.rs
// =============================================================================
// This is the entry point of our CLI application.
//
// What happens here:
// 1. Parse command-line arguments using clap
// 2. Set up logging (tracing) on stderr
// 3. Dispatch to the appropriate subcommand handler
// 4. Print the report as a table or JSON on stdout
// 5. Exit with proper code (0 = success, 1 = score below --fail-under,
//    2 = error)
//
// All the real work lives in the library (src/lib.rs). This file only
// turns flags into a CrawlRequest and a report into text.
//
// Rust concepts used:
// - async/await: the crawler makes many network requests concurrently
// - anyhow::Context: adds a human-readable line on top of library errors
// - tokio::join!: runs two analyses at the same time for `compare`
// =============================================================================

mod cli;

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Commands, CrawlArgs};
use site_readiness::analyze::{Category, ReportComparison};
use site_readiness::{analyze_website_with, CrawlRequest, HttpFetcher, Rubric, SiteReport};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let exit_code = match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            // {:#} prints the whole context chain on one line
            eprintln!("Error: {:#}", e);
            2
        }
    };

    std::process::exit(exit_code);
}

// Logs go to stderr so `--json` output on stdout stays machine-readable
fn init_tracing(verbose: bool) {
    let default_level = if verbose {
        "site_readiness=debug"
    } else {
        "site_readiness=info"
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

// Returns the process exit code
async fn run(cli: Cli) -> Result<i32> {
    match cli.command {
        Commands::Analyze {
            url,
            crawl,
            fail_under,
        } => handle_analyze(&url, &crawl, fail_under).await,
        Commands::Compare {
            url,
            competitor_url,
            crawl,
        } => handle_compare(&url, &competitor_url, &crawl).await,
    }
}

// Handles the 'analyze' subcommand
async fn handle_analyze(url: &str, crawl: &CrawlArgs, fail_under: u8) -> Result<i32> {
    let rubric = load_rubric(crawl.rubric.as_deref())?;
    let report = analyze_site(url, crawl, &rubric).await?;

    if crawl.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(url, &report, &rubric);
    }

    if report.score < fail_under {
        info!(score = report.score, fail_under, "score below threshold");
        Ok(1)
    } else {
        Ok(0)
    }
}

// Handles the 'compare' subcommand
async fn handle_compare(url: &str, competitor_url: &str, crawl: &CrawlArgs) -> Result<i32> {
    let rubric = load_rubric(crawl.rubric.as_deref())?;

    // Two independent crawls, run side by side
    let (ours, theirs) = tokio::join!(
        analyze_site(url, crawl, &rubric),
        analyze_site(competitor_url, crawl, &rubric)
    );
    let ours = ours?;
    let theirs = theirs?;
    let comparison = ours.compare(&theirs);

    if crawl.json {
        let output = serde_json::json!({
            "site": { "url": url, "report": ours },
            "competitor": { "url": competitor_url, "report": theirs },
            "comparison": comparison,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        print_comparison(url, competitor_url, &ours, &theirs, &comparison);
    }

    Ok(0)
}

async fn analyze_site(url: &str, crawl: &CrawlArgs, rubric: &Rubric) -> Result<SiteReport> {
    let request = CrawlRequest::new(url)
        .with_context(|| format!("invalid URL: {}", url))?
        .with_options(&crawl.options());
    request.validate()?;

    let fetcher = Arc::new(HttpFetcher::new(&request)?);

    info!(url, "analyzing");
    analyze_website_with(&request, fetcher, rubric)
        .await
        .with_context(|| format!("failed to analyze {}", url))
}

fn load_rubric(path: Option<&Path>) -> Result<Rubric> {
    match path {
        Some(path) => Rubric::load(path)
            .with_context(|| format!("could not load rubric from {}", path.display())),
        None => Ok(Rubric::default()),
    }
}

// Prints a report as human-readable tables
fn print_report(url: &str, report: &SiteReport, rubric: &Rubric) {
    println!("🔍 {}", url);
    println!("📊 AI-readiness score: {}/100", report.score);
    println!();

    // Sub-scores
    println!("{:<16} {:>7} {:>7}", "CATEGORY", "SCORE", "TARGET");
    println!("{}", "=".repeat(32));
    for category in Category::ALL {
        println!(
            "{:<16} {:>7.1} {:>7.1}",
            category.label(),
            report.sub_scores.get(category),
            rubric.thresholds.get(category)
        );
    }
    println!();

    // Recommendations
    if report.recommendations.is_empty() {
        println!("✅ No recommendations, every category meets its target");
    } else {
        println!("💡 Recommendations:");
        for rec in &report.recommendations {
            println!("   [{}] {}", rec.severity, rec.rationale);
        }
    }
    println!();

    // Pages
    println!(
        "{:<60} {:>6} {:>7} {:>8} {:>7}",
        "PAGE", "STATUS", "WORDS", "HEADINGS", "SCHEMA"
    );
    println!("{}", "=".repeat(92));
    for page in &report.pages {
        let analysis = &page.analysis;

        // Truncate URL if too long for display
        let url_display = if analysis.url.chars().count() > 57 {
            format!("{}...", analysis.url.chars().take(57).collect::<String>())
        } else {
            analysis.url.clone()
        };
        let status = match (&analysis.error, analysis.http_status) {
            (Some(kind), _) => kind.to_string(),
            (None, Some(code)) => code.to_string(),
            (None, None) => "-".to_string(),
        };

        println!(
            "{:<60} {:>6} {:>7} {:>8} {:>7}",
            url_display,
            status,
            analysis.word_count,
            analysis.headings.total(),
            analysis.schema_types.len()
        );
    }
    println!();

    println!("📋 Summary:");
    println!("   ✅ Analyzed: {}", report.pages_analyzed);
    println!("   ❌ Failed: {}", report.pages_failed);
    println!("   📄 Listed: {}", report.pages.len());
}

fn print_comparison(
    url: &str,
    competitor_url: &str,
    ours: &SiteReport,
    theirs: &SiteReport,
    comparison: &ReportComparison,
) {
    println!("🔍 {} vs {}", url, competitor_url);
    println!();
    println!("{:<16} {:>8} {:>10} {:>8}", "CATEGORY", "YOURS", "THEIRS", "DELTA");
    println!("{}", "=".repeat(45));
    println!(
        "{:<16} {:>8} {:>10} {:>+8}",
        "Overall", ours.score, theirs.score, comparison.score_delta
    );
    for category in Category::ALL {
        println!(
            "{:<16} {:>8.1} {:>10.1} {:>+8.1}",
            category.label(),
            ours.sub_scores.get(category),
            theirs.sub_scores.get(category),
            comparison.sub_score_deltas.get(category)
        );
    }
    println!();

    if comparison.behind_in.is_empty() {
        println!("✅ Not behind in any category");
    } else {
        let names: Vec<&str> = comparison.behind_in.iter().map(|c| c.label()).collect();
        println!("⚠️  Behind in: {}", names.join(", "));
    }
}
