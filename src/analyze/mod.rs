// src/analyze/mod.rs
// =============================================================================
// This module turns crawled pages into a SiteReport.
//
// Two phases:
// 1. Map: every page is analyzed on its own (rayon, one page per task).
//    Parsing HTML is CPU work, so it runs on rayon's thread pool rather than
//    on the async runtime.
// 2. Reduce: the per-page analyses are sorted by URL and folded into
//    sub-scores, a final score and recommendations on a single thread.
//
// The analyzer never fails. Broken pages are counted, not propagated.
// =============================================================================

mod page;
mod recommend;
mod rubric;
mod schema;
mod score;
mod text;

use rayon::prelude::*;
use tracing::info;

use crate::crawl::PageFetchResult;

pub use page::{analyze_page, Disposition, HeadingCounts, PageAnalysis};
pub use recommend::{classify_severity, Recommendation, Severity};
pub use rubric::{
    Category, DepthBand, PerCategory, ReadabilityBand, Rubric, RubricError, SeverityBands,
    StructureBand,
};
pub use schema::{default_detectors, JsonLdDetector, MicrodataDetector, RdfaDetector, SchemaDetector};
pub use score::{build_report, PageScores, PageSnapshot, ReportComparison, SiteReport};
pub use text::{Keyword, KeywordStats, ReadabilityLevel};

/// Analyzes a set of fetched pages with the built-in schema detectors.
pub fn analyze(pages: &[PageFetchResult], rubric: &Rubric) -> SiteReport {
    analyze_with_detectors(pages, rubric, &default_detectors())
}

/// Same as [`analyze`], with a caller-supplied detector set.
pub fn analyze_with_detectors(
    pages: &[PageFetchResult],
    rubric: &Rubric,
    detectors: &[Box<dyn SchemaDetector>],
) -> SiteReport {
    let analyses: Vec<PageAnalysis> = pages
        .par_iter()
        .map(|page| analyze_page(page, detectors))
        .collect();

    let report = build_report(analyses, rubric);

    info!(
        score = report.score,
        analyzed = report.pages_analyzed,
        failed = report.pages_failed,
        recommendations = report.recommendations.len(),
        "Analysis complete"
    );

    report
}
