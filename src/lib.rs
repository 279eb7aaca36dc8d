// src/lib.rs
// =============================================================================
// site-readiness: crawl a website and score how ready it is for AI search.
//
// The pipeline:
// 1. crawl     - fetch up to max_pages same-site pages, breadth-first
// 2. analyze   - measure every page, then reduce to one SiteReport
//
// analyze_website() is the one call most users need. It takes a URL plus a
// few optional limits and returns the report. analyze_website_with() is the
// same thing with the fetcher and rubric supplied by the caller.
// =============================================================================

pub mod analyze;
pub mod config;
pub mod crawl;
pub mod error;

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::warn;

pub use analyze::{Recommendation, Rubric, Severity, SiteReport};
pub use config::{AnalyzeOptions, CrawlRequest};
pub use crawl::{CrawlResult, CrawlStatus, Fetcher, HttpFetcher, PageFetchResult};
pub use error::{EngineError, PageErrorKind, Result};

/// Crawls `url` and returns its readiness report, using the default rubric.
///
/// # Errors
///
/// `EngineError::Config` for a bad URL or limits, and
/// `EngineError::SeedUnreachable` when the first page cannot be fetched.
/// Failures on any other page only show up in the report.
pub async fn analyze_website(url: &str, options: &AnalyzeOptions) -> Result<SiteReport> {
    let request = CrawlRequest::new(url)?.with_options(options);
    request.validate()?;
    let fetcher = Arc::new(HttpFetcher::new(&request)?);
    analyze_website_with(&request, fetcher, &Rubric::default()).await
}

/// Crawl and analyze with an injected fetcher and rubric.
pub async fn analyze_website_with(
    request: &CrawlRequest,
    fetcher: Arc<dyn Fetcher>,
    rubric: &Rubric,
) -> Result<SiteReport> {
    rubric.validate()?;

    let result = crawl::crawl(request, fetcher, CancellationToken::new()).await?;

    if result.status == CrawlStatus::Failed {
        let kind = result.failure.unwrap_or(PageErrorKind::Network);
        warn!(url = %request.seed_url, error = %kind, "seed URL unreachable");
        return Err(EngineError::SeedUnreachable {
            url: request.seed_url.to_string(),
            kind,
        });
    }

    Ok(analyze::analyze(&result.pages, rubric))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crawl::FetchedPage;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::time::Duration;

    /// Serves a fixed map of pages; anything else times out.
    struct StaticSite {
        pages: HashMap<String, String>,
    }

    impl StaticSite {
        fn new(pages: &[(&str, &str)]) -> Arc<Self> {
            Arc::new(Self {
                pages: pages
                    .iter()
                    .map(|(url, html)| (url.to_string(), html.to_string()))
                    .collect(),
            })
        }
    }

    #[async_trait]
    impl Fetcher for StaticSite {
        async fn fetch(&self, url: &str) -> std::result::Result<FetchedPage, PageErrorKind> {
            match self.pages.get(url) {
                Some(html) => Ok(FetchedPage::html(html.clone())),
                None => Err(PageErrorKind::Timeout),
            }
        }
    }

    fn request(url: &str) -> CrawlRequest {
        CrawlRequest::new(url)
            .unwrap()
            .with_retry_backoff(Duration::from_millis(1))
            .with_request_delay(Duration::ZERO)
    }

    #[tokio::test]
    async fn test_unreachable_seed_is_an_error() {
        let site = StaticSite::new(&[]);
        let err = analyze_website_with(&request("https://example.com"), site, &Rubric::default())
            .await
            .unwrap_err();

        match err {
            EngineError::SeedUnreachable { url, kind } => {
                assert_eq!(url, "https://example.com/");
                assert_eq!(kind, PageErrorKind::Timeout);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_crawl_then_analyze() {
        let site = StaticSite::new(&[
            (
                "https://example.com",
                r#"<h1>Home</h1><p>Welcome to the site.</p>
                   <a href="/faq">FAQ</a> <a href="/missing">Missing</a>"#,
            ),
            (
                "https://example.com/faq",
                "<h1>FAQ</h1><p>How do refunds work? Refunds take five days.</p>",
            ),
        ]);

        let report = analyze_website_with(&request("https://example.com"), site, &Rubric::default())
            .await
            .unwrap();

        assert_eq!(report.pages.len(), 3);
        assert_eq!(report.pages_analyzed, 2);
        assert_eq!(report.pages_failed, 1);
        assert_eq!(report.sub_scores.faq, 50.0);
        assert!(report.score <= 100);
    }

    #[tokio::test]
    async fn test_invalid_rubric_rejected_before_crawling() {
        let mut rubric = Rubric::default();
        rubric.weights.faq = 0.9;

        let site = StaticSite::new(&[("https://example.com", "<p>Hi.</p>")]);
        let err = analyze_website_with(&request("https://example.com"), site, &rubric)
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::Rubric(_)));
    }

    #[tokio::test]
    async fn test_bad_options_are_config_errors() {
        let options = AnalyzeOptions {
            max_concurrency: Some(0),
            ..Default::default()
        };
        let err = analyze_website("https://example.com", &options)
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::Config(_)));

        let err = analyze_website("", &AnalyzeOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::Config(_)));
    }
}
