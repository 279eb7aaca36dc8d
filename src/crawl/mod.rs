// src/crawl/mod.rs
// =============================================================================
// This module handles website crawling.
//
// Features:
// - Breadth-first crawling from a seed URL with a fixed-size worker pool
// - Same-site restriction (doesn't crawl external sites)
// - Depth, page-count and wall-clock limits
// - One retry for transient failures
// - Optional seeding from the site's robots.txt / sitemap.xml
//
// The output is a CrawlResult: one PageFetchResult per dispatched URL, in
// whatever order the fetches finished.
// =============================================================================

mod fetch;
mod links;
mod queue;
mod sitemap;

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::PageErrorKind;

pub use fetch::{is_html_content_type, FetchedPage, Fetcher, HttpFetcher};
pub use links::{
    extract_same_site_links, normalize_str, normalize_url, registrable_domain, resolve_link,
    same_site,
};
pub use queue::{crawl, crawl_website};
pub use sitemap::{parse_sitemap, robots_sitemaps, SitemapEntries};

/// Lifecycle of a crawl job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CrawlStatus {
    Running,
    /// Frontier drained
    Completed,
    /// Stopped with work left: the page cap or deadline was reached with
    /// URLs still queued, or cancellation interrupted queued or in-flight work
    PartiallyCompleted,
    /// The seed URL could not be fetched
    Failed,
}

/// What happened when one URL was fetched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageFetchResult {
    /// Normalized URL
    pub url: String,
    /// URL the content was served from after redirects; relative links
    /// resolve against it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub final_url: Option<String>,
    pub http_status: Option<u16>,
    pub content_type: Option<String>,
    /// Present only for successful HTML responses
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw_html: Option<String>,
    #[serde(with = "duration_ms")]
    pub fetch_duration: Duration,
    pub error: Option<PageErrorKind>,
    /// Hops from the seed
    pub depth: usize,
    pub attempts: u8,
}

impl PageFetchResult {
    /// A successful HTML page, mainly for building analyzer input by hand.
    pub fn html(url: impl Into<String>, html: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            final_url: None,
            http_status: Some(200),
            content_type: Some("text/html".to_string()),
            raw_html: Some(html.into()),
            fetch_duration: Duration::ZERO,
            error: None,
            depth: 0,
            attempts: 1,
        }
    }

    /// A page that failed with the given error.
    pub fn failed(url: impl Into<String>, error: PageErrorKind) -> Self {
        let http_status = match error {
            PageErrorKind::HttpStatus(code) => Some(code),
            _ => None,
        };
        Self {
            url: url.into(),
            final_url: None,
            http_status,
            content_type: None,
            raw_html: None,
            fetch_duration: Duration::ZERO,
            error: Some(error),
            depth: 0,
            attempts: 1,
        }
    }

    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }

    /// Base URL for resolving the page's relative links.
    pub fn base_url(&self) -> &str {
        self.final_url.as_deref().unwrap_or(&self.url)
    }
}

/// Output of a finished crawl job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlResult {
    pub pages: Vec<PageFetchResult>,
    /// Number of normalized URLs dispatched to workers
    pub visited_count: usize,
    #[serde(with = "duration_ms")]
    pub elapsed: Duration,
    pub status: CrawlStatus,
    /// Why the seed failed, when status is Failed
    pub failure: Option<PageErrorKind>,
}

/// Durations travel as whole milliseconds in JSON.
pub(crate) mod duration_ms {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        u64::deserialize(d).map(Duration::from_millis)
    }
}
