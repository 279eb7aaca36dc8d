// src/config.rs
// =============================================================================
// Inputs to a crawl job.
//
// CrawlRequest is the full, validated description of one crawl. It is built
// once and never changed while the job runs. AnalyzeOptions is the smaller
// set of knobs exposed to callers of analyze_website(); anything they leave
// out falls back to the CrawlRequest defaults.
// =============================================================================

use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{EngineError, Result};

pub const DEFAULT_MAX_PAGES: usize = 10;
pub const DEFAULT_MAX_CONCURRENCY: usize = 5;
pub const DEFAULT_MAX_DEPTH: usize = 3;
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);
pub const DEFAULT_CRAWL_DEADLINE: Duration = Duration::from_secs(120);
pub const DEFAULT_RETRY_BACKOFF: Duration = Duration::from_millis(500);
pub const DEFAULT_MAX_REDIRECTS: usize = 5;
pub const DEFAULT_REQUEST_DELAY: Duration = Duration::from_millis(100);

/// Everything a crawl job needs to know before it starts.
#[derive(Debug, Clone)]
pub struct CrawlRequest {
    /// Parsed seed URL (http or https)
    pub seed_url: Url,
    /// Upper bound on dispatched URLs
    pub max_pages: usize,
    /// Size of the worker pool
    pub max_concurrency: usize,
    /// Links deeper than this many hops from the seed are not followed
    pub max_depth: usize,
    /// Timeout for a single fetch attempt
    pub per_request_timeout: Duration,
    /// Wall-clock budget for the whole job
    pub crawl_deadline: Duration,
    /// Pause before the single retry of a transient failure
    pub retry_backoff: Duration,
    /// Redirect hops allowed before a page fails
    pub max_redirects: usize,
    /// Pause a worker takes after each fetch before picking the next URL
    pub request_delay: Duration,
    /// Queue pages listed in robots.txt / sitemap.xml before crawling
    pub use_sitemaps: bool,
    pub user_agent: String,
}

impl CrawlRequest {
    /// Parses and validates the seed, filling every limit with its default.
    pub fn new(seed_url: &str) -> Result<Self> {
        let seed_url = parse_seed(seed_url)?;
        Ok(Self {
            seed_url,
            max_pages: DEFAULT_MAX_PAGES,
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
            max_depth: DEFAULT_MAX_DEPTH,
            per_request_timeout: DEFAULT_TIMEOUT,
            crawl_deadline: DEFAULT_CRAWL_DEADLINE,
            retry_backoff: DEFAULT_RETRY_BACKOFF,
            max_redirects: DEFAULT_MAX_REDIRECTS,
            request_delay: DEFAULT_REQUEST_DELAY,
            use_sitemaps: false,
            user_agent: default_user_agent(),
        })
    }

    pub fn with_max_pages(mut self, max_pages: usize) -> Self {
        self.max_pages = max_pages;
        self
    }

    pub fn with_max_concurrency(mut self, max_concurrency: usize) -> Self {
        self.max_concurrency = max_concurrency;
        self
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.per_request_timeout = timeout;
        self
    }

    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.crawl_deadline = deadline;
        self
    }

    pub fn with_retry_backoff(mut self, backoff: Duration) -> Self {
        self.retry_backoff = backoff;
        self
    }

    /// Zero disables the pause.
    pub fn with_request_delay(mut self, delay: Duration) -> Self {
        self.request_delay = delay;
        self
    }

    pub fn with_sitemaps(mut self, use_sitemaps: bool) -> Self {
        self.use_sitemaps = use_sitemaps;
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Applies caller-supplied options on top of the defaults.
    pub fn with_options(mut self, options: &AnalyzeOptions) -> Self {
        if let Some(max_pages) = options.max_pages {
            self.max_pages = max_pages;
        }
        if let Some(max_concurrency) = options.max_concurrency {
            self.max_concurrency = max_concurrency;
        }
        if let Some(max_depth) = options.max_depth {
            self.max_depth = max_depth;
        }
        if let Some(timeout_ms) = options.timeout_ms {
            self.per_request_timeout = Duration::from_millis(timeout_ms);
        }
        if let Some(delay_ms) = options.request_delay_ms {
            self.request_delay = Duration::from_millis(delay_ms);
        }
        if let Some(use_sitemaps) = options.use_sitemaps {
            self.use_sitemaps = use_sitemaps;
        }
        self
    }

    /// Rejects limits that would make the crawl meaningless.
    pub fn validate(&self) -> Result<()> {
        if self.max_concurrency == 0 {
            return Err(EngineError::Config(
                "max_concurrency must be at least 1".to_string(),
            ));
        }
        if self.max_pages == 0 {
            return Err(EngineError::Config("max_pages must be at least 1".to_string()));
        }
        if self.per_request_timeout.is_zero() {
            return Err(EngineError::Config(
                "per-request timeout must be greater than zero".to_string(),
            ));
        }
        if self.crawl_deadline.is_zero() {
            return Err(EngineError::Config(
                "crawl deadline must be greater than zero".to_string(),
            ));
        }
        if self.user_agent.trim().is_empty() {
            return Err(EngineError::Config("user agent must not be empty".to_string()));
        }
        Ok(())
    }
}

/// Optional overrides accepted by `analyze_website`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalyzeOptions {
    pub max_pages: Option<usize>,
    pub max_concurrency: Option<usize>,
    pub max_depth: Option<usize>,
    pub timeout_ms: Option<u64>,
    pub request_delay_ms: Option<u64>,
    pub use_sitemaps: Option<bool>,
}

pub fn default_user_agent() -> String {
    format!("site-readiness/{}", env!("CARGO_PKG_VERSION"))
}

fn parse_seed(seed: &str) -> Result<Url> {
    let seed = seed.trim();
    if seed.is_empty() {
        return Err(EngineError::Config("seed URL must not be empty".to_string()));
    }

    let url = Url::parse(seed)
        .map_err(|e| EngineError::Config(format!("invalid seed URL '{}': {}", seed, e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(EngineError::Config(format!(
            "seed URL must be http or https, got '{}'",
            url.scheme()
        )));
    }
    if url.host_str().is_none() {
        return Err(EngineError::Config(format!("seed URL has no host: {}", seed)));
    }

    Ok(url)
}
