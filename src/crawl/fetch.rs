// src/crawl/fetch.rs
// =============================================================================
// Fetching a single URL.
//
// The crawler only talks to the network through the Fetcher trait. The real
// implementation (HttpFetcher) uses reqwest; tests plug in an in-memory
// fetcher so they can count concurrent requests or simulate timeouts.
//
// A Fetcher makes exactly ONE attempt. Retries, HTTP-status classification
// and the per-request timeout wrapper live in the crawler.
//
// Rust concepts:
// - async_trait: lets us store `Arc<dyn Fetcher>` even though fetch() is async
// - Result<T, E>: transport failures come back as a PageErrorKind
// =============================================================================

use std::error::Error as StdError;

use async_trait::async_trait;
use reqwest::{header::CONTENT_TYPE, redirect::Policy, Client};

use crate::config::CrawlRequest;
use crate::error::{EngineError, PageErrorKind};

/// Raw outcome of one successful HTTP exchange (any status code).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedPage {
    pub status: u16,
    pub content_type: Option<String>,
    /// Body text; only read for HTML responses
    pub body: Option<String>,
    /// Where the response actually came from once redirects were followed
    pub final_url: Option<String>,
}

impl FetchedPage {
    /// Convenience constructor for a 200 text/html page.
    pub fn html(body: impl Into<String>) -> Self {
        Self {
            status: 200,
            content_type: Some("text/html; charset=utf-8".to_string()),
            body: Some(body.into()),
            final_url: None,
        }
    }
}

/// One fetch attempt against one URL.
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<FetchedPage, PageErrorKind>;

    /// Like `fetch`, but the body is read whatever the content type.
    ///
    /// Used for robots.txt and sitemaps.
    async fn fetch_document(&self, url: &str) -> Result<FetchedPage, PageErrorKind> {
        self.fetch(url).await
    }
}

/// Content types that we read and expand.
///
/// A missing Content-Type header is treated as HTML.
pub fn is_html_content_type(content_type: Option<&str>) -> bool {
    match content_type {
        None => true,
        Some(ct) => {
            let ct = ct.to_ascii_lowercase();
            ct.contains("text/html") || ct.contains("application/xhtml+xml")
        }
    }
}

/// reqwest-backed fetcher with the request's timeout, redirect cap and
/// user agent baked into the client.
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(request: &CrawlRequest) -> Result<Self, EngineError> {
        // Reuse one client for all requests (connection pooling)
        let client = Client::builder()
            .timeout(request.per_request_timeout)
            .redirect(Policy::limited(request.max_redirects))
            .user_agent(request.user_agent.clone())
            .build()?;

        Ok(Self { client })
    }
}

impl HttpFetcher {
    async fn get(&self, url: &str, html_only: bool) -> Result<FetchedPage, PageErrorKind> {
        let response = self.client.get(url).send().await.map_err(categorize_error)?;

        // Relative links on the page resolve against this, not the requested URL
        let final_url = response.url().to_string();
        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string());

        // Error pages and non-HTML bodies are never analyzed, skip the download
        let wants_body =
            status < 400 && (!html_only || is_html_content_type(content_type.as_deref()));
        let body = if wants_body {
            Some(response.text().await.map_err(categorize_error)?)
        } else {
            None
        };

        Ok(FetchedPage {
            status,
            content_type,
            body,
            final_url: Some(final_url),
        })
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchedPage, PageErrorKind> {
        self.get(url, true).await
    }

    async fn fetch_document(&self, url: &str) -> Result<FetchedPage, PageErrorKind> {
        self.get(url, false).await
    }
}

// Maps reqwest errors onto our page-level error kinds.
//
// reqwest can fail for many reasons:
// - Network timeout
// - DNS resolution failure
// - Too many redirects
// - A body that cannot be decoded
fn categorize_error(error: reqwest::Error) -> PageErrorKind {
    if error.is_timeout() {
        PageErrorKind::Timeout
    } else if error.is_redirect() {
        PageErrorKind::TooManyRedirects
    } else if error.is_decode() {
        PageErrorKind::Parse
    } else if error.is_connect() {
        if mentions_dns(&error) {
            PageErrorKind::Dns
        } else {
            PageErrorKind::Network
        }
    } else {
        PageErrorKind::Network
    }
}

// hyper reports resolver failures as a connect error whose source chain
// mentions "dns"
fn mentions_dns(error: &reqwest::Error) -> bool {
    let mut current: Option<&dyn StdError> = Some(error);
    while let Some(err) = current {
        if err.to_string().to_ascii_lowercase().contains("dns") {
            return true;
        }
        current = err.source();
    }
    false
}
