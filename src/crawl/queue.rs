// src/crawl/queue.rs
// =============================================================================
// This module implements website crawling with a breadth-first approach.
//
// How it works:
// 1. Put the seed URL in the frontier at depth 0 (followed, when asked, by
//    the pages the site's sitemaps list, at depth 1)
// 2. Start `max_concurrency` workers
// 3. Each worker takes the next URL, marks it visited, and fetches it
//    (the lock is released while the request is in flight)
// 4. Same-site links from successful HTML pages go to the back of the
//    frontier at depth + 1, unless already seen or too deep
// 5. After each fetch the worker pauses for `request_delay` (polite crawling)
// 6. Workers stop when the frontier is empty and nothing is in flight, or
//    when the page cap, the deadline or cancellation is reached
//
// Shared state (frontier, visited set, in-flight count, results) lives in a
// single CrawlJob behind one tokio Mutex. Nothing else is shared.
//
// Rust concepts:
// - Arc<T>: shared ownership of the job between spawned workers
// - tokio::sync::Notify: idle workers sleep until another worker finishes
// - tokio::select!: wait for whichever of several events happens first
// =============================================================================

use std::collections::{HashSet, VecDeque};
use std::sync::Arc;

use futures::future::join_all;
use tokio::sync::{Mutex, Notify};
use tokio::time::{sleep, sleep_until, timeout, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use url::Url;

use super::fetch::{is_html_content_type, FetchedPage, Fetcher, HttpFetcher};
use super::links::{extract_same_site_links, normalize_url};
use super::sitemap;
use super::{CrawlResult, CrawlStatus, PageFetchResult};
use crate::config::CrawlRequest;
use crate::error::{EngineError, PageErrorKind, Result};

// Represents a page in the crawl queue
#[derive(Debug, Clone)]
struct CrawlItem {
    url: String,
    depth: usize, // How many hops from the seed URL
}

/// What a worker should do next.
enum Next {
    Dispatch(CrawlItem),
    Wait,
    Stop,
}

/// Mutable state of one crawl invocation.
struct CrawlJob {
    frontier: VecDeque<CrawlItem>,
    /// Everything ever queued, so the frontier never holds duplicates
    seen: HashSet<String>,
    /// URLs handed to a worker
    visited: HashSet<String>,
    in_flight: usize,
    pages: Vec<PageFetchResult>,
    seed_failure: Option<PageErrorKind>,
    deadline_hit: bool,
    /// Cancellation arrived while work was still queued or in flight
    interrupted: bool,
}

impl CrawlJob {
    fn new(seed: String) -> Self {
        let mut seen = HashSet::new();
        seen.insert(seed.clone());
        Self {
            frontier: VecDeque::from([CrawlItem { url: seed, depth: 0 }]),
            seen,
            visited: HashSet::new(),
            in_flight: 0,
            pages: Vec::new(),
            seed_failure: None,
            deadline_hit: false,
            interrupted: false,
        }
    }

    // Sitemap pages sit behind the seed, one hop away
    fn enqueue_listed(&mut self, urls: Vec<String>) {
        for url in urls {
            if self.seen.insert(url.clone()) {
                self.frontier.push_back(CrawlItem { url, depth: 1 });
            }
        }
    }

    // Check-and-insert happens here, under the job lock, so two workers can
    // never be handed the same URL.
    fn next(&mut self, max_pages: usize, cancel: &CancellationToken, deadline: Instant) -> Next {
        if self.seed_failure.is_some() {
            return Next::Stop;
        }
        if cancel.is_cancelled() {
            if self.in_flight > 0 || !self.frontier.is_empty() {
                self.interrupted = true;
            }
            return Next::Stop;
        }
        if Instant::now() >= deadline {
            self.deadline_hit = true;
            return Next::Stop;
        }

        while self.visited.len() < max_pages {
            let Some(item) = self.frontier.pop_front() else {
                break;
            };
            if self.visited.insert(item.url.clone()) {
                self.in_flight += 1;
                return Next::Dispatch(item);
            }
        }

        if self.visited.len() >= max_pages || self.in_flight == 0 {
            Next::Stop
        } else {
            Next::Wait
        }
    }

    fn record(&mut self, item: &CrawlItem, result: PageFetchResult, links: Vec<String>) {
        self.in_flight -= 1;

        if item.depth == 0 {
            if let Some(kind) = result.error {
                self.seed_failure = Some(kind);
                return;
            }
        }

        for link in links {
            if self.seen.insert(link.clone()) {
                self.frontier.push_back(CrawlItem {
                    url: link,
                    depth: item.depth + 1,
                });
            }
        }
        self.pages.push(result);
    }

    fn final_status(&self) -> CrawlStatus {
        if self.seed_failure.is_some() {
            CrawlStatus::Failed
        } else if self.frontier.is_empty() && !self.interrupted {
            CrawlStatus::Completed
        } else {
            CrawlStatus::PartiallyCompleted
        }
    }
}

/// Everything the workers share.
struct Shared {
    job: Mutex<CrawlJob>,
    notify: Notify,
    fetcher: Arc<dyn Fetcher>,
    request: CrawlRequest,
    cancel: CancellationToken,
    deadline: Instant,
}

/// Crawls a website with the real HTTP fetcher.
///
/// This is the entry point used by analyze_website(); see [`crawl`] for the
/// version that takes an injected fetcher and cancellation token.
pub async fn crawl_website(request: &CrawlRequest) -> Result<CrawlResult> {
    request.validate()?;
    let fetcher = Arc::new(HttpFetcher::new(request)?);
    crawl(request, fetcher, CancellationToken::new()).await
}

/// Runs one crawl job to completion.
///
/// Returns `Err` only for an invalid request. A seed that cannot be fetched
/// yields `Ok` with `CrawlStatus::Failed`, no pages, and the cause in
/// `failure`.
pub async fn crawl(
    request: &CrawlRequest,
    fetcher: Arc<dyn Fetcher>,
    cancel: CancellationToken,
) -> Result<CrawlResult> {
    request.validate()?;
    let seed = normalize_url(&request.seed_url).ok_or_else(|| {
        EngineError::Config(format!("seed URL cannot be crawled: {}", request.seed_url))
    })?;

    let started = Instant::now();
    info!(
        seed = %seed,
        max_pages = request.max_pages,
        max_concurrency = request.max_concurrency,
        max_depth = request.max_depth,
        "starting crawl"
    );

    let deadline = started + request.crawl_deadline;
    let mut job = CrawlJob::new(seed);
    if request.use_sitemaps && request.max_depth > 0 {
        let listed = tokio::select! {
            pages = sitemap::discover(
                fetcher.as_ref(),
                &request.seed_url,
                request.per_request_timeout,
                request.max_pages,
            ) => pages,
            _ = cancel.cancelled() => Vec::new(),
            _ = sleep_until(deadline) => Vec::new(),
        };
        job.enqueue_listed(listed);
    }

    let shared = Arc::new(Shared {
        job: Mutex::new(job),
        notify: Notify::new(),
        fetcher,
        request: request.clone(),
        cancel,
        deadline,
    });

    let workers: Vec<_> = (0..request.max_concurrency)
        .map(|worker_id| tokio::spawn(run_worker(worker_id, Arc::clone(&shared))))
        .collect();

    for outcome in join_all(workers).await {
        if let Err(e) = outcome {
            warn!(error = %e, "crawl worker terminated abnormally");
        }
    }

    let mut job = shared.job.lock().await;
    let status = job.final_status();
    let elapsed = started.elapsed();

    if job.deadline_hit {
        warn!(elapsed_ms = elapsed.as_millis() as u64, "crawl deadline reached");
    }
    info!(
        visited = job.visited.len(),
        pages = job.pages.len(),
        status = ?status,
        elapsed_ms = elapsed.as_millis() as u64,
        "crawl finished"
    );

    Ok(CrawlResult {
        pages: std::mem::take(&mut job.pages),
        visited_count: job.visited.len(),
        elapsed,
        status,
        failure: job.seed_failure,
    })
}

async fn run_worker(worker_id: usize, shared: Arc<Shared>) {
    loop {
        let mut job = shared.job.lock().await;
        let next = job.next(shared.request.max_pages, &shared.cancel, shared.deadline);

        match next {
            Next::Dispatch(item) => {
                drop(job);
                debug!(worker_id, url = %item.url, depth = item.depth, "fetching");

                let result = shared.fetch_with_retry(&item).await;
                let links = shared.links_to_follow(&item, &result);

                shared.job.lock().await.record(&item, result, links);
                shared.notify.notify_waiters();

                // Polite crawling: pause before taking the next URL
                if !shared.request.request_delay.is_zero() {
                    tokio::select! {
                        _ = sleep(shared.request.request_delay) => {}
                        _ = shared.cancel.cancelled() => {}
                    }
                }
            }
            Next::Wait => {
                // Register before releasing the lock so a notify sent in
                // between is not lost
                let notified = shared.notify.notified();
                drop(job);
                tokio::select! {
                    _ = notified => {}
                    _ = shared.cancel.cancelled() => {}
                    _ = sleep_until(shared.deadline) => {}
                }
            }
            Next::Stop => {
                drop(job);
                shared.notify.notify_waiters();
                debug!(worker_id, "worker stopping");
                break;
            }
        }
    }
}

impl Shared {
    async fn fetch_with_retry(&self, item: &CrawlItem) -> PageFetchResult {
        let started = Instant::now();
        let mut attempts: u8 = 1;
        let mut outcome = self.fetch_once(&item.url).await;

        if let Err(kind) = &outcome {
            if kind.is_transient() && !self.cancel.is_cancelled() {
                warn!(url = %item.url, error = %kind, "transient failure, retrying once");
                let cancelled = tokio::select! {
                    _ = sleep(self.request.retry_backoff) => false,
                    _ = self.cancel.cancelled() => true,
                };
                if !cancelled {
                    attempts += 1;
                    outcome = self.fetch_once(&item.url).await;
                }
            }
        }

        let fetch_duration = started.elapsed();
        match outcome {
            Ok(page) => {
                let is_html = is_html_content_type(page.content_type.as_deref());
                PageFetchResult {
                    url: item.url.clone(),
                    final_url: page.final_url,
                    http_status: Some(page.status),
                    raw_html: page.body.filter(|_| is_html),
                    content_type: page.content_type,
                    fetch_duration,
                    error: None,
                    depth: item.depth,
                    attempts,
                }
            }
            Err(kind) => {
                warn!(url = %item.url, error = %kind, attempts, "page failed");
                let mut result = PageFetchResult::failed(item.url.clone(), kind);
                result.fetch_duration = fetch_duration;
                result.depth = item.depth;
                result.attempts = attempts;
                result
            }
        }
    }

    // One attempt, bounded by the per-request timeout. 4xx/5xx answers are
    // turned into errors here.
    async fn fetch_once(&self, url: &str) -> std::result::Result<FetchedPage, PageErrorKind> {
        let page = match timeout(self.request.per_request_timeout, self.fetcher.fetch(url)).await {
            Ok(result) => result?,
            Err(_) => return Err(PageErrorKind::Timeout),
        };

        if page.status >= 400 {
            return Err(PageErrorKind::HttpStatus(page.status));
        }
        Ok(page)
    }

    fn links_to_follow(&self, item: &CrawlItem, result: &PageFetchResult) -> Vec<String> {
        if item.depth >= self.request.max_depth {
            return Vec::new();
        }
        let Some(html) = result.raw_html.as_deref() else {
            return Vec::new();
        };
        // After a redirect, relative links resolve against where the page
        // was actually served from
        let Ok(base) = Url::parse(result.base_url()) else {
            return Vec::new();
        };
        extract_same_site_links(html, &base)
    }
}
