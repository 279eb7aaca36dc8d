// src/crawl/sitemap.rs
// =============================================================================
// Sitemap discovery.
//
// Before the workers start, the crawler can ask the site which pages it
// lists for itself:
// 1. Read /robots.txt and collect its `Sitemap:` lines
// 2. Fall back to /sitemap.xml when robots.txt names none
// 3. Parse each sitemap; index files point at further sitemaps, which are
//    fetched too (at most MAX_SITEMAP_DOCUMENTS documents in total)
//
// Listed URLs go through the same normalization and same-site check as
// links found on pages. A site without sitemaps just yields nothing.
//
// Rust concepts:
// - quick_xml::Reader: streaming XML events, no DOM is built
// - &dyn Fetcher: discovery reuses whatever fetcher the crawl was given
// =============================================================================

use std::collections::{HashSet, VecDeque};
use std::time::Duration;

use quick_xml::events::Event;
use quick_xml::Reader;
use tokio::time::timeout;
use tracing::{debug, info};
use url::Url;

use super::fetch::Fetcher;
use super::links::{normalize_url, same_site};

/// Upper bound on robots-declared, fallback and index-linked sitemap files.
const MAX_SITEMAP_DOCUMENTS: usize = 10;

/// `<loc>` values found in one sitemap document.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct SitemapEntries {
    /// Pages, from `<url><loc>`
    pub pages: Vec<String>,
    /// Nested sitemaps, from a sitemap index's `<sitemap><loc>`
    pub sitemaps: Vec<String>,
}

#[derive(Clone, Copy)]
enum Entry {
    Page,
    Sitemap,
}

/// `Sitemap:` declarations in a robots.txt file.
///
/// Sitemap lines are global, so user-agent groups are ignored.
pub fn robots_sitemaps(robots: &str) -> Vec<String> {
    robots
        .lines()
        .filter_map(|line| {
            let line = line.trim();
            if line.starts_with('#') {
                return None;
            }
            let (key, value) = line.split_once(':')?;
            if !key.trim().eq_ignore_ascii_case("sitemap") {
                return None;
            }
            let value = value.trim();
            (!value.is_empty()).then(|| value.to_string())
        })
        .collect()
}

/// Reads every `<loc>` out of a urlset or sitemap index.
///
/// Malformed XML stops the parse; whatever was read before the error is
/// kept.
pub fn parse_sitemap(xml: &str) -> SitemapEntries {
    let mut entries = SitemapEntries::default();
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);
    let mut buf = Vec::new();

    let mut current: Option<Entry> = None;
    let mut in_loc = false;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => match e.local_name().as_ref() {
                b"url" => current = Some(Entry::Page),
                b"sitemap" => current = Some(Entry::Sitemap),
                b"loc" => in_loc = true,
                _ => {}
            },
            Ok(Event::Text(ref e)) if in_loc => {
                let text = e.unescape().unwrap_or_default();
                let loc = text.trim();
                if !loc.is_empty() {
                    match current {
                        Some(Entry::Page) => entries.pages.push(loc.to_string()),
                        Some(Entry::Sitemap) => entries.sitemaps.push(loc.to_string()),
                        None => {}
                    }
                }
            }
            Ok(Event::End(ref e)) => match e.local_name().as_ref() {
                b"url" | b"sitemap" => current = None,
                b"loc" => in_loc = false,
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => {
                debug!(error = %e, "sitemap parse stopped early");
                break;
            }
            _ => {}
        }
        buf.clear();
    }

    entries
}

/// Collects up to `limit` normalized same-site page URLs listed in the
/// seed's sitemaps.
pub(crate) async fn discover(
    fetcher: &dyn Fetcher,
    seed: &Url,
    per_request: Duration,
    limit: usize,
) -> Vec<String> {
    let mut pending: VecDeque<String> = VecDeque::new();
    if let Ok(robots_url) = seed.join("/robots.txt") {
        if let Some(robots) = fetch_text(fetcher, robots_url.as_str(), per_request).await {
            pending.extend(robots_sitemaps(&robots));
        }
    }
    if pending.is_empty() {
        if let Ok(fallback) = seed.join("/sitemap.xml") {
            pending.push_back(fallback.to_string());
        }
    }

    let mut pages: Vec<String> = Vec::new();
    let mut fetched: HashSet<String> = HashSet::new();

    while let Some(sitemap_url) = pending.pop_front() {
        if fetched.len() >= MAX_SITEMAP_DOCUMENTS || pages.len() >= limit {
            break;
        }
        if !fetched.insert(sitemap_url.clone()) {
            continue;
        }
        let Some(xml) = fetch_text(fetcher, &sitemap_url, per_request).await else {
            continue;
        };

        let entries = parse_sitemap(&xml);
        pending.extend(entries.sitemaps);

        for loc in entries.pages {
            let Ok(url) = Url::parse(&loc) else {
                continue;
            };
            if !same_site(&url, seed) {
                continue;
            }
            if let Some(normalized) = normalize_url(&url) {
                if !pages.contains(&normalized) {
                    pages.push(normalized);
                }
            }
            if pages.len() >= limit {
                break;
            }
        }
    }

    info!(
        sitemaps = fetched.len(),
        pages = pages.len(),
        "sitemap discovery finished"
    );
    pages
}

// Body of a successful response, None for anything else
async fn fetch_text(fetcher: &dyn Fetcher, url: &str, per_request: Duration) -> Option<String> {
    match timeout(per_request, fetcher.fetch_document(url)).await {
        Ok(Ok(page)) if page.status < 400 => page.body,
        Ok(Ok(page)) => {
            debug!(url, status = page.status, "sitemap source not available");
            None
        }
        Ok(Err(kind)) => {
            debug!(url, error = %kind, "sitemap source failed");
            None
        }
        Err(_) => {
            debug!(url, "sitemap source timed out");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crawl::FetchedPage;
    use crate::error::PageErrorKind;
    use async_trait::async_trait;
    use std::collections::HashMap;

    const URLSET: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
        <urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
          <url><loc>https://example.com/</loc><priority>1.0</priority></url>
          <url><loc> https://example.com/pricing/ </loc></url>
          <url><loc>https://docs.example.com/start?a=1&amp;b=2</loc></url>
          <url><loc>https://other.org/page</loc></url>
        </urlset>"#;

    /// Serves fixed bodies; everything else is a 404.
    struct Docs(HashMap<&'static str, &'static str>);

    #[async_trait]
    impl Fetcher for Docs {
        async fn fetch(&self, url: &str) -> Result<FetchedPage, PageErrorKind> {
            Ok(match self.0.get(url) {
                Some(body) => FetchedPage {
                    status: 200,
                    content_type: Some("application/xml".to_string()),
                    body: Some(body.to_string()),
                    final_url: None,
                },
                None => FetchedPage {
                    status: 404,
                    content_type: None,
                    body: None,
                    final_url: None,
                },
            })
        }
    }

    fn seed() -> Url {
        Url::parse("https://example.com").unwrap()
    }

    #[test]
    fn test_robots_sitemap_lines() {
        let robots = "User-agent: *\n\
                      Disallow: /admin\n\
                      # Sitemap: https://example.com/commented.xml\n\
                      sitemap: https://example.com/a.xml\n\
                      Sitemap:   https://example.com/b.xml  \n\
                      Sitemap:\n";
        assert_eq!(
            robots_sitemaps(robots),
            vec![
                "https://example.com/a.xml".to_string(),
                "https://example.com/b.xml".to_string(),
            ]
        );
    }

    #[test]
    fn test_parse_urlset() {
        let entries = parse_sitemap(URLSET);
        assert_eq!(entries.pages.len(), 4);
        assert_eq!(entries.pages[1], "https://example.com/pricing/");
        assert_eq!(entries.pages[2], "https://docs.example.com/start?a=1&b=2");
        assert!(entries.sitemaps.is_empty());
    }

    #[test]
    fn test_parse_sitemap_index() {
        let xml = r#"<sitemapindex xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
              <sitemap><loc>https://example.com/s1.xml</loc><lastmod>2024-01-01</lastmod></sitemap>
              <sitemap><loc>https://example.com/s2.xml</loc></sitemap>
            </sitemapindex>"#;
        let entries = parse_sitemap(xml);
        assert!(entries.pages.is_empty());
        assert_eq!(
            entries.sitemaps,
            vec![
                "https://example.com/s1.xml".to_string(),
                "https://example.com/s2.xml".to_string(),
            ]
        );
    }

    #[test]
    fn test_broken_xml_keeps_earlier_entries() {
        let xml = "<urlset><url><loc>https://example.com/a</loc></url><url><loc>oops</urlset>";
        let entries = parse_sitemap(xml);
        assert_eq!(entries.pages[0], "https://example.com/a");
    }

    #[tokio::test]
    async fn test_discover_through_robots_and_index() {
        let docs = Docs(HashMap::from([
            (
                "https://example.com/robots.txt",
                "User-agent: *\nSitemap: https://example.com/index.xml",
            ),
            (
                "https://example.com/index.xml",
                "<sitemapindex><sitemap><loc>https://example.com/pages.xml</loc></sitemap></sitemapindex>",
            ),
            ("https://example.com/pages.xml", URLSET),
        ]));

        let pages = discover(&docs, &seed(), Duration::from_secs(1), 10).await;

        assert_eq!(
            pages,
            vec![
                "https://example.com".to_string(),
                "https://example.com/pricing".to_string(),
                "https://docs.example.com/start?a=1&b=2".to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn test_discover_falls_back_to_sitemap_xml() {
        let docs = Docs(HashMap::from([("https://example.com/sitemap.xml", URLSET)]));

        let pages = discover(&docs, &seed(), Duration::from_secs(1), 2).await;

        assert_eq!(
            pages,
            vec![
                "https://example.com".to_string(),
                "https://example.com/pricing".to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn test_discover_without_sitemaps_is_empty() {
        let docs = Docs(HashMap::new());
        let pages = discover(&docs, &seed(), Duration::from_secs(1), 10).await;
        assert!(pages.is_empty());
    }
}
