// src/crawl/links.rs
// =============================================================================
// URL handling for the crawler.
//
// Every candidate URL goes through normalize_url() before it is compared
// against the visited set, so "https://Example.com/docs/#intro" and
// "https://example.com/docs" count as the same page.
//
// "Same site" means same registrable domain: blog.example.com and
// www.example.com both belong to example.com, while example.org does not.
//
// Rust concepts:
// - Option<T>: most helpers here return None for links we should ignore
// - Url::join(): resolves relative links the way a browser does
// =============================================================================

use scraper::{Html, Selector};
use url::{Host, Url};

/// Schemes that never point at a crawlable page.
const SKIPPED_PREFIXES: [&str; 4] = ["mailto:", "tel:", "javascript:", "data:"];

/// Second-level labels that country TLDs register names under (`co.uk`,
/// `com.au`, `ne.jp`).
const COUNTRY_SECOND_LEVELS: [&str; 11] = [
    "ac", "co", "com", "edu", "gob", "gov", "net", "ne", "or", "org", "mil",
];

/// Resolves a link (possibly relative) against the page it was found on.
///
/// Returns None for bare fragments, non-http(s) schemes and unparsable
/// hrefs.
pub fn resolve_link(base: &Url, href: &str) -> Option<Url> {
    let href = href.trim();
    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    let lower = href.to_ascii_lowercase();
    if SKIPPED_PREFIXES.iter().any(|p| lower.starts_with(p)) {
        return None;
    }

    let url = base.join(href).ok()?;
    match url.scheme() {
        "http" | "https" => Some(url),
        _ => None,
    }
}

/// Canonical string form used for deduplication.
///
/// Lower-cases the host, drops the fragment, user info and default port,
/// and strips trailing slashes from the path (so the site root becomes the
/// bare origin). Query strings are kept.
pub fn normalize_url(url: &Url) -> Option<String> {
    let scheme = url.scheme();
    if scheme != "http" && scheme != "https" {
        return None;
    }
    let host = url.host_str()?.to_ascii_lowercase();

    let mut out = format!("{}://{}", scheme, host);
    if let Some(port) = url.port() {
        out.push(':');
        out.push_str(&port.to_string());
    }
    out.push_str(url.path().trim_end_matches('/'));
    if let Some(query) = url.query() {
        out.push('?');
        out.push_str(query);
    }
    Some(out)
}

/// Parses and normalizes in one step.
pub fn normalize_str(raw: &str) -> Option<String> {
    Url::parse(raw).ok().and_then(|url| normalize_url(&url))
}

/// Registrable domain of a URL's host.
///
/// Uses the last two labels, or the last three when the host ends in a
/// known two-part country suffix such as `co.uk` or `com.au`. IP hosts are
/// returned unchanged.
pub fn registrable_domain(url: &Url) -> Option<String> {
    match url.host()? {
        Host::Domain(domain) => Some(registrable_from_host(domain)),
        Host::Ipv4(ip) => Some(ip.to_string()),
        Host::Ipv6(ip) => Some(ip.to_string()),
    }
}

fn registrable_from_host(host: &str) -> String {
    let host = host.trim_end_matches('.').to_ascii_lowercase();
    let labels: Vec<&str> = host.split('.').collect();
    if labels.len() <= 2 {
        return host;
    }

    let tld = labels[labels.len() - 1];
    let second = labels[labels.len() - 2];
    let keep = if tld.len() == 2 && COUNTRY_SECOND_LEVELS.contains(&second) {
        3
    } else {
        2
    };

    labels[labels.len() - keep..].join(".")
}

/// True when both URLs share a registrable domain.
pub fn same_site(a: &Url, b: &Url) -> bool {
    match (registrable_domain(a), registrable_domain(b)) {
        (Some(x), Some(y)) => x == y,
        _ => false,
    }
}

/// Collects normalized, same-site links from a page.
///
/// The result is deduplicated and keeps first-seen order, so the frontier
/// grows in document order.
pub fn extract_same_site_links(html: &str, page_url: &Url) -> Vec<String> {
    let mut links = Vec::new();

    let document = Html::parse_document(html);
    let Ok(selector) = Selector::parse("a[href]") else {
        return links;
    };

    for element in document.select(&selector) {
        let Some(href) = element.value().attr("href") else {
            continue;
        };
        let Some(absolute) = resolve_link(page_url, href) else {
            continue;
        };
        if !same_site(&absolute, page_url) {
            continue;
        }
        if let Some(normalized) = normalize_url(&absolute) {
            if !links.contains(&normalized) {
                links.push(normalized);
            }
        }
    }

    links
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn test_resolve_relative_link() {
        let base = url("https://example.com/page");
        let result = resolve_link(&base, "/docs").map(|u| u.to_string());
        assert_eq!(result, Some("https://example.com/docs".to_string()));
    }

    #[test]
    fn test_skip_anchor_and_special_schemes() {
        let base = url("https://example.com/page");
        assert!(resolve_link(&base, "#section").is_none());
        assert!(resolve_link(&base, "mailto:test@example.com").is_none());
        assert!(resolve_link(&base, "tel:+123").is_none());
        assert!(resolve_link(&base, "JavaScript:void(0)").is_none());
    }

    #[test]
    fn test_normalize_strips_fragment_slash_and_case() {
        let n = normalize_str("https://Example.COM/Docs/#intro").unwrap();
        assert_eq!(n, "https://example.com/Docs");

        let root = normalize_str("https://example.com/").unwrap();
        assert_eq!(root, "https://example.com");
        assert_eq!(normalize_str("https://example.com").unwrap(), root);
    }

    #[test]
    fn test_normalize_keeps_query_and_custom_port() {
        let n = normalize_str("http://example.com:8080/search/?q=rust#top").unwrap();
        assert_eq!(n, "http://example.com:8080/search?q=rust");

        let n = normalize_str("https://example.com:443/a").unwrap();
        assert_eq!(n, "https://example.com/a");
    }

    #[test]
    fn test_registrable_domain() {
        assert_eq!(
            registrable_domain(&url("https://blog.example.com/x")).unwrap(),
            "example.com"
        );
        assert_eq!(
            registrable_domain(&url("https://www.shop.example.co.uk/")).unwrap(),
            "example.co.uk"
        );
        assert_eq!(
            registrable_domain(&url("http://127.0.0.1:3000/")).unwrap(),
            "127.0.0.1"
        );
    }

    #[test]
    fn test_short_labels_under_country_tld_are_names() {
        // "abc" under .de is a registered name, not a suffix
        assert_eq!(
            registrable_domain(&url("https://www.abc.de/")).unwrap(),
            "abc.de"
        );
        assert!(same_site(&url("https://www.abc.de/"), &url("https://abc.de/x")));

        assert_eq!(
            registrable_domain(&url("https://x.bbc.fr/")).unwrap(),
            "bbc.fr"
        );
        assert_eq!(
            registrable_domain(&url("https://api.foo.io/v1")).unwrap(),
            "foo.io"
        );
        assert_eq!(
            registrable_domain(&url("https://shop.acme.com.au/")).unwrap(),
            "acme.com.au"
        );
        assert!(!same_site(
            &url("https://one.co.jp/"),
            &url("https://two.co.jp/")
        ));
    }

    #[test]
    fn test_same_site() {
        assert!(same_site(
            &url("https://www.example.com/a"),
            &url("https://docs.example.com/b")
        ));
        assert!(!same_site(
            &url("https://example.com/a"),
            &url("https://example.org/a")
        ));
    }

    #[test]
    fn test_extract_same_site_links() {
        let html = r#"
            <a href="/docs">Docs</a>
            <a href="/docs/#install">Docs again</a>
            <a href="https://blog.example.com/post">Blog</a>
            <a href="https://rust-lang.org">Rust</a>
            <a href="mailto:hi@example.com">Mail</a>
        "#;
        let links = extract_same_site_links(html, &url("https://example.com/"));
        assert_eq!(
            links,
            vec![
                "https://example.com/docs".to_string(),
                "https://blog.example.com/post".to_string(),
            ]
        );
    }
}
