// src/analyze/page.rs
// =============================================================================
// Per-page metrics.
//
// analyze_page() turns one PageFetchResult into a PageAnalysis. It parses the
// HTML exactly once and reads everything it needs from that one document:
// text, keywords, headings, meta tags, structured data, links and images.
//
// Pure function: same input, same output. No scoring happens here; the
// numbers are turned into sub-scores by score.rs using the Rubric.
// =============================================================================

use std::collections::BTreeSet;

use scraper::{Html, Selector};
use serde::{Deserialize, Serialize};
use tracing::debug;
use url::Url;

use super::schema::SchemaDetector;
use super::text::{
    count_qa_pairs, count_syllables, count_words, flesch_reading_ease, is_question,
    keyword_stats, split_sentences, visible_text_blocks, words, KeywordStats, ReadabilityLevel,
};
use crate::crawl::{resolve_link, same_site, PageFetchResult};
use crate::error::PageErrorKind;

/// How a page takes part in the site report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Disposition {
    /// Counted in every aggregate
    Analyzed,
    /// Fetch failed; counted in pages_failed only
    Failed,
    /// Successful non-HTML response; listed, never scored
    NotHtml,
}

/// Number of headings at each level.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeadingCounts {
    pub h1: usize,
    pub h2: usize,
    pub h3: usize,
    pub h4: usize,
    pub h5: usize,
    pub h6: usize,
}

impl HeadingCounts {
    fn bump(&mut self, level: u8) {
        match level {
            1 => self.h1 += 1,
            2 => self.h2 += 1,
            3 => self.h3 += 1,
            4 => self.h4 += 1,
            5 => self.h5 += 1,
            _ => self.h6 += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.h1 + self.h2 + self.h3 + self.h4 + self.h5 + self.h6
    }
}

/// Everything we measured on one page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageAnalysis {
    pub url: String,
    pub http_status: Option<u16>,
    pub disposition: Disposition,
    pub error: Option<PageErrorKind>,

    pub word_count: usize,
    pub sentence_count: usize,
    pub headings: HeadingCounts,
    /// Level jumps in document order, e.g. "H2 -> H4"
    pub heading_issues: Vec<String>,

    pub title_length: Option<usize>,
    /// Trimmed character length; None when the tag is missing
    pub meta_description_length: Option<usize>,

    pub schema_types: BTreeSet<String>,

    pub question_count: usize,
    pub qa_pair_count: usize,

    pub internal_links: usize,
    pub external_links: usize,

    pub images: usize,
    pub images_missing_alt: usize,

    /// Flesch reading ease (0 when the page has no words)
    pub readability: f64,
    pub readability_level: Option<ReadabilityLevel>,

    pub keywords: KeywordStats,
}

impl PageAnalysis {
    /// A page with no measurable content.
    fn empty(page: &PageFetchResult, disposition: Disposition) -> Self {
        Self {
            url: page.url.clone(),
            http_status: page.http_status,
            disposition,
            error: page.error,
            word_count: 0,
            sentence_count: 0,
            headings: HeadingCounts::default(),
            heading_issues: Vec::new(),
            title_length: None,
            meta_description_length: None,
            schema_types: BTreeSet::new(),
            question_count: 0,
            qa_pair_count: 0,
            internal_links: 0,
            external_links: 0,
            images: 0,
            images_missing_alt: 0,
            readability: 0.0,
            readability_level: None,
            keywords: KeywordStats::default(),
        }
    }

    pub fn is_analyzed(&self) -> bool {
        self.disposition == Disposition::Analyzed
    }

    pub fn has_schema_type(&self, name: &str) -> bool {
        self.schema_types.iter().any(|t| t.eq_ignore_ascii_case(name))
    }
}

/// Measures one fetched page.
///
/// Pages whose body could not be decoded (`Parse` errors) are analyzed as
/// empty pages. Any other error marks the page Failed.
pub fn analyze_page(page: &PageFetchResult, detectors: &[Box<dyn SchemaDetector>]) -> PageAnalysis {
    match (&page.error, &page.raw_html) {
        (Some(PageErrorKind::Parse), _) => PageAnalysis::empty(page, Disposition::Analyzed),
        (Some(_), _) => PageAnalysis::empty(page, Disposition::Failed),
        (None, None) => PageAnalysis::empty(page, Disposition::NotHtml),
        (None, Some(html)) => analyze_html(page, html, detectors),
    }
}

fn analyze_html(
    page: &PageFetchResult,
    html: &str,
    detectors: &[Box<dyn SchemaDetector>],
) -> PageAnalysis {
    let document = Html::parse_document(html);
    let mut analysis = PageAnalysis::empty(page, Disposition::Analyzed);

    // Text
    let blocks = visible_text_blocks(&document);
    let sentences = split_sentences(&blocks);
    let syllables: usize = blocks
        .iter()
        .flat_map(|block| words(block))
        .map(count_syllables)
        .sum();

    analysis.word_count = blocks.iter().map(|b| count_words(b)).sum();
    analysis.sentence_count = sentences.len();
    analysis.question_count = sentences.iter().filter(|s| is_question(s)).count();
    analysis.qa_pair_count = count_qa_pairs(&sentences);
    analysis.readability =
        flesch_reading_ease(analysis.word_count, analysis.sentence_count, syllables);
    if analysis.word_count > 0 {
        analysis.readability_level = Some(ReadabilityLevel::from_score(analysis.readability));
    }
    analysis.keywords = keyword_stats(&blocks);

    // Headings
    let (headings, heading_issues) = heading_structure(&document);
    analysis.headings = headings;
    analysis.heading_issues = heading_issues;

    // Meta
    analysis.title_length = title_length(&document);
    analysis.meta_description_length = meta_description_length(&document);

    // Structured data
    for detector in detectors {
        let found = detector.detect(&document);
        if !found.is_empty() {
            debug!(url = %page.url, detector = detector.name(), types = ?found, "Schema types found");
        }
        analysis.schema_types.extend(found);
    }

    // Links, relative to where the page was served from
    if let Ok(base) = Url::parse(page.base_url()) {
        let (internal, external) = count_links(&document, &base);
        analysis.internal_links = internal;
        analysis.external_links = external;
    }

    // Images
    let (images, missing_alt) = count_images(&document);
    analysis.images = images;
    analysis.images_missing_alt = missing_alt;

    debug!(
        url = %page.url,
        words = analysis.word_count,
        sentences = analysis.sentence_count,
        "Page analyzed"
    );

    analysis
}

fn heading_structure(document: &Html) -> (HeadingCounts, Vec<String>) {
    let mut counts = HeadingCounts::default();
    let mut issues = Vec::new();

    let Ok(selector) = Selector::parse("h1, h2, h3, h4, h5, h6") else {
        return (counts, issues);
    };

    let mut previous: Option<u8> = None;
    for element in document.select(&selector) {
        // Tag names are "h1".."h6", the digit is the level
        let level = element.value().name()[1..].parse::<u8>().unwrap_or(6);
        counts.bump(level);

        if let Some(prev) = previous {
            if level > prev + 1 {
                issues.push(format!("H{} -> H{}", prev, level));
            }
        }
        previous = Some(level);
    }

    (counts, issues)
}

fn title_length(document: &Html) -> Option<usize> {
    let selector = Selector::parse("title").ok()?;
    let title = document.select(&selector).next()?;
    let text = title.text().collect::<String>();
    let len = text.trim().chars().count();
    if len == 0 {
        None
    } else {
        Some(len)
    }
}

fn meta_description_length(document: &Html) -> Option<usize> {
    let selector = Selector::parse("meta[name]").ok()?;
    document
        .select(&selector)
        .find(|meta| {
            meta.value()
                .attr("name")
                .map_or(false, |name| name.trim().eq_ignore_ascii_case("description"))
        })
        .map(|meta| {
            meta.value()
                .attr("content")
                .map_or(0, |content| content.trim().chars().count())
        })
}

// Returns (internal, external). Fragments and non-http(s) links count as
// neither.
fn count_links(document: &Html, page_url: &Url) -> (usize, usize) {
    let mut internal = 0;
    let mut external = 0;

    let Ok(selector) = Selector::parse("a[href]") else {
        return (internal, external);
    };

    for element in document.select(&selector) {
        let Some(href) = element.value().attr("href") else {
            continue;
        };
        match resolve_link(page_url, href) {
            Some(target) if same_site(&target, page_url) => internal += 1,
            Some(_) => external += 1,
            None => {}
        }
    }

    (internal, external)
}

fn count_images(document: &Html) -> (usize, usize) {
    let Ok(selector) = Selector::parse("img") else {
        return (0, 0);
    };

    let mut total = 0;
    let mut missing_alt = 0;
    for img in document.select(&selector) {
        total += 1;
        let has_alt = img
            .value()
            .attr("alt")
            .map_or(false, |alt| !alt.trim().is_empty());
        if !has_alt {
            missing_alt += 1;
        }
    }

    (total, missing_alt)
}
