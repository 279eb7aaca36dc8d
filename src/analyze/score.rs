// src/analyze/score.rs
// =============================================================================
// Sub-scores and the site report.
//
// Three sub-scores are computed per page and averaged:
//   structure   = word credit x heading credit x 100
//   readability = Flesch score mapped onto the rubric's floor..ceiling band
//   depth       = word count mapped onto the rubric's thin..full band
//
// Two are fractions of pages:
//   schema = pages with a recognized structured-data type
//   faq    = pages with a question-answer pair (or FAQPage/QAPage markup)
//
// The final score is the weighted sum of the five, rounded.
//
// Determinism: build_report() sorts the analyses by URL before reducing, so
// the floating-point sums always run in the same order.
// =============================================================================

use serde::{Deserialize, Serialize};

use super::page::PageAnalysis;
use super::recommend::{recommend, round1, Recommendation};
use super::rubric::{Category, PerCategory, Rubric};

/// Per-page sub-scores (0-100).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PageScores {
    pub structure: f64,
    pub readability: f64,
    pub depth: f64,
}

/// One row of the per-page snapshot in a report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageSnapshot {
    #[serde(flatten)]
    pub analysis: PageAnalysis,
    /// None for pages that were not scored (failed or non-HTML)
    pub scores: Option<PageScores>,
}

/// The result of analyzing a whole site.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SiteReport {
    /// Overall AI-readiness score, 0-100
    pub score: u8,
    pub sub_scores: PerCategory,
    pub recommendations: Vec<Recommendation>,
    pub pages_analyzed: usize,
    pub pages_failed: usize,
    /// pages_failed / (pages_analyzed + pages_failed)
    pub failure_ratio: f64,
    /// Sorted by URL
    pub pages: Vec<PageSnapshot>,
}

/// Difference between two reports (this site minus the other one).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportComparison {
    pub score_delta: i32,
    pub sub_score_deltas: PerCategory,
    /// Categories where this site scores lower, biggest deficit first
    pub behind_in: Vec<Category>,
}

impl SiteReport {
    /// Compares this report against a competitor's.
    pub fn compare(&self, other: &SiteReport) -> ReportComparison {
        let sub_score_deltas = PerCategory {
            structure: round1(self.sub_scores.structure - other.sub_scores.structure),
            schema: round1(self.sub_scores.schema - other.sub_scores.schema),
            readability: round1(self.sub_scores.readability - other.sub_scores.readability),
            depth: round1(self.sub_scores.depth - other.sub_scores.depth),
            faq: round1(self.sub_scores.faq - other.sub_scores.faq),
        };

        let mut behind_in: Vec<Category> = Category::ALL
            .iter()
            .copied()
            .filter(|c| sub_score_deltas.get(*c) < 0.0)
            .collect();
        behind_in.sort_by(|a, b| {
            sub_score_deltas
                .get(*a)
                .total_cmp(&sub_score_deltas.get(*b))
                .then_with(|| a.cmp(b))
        });

        ReportComparison {
            score_delta: i32::from(self.score) - i32::from(other.score),
            sub_score_deltas,
            behind_in,
        }
    }
}

// Linear ramp: 0 at or below `low`, 100 at or above `high`.
fn ramp(value: f64, low: f64, high: f64) -> f64 {
    if high <= low {
        return if value >= high { 100.0 } else { 0.0 };
    }
    ((value - low) / (high - low) * 100.0).clamp(0.0, 100.0)
}

pub fn structure_score(page: &PageAnalysis, rubric: &Rubric) -> f64 {
    let band = &rubric.structure;
    let word_credit = (page.word_count as f64 / band.target_words as f64).min(1.0);

    let mut heading_credit = band.base_credit;
    if page.headings.h1 == 1 {
        heading_credit += band.h1_credit;
    }
    if page.headings.h2 >= 1 {
        heading_credit += band.h2_credit;
    }

    (word_credit * heading_credit * 100.0).clamp(0.0, 100.0)
}

pub fn readability_score(page: &PageAnalysis, rubric: &Rubric) -> f64 {
    if page.word_count == 0 {
        return 0.0;
    }
    ramp(page.readability, rubric.readability.floor, rubric.readability.ceiling)
}

pub fn depth_score(page: &PageAnalysis, rubric: &Rubric) -> f64 {
    ramp(
        page.word_count as f64,
        rubric.depth.thin_words as f64,
        rubric.depth.full_words as f64,
    )
}

pub fn page_scores(page: &PageAnalysis, rubric: &Rubric) -> PageScores {
    PageScores {
        structure: structure_score(page, rubric),
        readability: readability_score(page, rubric),
        depth: depth_score(page, rubric),
    }
}

fn earns_schema_credit(page: &PageAnalysis, rubric: &Rubric) -> bool {
    page.schema_types.iter().any(|t| rubric.is_recognized_type(t))
}

fn earns_faq_credit(page: &PageAnalysis) -> bool {
    page.qa_pair_count > 0 || page.has_schema_type("FAQPage") || page.has_schema_type("QAPage")
}

/// Reduces page analyses into a SiteReport.
///
/// Input order does not matter.
pub fn build_report(mut analyses: Vec<PageAnalysis>, rubric: &Rubric) -> SiteReport {
    analyses.sort_by(|a, b| {
        a.url
            .cmp(&b.url)
            .then_with(|| a.http_status.cmp(&b.http_status))
            .then_with(|| a.word_count.cmp(&b.word_count))
    });

    let mut totals = PerCategory::default();
    let mut pages_analyzed = 0usize;
    let mut pages_failed = 0usize;
    let mut pages = Vec::with_capacity(analyses.len());

    for analysis in analyses {
        let scores = if analysis.is_analyzed() {
            let scores = page_scores(&analysis, rubric);
            pages_analyzed += 1;
            totals.structure += scores.structure;
            totals.readability += scores.readability;
            totals.depth += scores.depth;
            if earns_schema_credit(&analysis, rubric) {
                totals.schema += 100.0;
            }
            if earns_faq_credit(&analysis) {
                totals.faq += 100.0;
            }
            Some(scores)
        } else {
            if analysis.error.is_some() {
                pages_failed += 1;
            }
            None
        };
        pages.push(PageSnapshot { analysis, scores });
    }

    let sub_scores = if pages_analyzed == 0 {
        PerCategory::default()
    } else {
        let n = pages_analyzed as f64;
        totals.map(|total| total / n)
    };

    let weighted = Category::ALL
        .iter()
        .map(|c| rubric.weights.get(*c) * sub_scores.get(*c))
        .sum::<f64>();
    let score = weighted.round().clamp(0.0, 100.0) as u8;

    let recommendations = recommend(&sub_scores, rubric);

    let attempted = pages_analyzed + pages_failed;
    let failure_ratio = if attempted == 0 {
        0.0
    } else {
        (pages_failed as f64 / attempted as f64 * 1000.0).round() / 1000.0
    };

    SiteReport {
        score,
        sub_scores: sub_scores.map(round1),
        recommendations,
        pages_analyzed,
        pages_failed,
        failure_ratio,
        pages,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyze::page::{Disposition, HeadingCounts};
    use crate::error::PageErrorKind;
    use std::collections::BTreeSet;

    fn page(url: &str, words: usize, h1: usize, h2: usize) -> PageAnalysis {
        PageAnalysis {
            url: url.to_string(),
            http_status: Some(200),
            disposition: Disposition::Analyzed,
            error: None,
            word_count: words,
            sentence_count: words / 10,
            headings: HeadingCounts {
                h1,
                h2,
                ..Default::default()
            },
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
            readability: 60.0,
            readability_level: None,
            keywords: Default::default(),
        }
    }

    #[test]
    fn test_structure_score_bands() {
        let rubric = Rubric::default();
        assert_eq!(structure_score(&page("a", 300, 1, 1), &rubric), 100.0);
        assert_eq!(structure_score(&page("a", 600, 1, 2), &rubric), 100.0);
        // Two H1s lose the H1 credit
        assert!((structure_score(&page("a", 300, 2, 1), &rubric) - 60.0).abs() < 1e-9);
        assert!((structure_score(&page("a", 150, 1, 0), &rubric) - 30.0).abs() < 1e-9);
        assert_eq!(structure_score(&page("a", 0, 1, 1), &rubric), 0.0);
    }

    #[test]
    fn test_depth_and_readability_ramps() {
        let rubric = Rubric::default();
        assert_eq!(depth_score(&page("a", 50, 0, 0), &rubric), 0.0);
        assert_eq!(depth_score(&page("a", 275, 0, 0), &rubric), 50.0);
        assert_eq!(depth_score(&page("a", 900, 0, 0), &rubric), 100.0);

        let mut p = page("a", 100, 0, 0);
        p.readability = 40.0;
        assert_eq!(readability_score(&p, &rubric), 50.0);
        p.readability = 95.0;
        assert_eq!(readability_score(&p, &rubric), 100.0);
        p.readability = -20.0;
        assert_eq!(readability_score(&p, &rubric), 0.0);
    }

    #[test]
    fn test_fraction_scores() {
        let rubric = Rubric::default();
        let mut pages: Vec<PageAnalysis> = (0..10)
            .map(|i| page(&format!("https://example.com/{}", i), 400, 1, 1))
            .collect();
        pages[3].qa_pair_count = 2;
        pages[7].schema_types.insert("Product".to_string());
        pages[8].schema_types.insert("MadeUpType".to_string());

        let report = build_report(pages, &rubric);
        assert_eq!(report.sub_scores.faq, 10.0);
        assert_eq!(report.sub_scores.schema, 10.0);
        assert_eq!(report.pages_analyzed, 10);
    }

    #[test]
    fn test_failed_and_non_html_pages_are_excluded() {
        let rubric = Rubric::default();
        let mut failed = page("https://example.com/broken", 0, 0, 0);
        failed.disposition = Disposition::Failed;
        failed.error = Some(PageErrorKind::HttpStatus(404));
        let mut pdf = page("https://example.com/file.pdf", 0, 0, 0);
        pdf.disposition = Disposition::NotHtml;

        let report = build_report(
            vec![page("https://example.com", 400, 1, 1), failed, pdf],
            &rubric,
        );

        assert_eq!(report.pages_analyzed, 1);
        assert_eq!(report.pages_failed, 1);
        assert_eq!(report.failure_ratio, 0.5);
        assert_eq!(report.pages.len(), 3);
        assert_eq!(report.sub_scores.structure, 100.0);
        assert!(report.pages.iter().filter(|p| p.scores.is_none()).count() == 2);
    }

    #[test]
    fn test_empty_site_scores_zero() {
        let report = build_report(Vec::new(), &Rubric::default());
        assert_eq!(report.score, 0);
        assert_eq!(report.sub_scores, PerCategory::default());
        assert_eq!(report.failure_ratio, 0.0);
        assert_eq!(report.recommendations.len(), 5);
    }

    #[test]
    fn test_compare_reports() {
        let rubric = Rubric::default();
        let ours = build_report(vec![page("https://a.com", 100, 1, 0)], &rubric);
        let theirs = build_report(vec![page("https://b.com", 400, 1, 1)], &rubric);

        let diff = ours.compare(&theirs);
        assert!(diff.score_delta < 0);
        assert!(diff.sub_score_deltas.structure < 0.0);
        assert_eq!(diff.sub_score_deltas.schema, 0.0);
        assert_eq!(diff.behind_in, vec![Category::Structure, Category::ContentDepth]);
    }
}
