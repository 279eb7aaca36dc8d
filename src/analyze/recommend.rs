// src/analyze/recommend.rs
// =============================================================================
// Turning sub-scores into a prioritized list of fixes.
//
// Every sub-score that falls below its threshold produces one
// Recommendation. The gap (threshold - sub-score) decides how urgent it is:
//
//   gap > 40         -> HIGH
//   15 <= gap <= 40  -> MEDIUM
//   gap < 15         -> LOW
//
// The list is sorted so the most urgent fix is always first, with a fixed
// category order breaking ties. That makes the output stable no matter how
// the pages arrived.
// =============================================================================

use std::cmp::Ordering;
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::rubric::{Category, PerCategory, Rubric, SeverityBands};

/// How urgent a recommendation is.
///
/// Declared most-severe first so sorting puts HIGH at the top.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    High,
    Medium,
    Low,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Severity::High => "HIGH",
            Severity::Medium => "MEDIUM",
            Severity::Low => "LOW",
        };
        write!(f, "{}", s)
    }
}

/// One actionable finding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub id: String,
    pub severity: Severity,
    pub category: Category,
    pub rationale: String,
    /// Sub-score the site got, one decimal
    pub current_value: f64,
    /// Threshold it needs to reach
    pub target_value: f64,
    pub gap: f64,
}

pub fn classify_severity(gap: f64, bands: &SeverityBands) -> Severity {
    if gap > bands.high_gap {
        Severity::High
    } else if gap >= bands.medium_gap {
        Severity::Medium
    } else {
        Severity::Low
    }
}

/// One recommendation per sub-score below its threshold, sorted.
pub fn recommend(sub_scores: &PerCategory, rubric: &Rubric) -> Vec<Recommendation> {
    let candidates = Category::ALL.iter().filter_map(|&category| {
        let current = sub_scores.get(category);
        let target = rubric.thresholds.get(category);
        if current >= target {
            return None;
        }
        let gap = target - current;
        Some(Recommendation {
            id: category.id().to_string(),
            severity: classify_severity(gap, &rubric.severity),
            category,
            rationale: rationale(category, current, target),
            current_value: round1(current),
            target_value: round1(target),
            gap: round1(gap),
        })
    });

    let mut recommendations = merge_by_category(candidates);
    recommendations.sort_by(compare_priority);
    recommendations
}

/// Keeps one recommendation per category: the most severe, then the one
/// with the largest gap.
pub fn merge_by_category(
    recommendations: impl IntoIterator<Item = Recommendation>,
) -> Vec<Recommendation> {
    let mut best: BTreeMap<Category, Recommendation> = BTreeMap::new();

    for rec in recommendations {
        match best.get(&rec.category) {
            Some(existing) if compare_priority(existing, &rec) != Ordering::Greater => {}
            _ => {
                best.insert(rec.category, rec);
            }
        }
    }

    best.into_values().collect()
}

/// Severity HIGH to LOW, then gap descending, then category order.
pub fn compare_priority(a: &Recommendation, b: &Recommendation) -> Ordering {
    a.severity
        .cmp(&b.severity)
        .then_with(|| b.gap.total_cmp(&a.gap))
        .then_with(|| a.category.cmp(&b.category))
}

fn rationale(category: Category, current: f64, target: f64) -> String {
    let advice = match category {
        Category::ContentDepth => {
            "Pages are thin. Expand key pages with substantive, self-contained explanations \
             that an answer engine can quote."
        }
        Category::Structure => {
            "Content is hard to segment. Give each page exactly one H1, break the body into \
             H2 sections and write enough text under them."
        }
        Category::Schema => {
            "Few pages carry structured data. Add schema.org markup (JSON-LD preferred) such \
             as Article, Product or Organization."
        }
        Category::Faq => {
            "Little question-and-answer content. Add FAQ sections that pair real user \
             questions with direct answers, ideally marked up as FAQPage."
        }
        Category::Readability => {
            "Text is hard to read. Use shorter sentences and plainer words."
        }
    };
    format!(
        "{} scored {:.1}, below the target of {:.1}. {}",
        category.label(),
        current,
        target,
        advice
    )
}

pub(crate) fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rec(category: Category, severity: Severity, gap: f64) -> Recommendation {
        Recommendation {
            id: category.id().to_string(),
            severity,
            category,
            rationale: String::new(),
            current_value: 0.0,
            target_value: gap,
            gap,
        }
    }

    #[test]
    fn test_severity_bands() {
        let bands = SeverityBands::default();
        assert_eq!(classify_severity(60.0, &bands), Severity::High);
        assert_eq!(classify_severity(40.0, &bands), Severity::Medium);
        assert_eq!(classify_severity(15.0, &bands), Severity::Medium);
        assert_eq!(classify_severity(14.9, &bands), Severity::Low);
    }

    #[test]
    fn test_only_scores_below_threshold_recommend() {
        let rubric = Rubric::default();
        let scores = PerCategory {
            structure: 100.0,
            schema: 0.0,
            readability: 45.0,
            depth: 60.0,
            faq: 30.0,
        };
        let recs = recommend(&scores, &rubric);

        let ids: Vec<&str> = recs.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["schema", "readability"]);
        assert_eq!(recs[0].severity, Severity::High);
        assert_eq!(recs[0].gap, 50.0);
        assert_eq!(recs[1].severity, Severity::Low);
        assert!(recs[0].rationale.contains("Schema markup scored 0.0"));
    }

    #[test]
    fn test_ordering_severity_gap_then_category() {
        let mut recs = vec![
            rec(Category::Readability, Severity::Medium, 20.0),
            rec(Category::Faq, Severity::High, 50.0),
            rec(Category::Schema, Severity::Medium, 20.0),
            rec(Category::Structure, Severity::Medium, 30.0),
            rec(Category::ContentDepth, Severity::Low, 5.0),
        ];
        recs.sort_by(compare_priority);

        let order: Vec<Category> = recs.iter().map(|r| r.category).collect();
        assert_eq!(
            order,
            vec![
                Category::Faq,
                Category::Structure,
                Category::Schema,
                Category::Readability,
                Category::ContentDepth,
            ]
        );
    }

    #[test]
    fn test_merge_keeps_most_severe() {
        let merged = merge_by_category(vec![
            rec(Category::Schema, Severity::Low, 10.0),
            rec(Category::Schema, Severity::High, 45.0),
            rec(Category::Schema, Severity::Medium, 30.0),
            rec(Category::Faq, Severity::Low, 2.0),
        ]);

        assert_eq!(merged.len(), 2);
        let schema = merged
            .iter()
            .find(|r| r.category == Category::Schema)
            .unwrap();
        assert_eq!(schema.severity, Severity::High);
        assert_eq!(schema.gap, 45.0);
    }

    #[test]
    fn test_severity_serializes_uppercase() {
        assert_eq!(serde_json::to_string(&Severity::High).unwrap(), r#""HIGH""#);
    }
}
