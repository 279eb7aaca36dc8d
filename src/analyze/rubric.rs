// src/analyze/rubric.rs
// =============================================================================
// The scoring rubric: every weight, threshold and band used by the analyzer.
//
// Nothing in the scoring code is hard-coded; it all reads from a Rubric. The
// defaults below are the documented product values. A rubric can also be
// loaded from a TOML file. Sections left out keep their defaults, but a
// [weights] or [thresholds] table must list all five categories:
//
//   [weights]
//   structure = 0.25
//   schema = 0.30
//   readability = 0.15
//   depth = 0.20
//   faq = 0.10
//
//   [depth]
//   full_words = 800
// =============================================================================

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The five sub-score categories.
///
/// Declaration order is the tie-break order used when sorting
/// recommendations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    ContentDepth,
    Structure,
    Schema,
    Faq,
    Readability,
}

impl Category {
    pub const ALL: [Category; 5] = [
        Category::ContentDepth,
        Category::Structure,
        Category::Schema,
        Category::Faq,
        Category::Readability,
    ];

    /// Stable identifier, also used as the recommendation id.
    pub fn id(&self) -> &'static str {
        match self {
            Category::ContentDepth => "content-depth",
            Category::Structure => "structure",
            Category::Schema => "schema",
            Category::Faq => "faq",
            Category::Readability => "readability",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Category::ContentDepth => "Content depth",
            Category::Structure => "Structure",
            Category::Schema => "Schema markup",
            Category::Faq => "FAQ coverage",
            Category::Readability => "Readability",
        }
    }
}

/// One number per category. Used for sub-scores, weights and thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PerCategory {
    pub structure: f64,
    pub schema: f64,
    pub readability: f64,
    pub depth: f64,
    pub faq: f64,
}

impl PerCategory {
    pub fn get(&self, category: Category) -> f64 {
        match category {
            Category::ContentDepth => self.depth,
            Category::Structure => self.structure,
            Category::Schema => self.schema,
            Category::Faq => self.faq,
            Category::Readability => self.readability,
        }
    }

    pub fn sum(&self) -> f64 {
        self.structure + self.schema + self.readability + self.depth + self.faq
    }

    /// Applies `f` to every entry.
    pub fn map(&self, f: impl Fn(f64) -> f64) -> PerCategory {
        PerCategory {
            structure: f(self.structure),
            schema: f(self.schema),
            readability: f(self.readability),
            depth: f(self.depth),
            faq: f(self.faq),
        }
    }
}

/// Structure sub-score inputs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StructureBand {
    /// Word count that earns full word credit (linear from 0)
    pub target_words: usize,
    /// Heading credit every page gets
    pub base_credit: f64,
    /// Added when the page has exactly one H1
    pub h1_credit: f64,
    /// Added when the page has at least one H2
    pub h2_credit: f64,
}

impl Default for StructureBand {
    fn default() -> Self {
        Self {
            target_words: 300,
            base_credit: 0.2,
            h1_credit: 0.4,
            h2_credit: 0.4,
        }
    }
}

/// Depth sub-score: 0 at or below `thin_words`, 100 at `full_words`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DepthBand {
    pub thin_words: usize,
    pub full_words: usize,
}

impl Default for DepthBand {
    fn default() -> Self {
        Self {
            thin_words: 50,
            full_words: 500,
        }
    }
}

/// Flesch reading ease at `floor` maps to 0, at `ceiling` to 100.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ReadabilityBand {
    pub floor: f64,
    pub ceiling: f64,
}

impl Default for ReadabilityBand {
    fn default() -> Self {
        Self {
            floor: 10.0,
            ceiling: 70.0,
        }
    }
}

/// Gap boundaries for recommendation severity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SeverityBands {
    /// Gaps strictly above this are HIGH
    pub high_gap: f64,
    /// Gaps at or above this (and not HIGH) are MEDIUM
    pub medium_gap: f64,
}

impl Default for SeverityBands {
    fn default() -> Self {
        Self {
            high_gap: 40.0,
            medium_gap: 15.0,
        }
    }
}

/// Complete scoring configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Rubric {
    pub weights: PerCategory,
    pub thresholds: PerCategory,
    pub structure: StructureBand,
    pub depth: DepthBand,
    pub readability: ReadabilityBand,
    pub severity: SeverityBands,
    /// Structured-data types that earn schema credit
    pub recognized_schema_types: Vec<String>,
}

impl Default for Rubric {
    fn default() -> Self {
        Self {
            weights: PerCategory {
                structure: 0.25,
                schema: 0.20,
                readability: 0.15,
                depth: 0.20,
                faq: 0.20,
            },
            thresholds: PerCategory {
                structure: 70.0,
                schema: 50.0,
                readability: 50.0,
                depth: 60.0,
                faq: 30.0,
            },
            structure: StructureBand::default(),
            depth: DepthBand::default(),
            readability: ReadabilityBand::default(),
            severity: SeverityBands::default(),
            recognized_schema_types: [
                "Article",
                "BlogPosting",
                "BreadcrumbList",
                "FAQPage",
                "HowTo",
                "LocalBusiness",
                "NewsArticle",
                "Organization",
                "Person",
                "Product",
                "QAPage",
                "Question",
                "Recipe",
                "Review",
                "TechArticle",
                "WebPage",
                "WebSite",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
        }
    }
}

#[derive(Debug, Error)]
pub enum RubricError {
    #[error("failed to read rubric file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse rubric: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("weights must sum to 1.0, got {0:.4}")]
    WeightSum(f64),

    #[error("{0}")]
    Band(String),
}

impl Rubric {
    pub fn from_toml_str(text: &str) -> Result<Self, RubricError> {
        let rubric: Rubric = toml::from_str(text)?;
        rubric.validate()?;
        Ok(rubric)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, RubricError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| RubricError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// Checks that every number is finite, weights sum to 1.0 and every
    /// band is well-ordered.
    pub fn validate(&self) -> Result<(), RubricError> {
        // NaN slips through every comparison below, so catch it first
        let mut numbers: Vec<(String, f64)> = Vec::new();
        for category in Category::ALL {
            numbers.push((format!("weights.{}", category.id()), self.weights.get(category)));
            numbers.push((
                format!("thresholds.{}", category.id()),
                self.thresholds.get(category),
            ));
        }
        numbers.extend([
            ("structure.base_credit".to_string(), self.structure.base_credit),
            ("structure.h1_credit".to_string(), self.structure.h1_credit),
            ("structure.h2_credit".to_string(), self.structure.h2_credit),
            ("readability.floor".to_string(), self.readability.floor),
            ("readability.ceiling".to_string(), self.readability.ceiling),
            ("severity.high_gap".to_string(), self.severity.high_gap),
            ("severity.medium_gap".to_string(), self.severity.medium_gap),
        ]);
        if let Some((name, value)) = numbers.iter().find(|(_, v)| !v.is_finite()) {
            return Err(RubricError::Band(format!(
                "{} must be a finite number, got {}",
                name, value
            )));
        }

        let weights = [
            self.weights.structure,
            self.weights.schema,
            self.weights.readability,
            self.weights.depth,
            self.weights.faq,
        ];
        if weights.iter().any(|w| *w < 0.0) {
            return Err(RubricError::Band("weights must not be negative".to_string()));
        }
        let sum = self.weights.sum();
        if (sum - 1.0).abs() > 1e-6 {
            return Err(RubricError::WeightSum(sum));
        }

        for category in Category::ALL {
            let t = self.thresholds.get(category);
            if !(0.0..=100.0).contains(&t) {
                return Err(RubricError::Band(format!(
                    "threshold for {} must be within 0..=100, got {}",
                    category.id(),
                    t
                )));
            }
        }

        if self.structure.target_words == 0 {
            return Err(RubricError::Band(
                "structure.target_words must be greater than zero".to_string(),
            ));
        }
        let heading_total =
            self.structure.base_credit + self.structure.h1_credit + self.structure.h2_credit;
        if (heading_total - 1.0).abs() > 1e-6 {
            return Err(RubricError::Band(format!(
                "structure heading credits must sum to 1.0, got {:.4}",
                heading_total
            )));
        }
        if self.depth.full_words <= self.depth.thin_words {
            return Err(RubricError::Band(
                "depth.full_words must be greater than depth.thin_words".to_string(),
            ));
        }
        if self.readability.ceiling <= self.readability.floor {
            return Err(RubricError::Band(
                "readability.ceiling must be greater than readability.floor".to_string(),
            ));
        }
        if self.severity.high_gap < self.severity.medium_gap {
            return Err(RubricError::Band(
                "severity.high_gap must not be below severity.medium_gap".to_string(),
            ));
        }
        Ok(())
    }

    pub fn is_recognized_type(&self, schema_type: &str) -> bool {
        self.recognized_schema_types
            .iter()
            .any(|t| t.eq_ignore_ascii_case(schema_type))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_rubric_is_valid() {
        let rubric = Rubric::default();
        assert!(rubric.validate().is_ok());
        assert!((rubric.weights.sum() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let rubric = Rubric::from_toml_str(
            r#"
            [weights]
            structure = 0.20
            schema = 0.25
            readability = 0.15
            depth = 0.20
            faq = 0.20

            [depth]
            thin_words = 100
            "#,
        )
        .unwrap();

        assert_eq!(rubric.weights.schema, 0.25);
        assert_eq!(rubric.depth.thin_words, 100);
        assert_eq!(rubric.depth.full_words, 500);
        assert_eq!(rubric.thresholds, Rubric::default().thresholds);
    }

    #[test]
    fn test_incomplete_category_table_rejected() {
        let err = Rubric::from_toml_str("[thresholds]\nfaq = 10.0\n").unwrap_err();
        assert!(matches!(err, RubricError::Parse(_)));
    }

    #[test]
    fn test_bad_weight_sum_rejected() {
        let err = Rubric::from_toml_str(
            "[weights]\nstructure = 0.5\nschema = 0.5\nreadability = 0.0\ndepth = 0.0\nfaq = 0.5\n",
        )
        .unwrap_err();
        assert!(matches!(err, RubricError::WeightSum(_)));
    }

    #[test]
    fn test_unknown_field_rejected() {
        let err = Rubric::from_toml_str("[weights]\nspeed = 1.0\n").unwrap_err();
        assert!(matches!(err, RubricError::Parse(_)));
    }

    #[test]
    fn test_inverted_band_rejected() {
        let mut rubric = Rubric::default();
        rubric.depth.full_words = 10;
        assert!(matches!(rubric.validate(), Err(RubricError::Band(_))));
    }

    #[test]
    fn test_non_finite_numbers_rejected() {
        let mut rubric = Rubric::default();
        rubric.weights.faq = f64::NAN;
        assert!(matches!(rubric.validate(), Err(RubricError::Band(_))));

        let mut rubric = Rubric::default();
        rubric.readability.ceiling = f64::INFINITY;
        assert!(matches!(rubric.validate(), Err(RubricError::Band(_))));

        let mut rubric = Rubric::default();
        rubric.severity.medium_gap = f64::NEG_INFINITY;
        assert!(matches!(rubric.validate(), Err(RubricError::Band(_))));

        // TOML accepts nan, validation does not
        let err = Rubric::from_toml_str(
            "[weights]\nstructure = nan\nschema = 0.25\nreadability = 0.15\ndepth = 0.20\nfaq = 0.20\n",
        )
        .unwrap_err();
        assert!(matches!(err, RubricError::Band(_)));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[readability]\nfloor = 0.0\nceiling = 60.0").unwrap();

        let rubric = Rubric::load(file.path()).unwrap();
        assert_eq!(rubric.readability.ceiling, 60.0);
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = Rubric::load("/definitely/not/here.toml").unwrap_err();
        assert!(matches!(err, RubricError::Io { .. }));
    }
}
