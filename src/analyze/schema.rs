// src/analyze/schema.rs
// =============================================================================
// Structured-data detection.
//
// A page can declare what it is (an Article, a Product, an FAQPage...) in
// three different ways. Each gets its own detector:
//
// - JSON-LD:   <script type="application/ld+json">{"@type": "Article"}</script>
// - Microdata: <div itemscope itemtype="https://schema.org/Product">
// - RDFa:      <div vocab="https://schema.org/" typeof="Recipe">
//
// Every detector returns a plain set of type names with any vocabulary
// prefix stripped ("https://schema.org/Product" -> "Product"). The page
// analyzer unions the sets; whether a type earns credit is decided later by
// the Rubric.
//
// Rust concepts:
// - Trait objects: Vec<Box<dyn SchemaDetector>> so callers can add detectors
// - BTreeSet: sorted set, keeps output deterministic
// =============================================================================

use std::collections::BTreeSet;

use scraper::{Html, Selector};
use serde_json::Value;

/// Finds structured-data type names in a parsed document.
pub trait SchemaDetector: Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &'static str;

    fn detect(&self, document: &Html) -> BTreeSet<String>;
}

/// The three built-in detectors.
pub fn default_detectors() -> Vec<Box<dyn SchemaDetector>> {
    vec![
        Box::new(JsonLdDetector),
        Box::new(MicrodataDetector),
        Box::new(RdfaDetector),
    ]
}

/// Reads `@type` values from JSON-LD script blocks.
pub struct JsonLdDetector;

impl SchemaDetector for JsonLdDetector {
    fn name(&self) -> &'static str {
        "json-ld"
    }

    fn detect(&self, document: &Html) -> BTreeSet<String> {
        let mut types = BTreeSet::new();

        if let Ok(selector) = Selector::parse(r#"script[type="application/ld+json"]"#) {
            for script in document.select(&selector) {
                let json_text = script.text().collect::<String>();
                // Broken blocks are common in the wild; skip them
                if let Ok(value) = serde_json::from_str::<Value>(&json_text) {
                    collect_json_ld_types(&value, &mut types);
                }
            }
        }

        types
    }
}

// Walks the whole JSON tree, so @graph arrays and nested entities
// ("author": {"@type": "Person"}) are picked up too.
fn collect_json_ld_types(value: &Value, types: &mut BTreeSet<String>) {
    match value {
        Value::Object(map) => {
            for (key, child) in map {
                if key == "@type" {
                    match child {
                        Value::String(s) => insert_type(s, types),
                        Value::Array(items) => {
                            for item in items {
                                if let Value::String(s) = item {
                                    insert_type(s, types);
                                }
                            }
                        }
                        _ => {}
                    }
                } else {
                    collect_json_ld_types(child, types);
                }
            }
        }
        Value::Array(items) => {
            for item in items {
                collect_json_ld_types(item, types);
            }
        }
        _ => {}
    }
}

/// Reads `itemtype` attributes (space-separated URL lists).
pub struct MicrodataDetector;

impl SchemaDetector for MicrodataDetector {
    fn name(&self) -> &'static str {
        "microdata"
    }

    fn detect(&self, document: &Html) -> BTreeSet<String> {
        attribute_types(document, "itemtype")
    }
}

/// Reads RDFa `typeof` attributes.
pub struct RdfaDetector;

impl SchemaDetector for RdfaDetector {
    fn name(&self) -> &'static str {
        "rdfa"
    }

    fn detect(&self, document: &Html) -> BTreeSet<String> {
        attribute_types(document, "typeof")
    }
}

fn attribute_types(document: &Html, attribute: &str) -> BTreeSet<String> {
    let mut types = BTreeSet::new();

    let Ok(selector) = Selector::parse(&format!("[{}]", attribute)) else {
        return types;
    };

    for element in document.select(&selector) {
        if let Some(value) = element.value().attr(attribute) {
            for token in value.split_whitespace() {
                insert_type(token, &mut types);
            }
        }
    }

    types
}

// Keeps only the local name: "https://schema.org/FAQPage", "schema:FAQPage"
// and "FAQPage" all become "FAQPage".
fn insert_type(raw: &str, types: &mut BTreeSet<String>) {
    let trimmed = raw.trim().trim_end_matches('/');
    let local = trimmed
        .rsplit(&['/', '#', ':'][..])
        .next()
        .unwrap_or(trimmed);
    if !local.is_empty() {
        types.insert(local.to_string());
    }
}
