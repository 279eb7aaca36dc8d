// src/analyze/text.rs
// =============================================================================
// Visible text, sentences and readability.
//
// How text is pulled out of a page:
// 1. Walk every text node in the document
// 2. Drop nodes that sit inside chrome or non-content elements (script,
//    style, nav, header, footer...)
// 3. Every block-level element (p, li, h1..h6, div...) starts a new block,
//    so a heading never runs into the paragraph after it
//
// Sentences are then split on . ! ? inside each block; a block boundary
// always ends a sentence.
//
// Keyword statistics count "content words": purely alphabetic tokens of
// three or more letters that are not stop words.
// =============================================================================

use std::collections::HashMap;

use scraper::Html;
use serde::{Deserialize, Serialize};

/// Elements whose text is never part of the readable content.
const SKIPPED_ELEMENTS: [&str; 10] = [
    "head", "script", "style", "noscript", "template", "svg", "nav", "header", "footer", "aside",
];

/// Elements that start a new text block.
const BLOCK_ELEMENTS: [&str; 24] = [
    "address", "article", "blockquote", "body", "dd", "details", "div", "dl", "dt", "figcaption",
    "figure", "form", "h1", "h2", "h3", "h4", "h5", "h6", "li", "main", "p", "pre", "section",
    "td",
];

/// Words that turn a sentence into a question even without a '?'.
const INTERROGATIVES: [&str; 18] = [
    "what", "how", "why", "when", "where", "who", "which", "whose", "can", "could", "should",
    "would", "will", "is", "are", "do", "does", "did",
];

/// Function words left out of keyword statistics.
const STOP_WORDS: [&str; 96] = [
    "about", "above", "across", "after", "all", "along", "among", "and", "any", "are", "been",
    "before", "behind", "being", "below", "between", "beyond", "both", "but", "can", "could",
    "did", "does", "during", "each", "except", "few", "following", "for", "from", "had", "has",
    "have", "her", "hers", "him", "his", "how", "into", "its", "just", "may", "might", "more",
    "most", "must", "not", "now", "one", "other", "our", "ours", "over", "plus", "shall", "she",
    "should", "some", "such", "than", "that", "the", "their", "theirs", "them", "then", "there",
    "these", "they", "this", "those", "through", "too", "under", "very", "was", "were", "what",
    "when", "where", "which", "while", "who", "whom", "why", "will", "with", "within", "without",
    "would", "yet", "you", "your", "yours", "also", "only",
];

/// Keywords reported per page.
const TOP_KEYWORDS: usize = 10;

/// Collects the readable text of a document, one string per block.
pub fn visible_text_blocks(document: &Html) -> Vec<String> {
    let mut blocks: Vec<String> = Vec::new();
    let mut current = String::new();

    for node in document.root_element().descendants() {
        if let Some(element) = node.value().as_element() {
            let name = element.name();
            if BLOCK_ELEMENTS.contains(&name) || name == "br" || name == "tr" {
                flush_block(&mut current, &mut blocks);
            }
            continue;
        }

        let Some(text) = node.value().as_text() else {
            continue;
        };

        let hidden = node.ancestors().any(|ancestor| {
            ancestor
                .value()
                .as_element()
                .map_or(false, |e| SKIPPED_ELEMENTS.contains(&e.name()))
        });
        if hidden {
            continue;
        }

        let trimmed = text.trim();
        if !trimmed.is_empty() {
            if !current.is_empty() {
                current.push(' ');
            }
            current.push_str(trimmed);
        }
    }
    flush_block(&mut current, &mut blocks);

    blocks
}

fn flush_block(current: &mut String, blocks: &mut Vec<String>) {
    let collapsed = current.split_whitespace().collect::<Vec<_>>().join(" ");
    if !collapsed.is_empty() {
        blocks.push(collapsed);
    }
    current.clear();
}

/// Tokens that contain at least one letter or digit.
pub fn words(text: &str) -> impl Iterator<Item = &str> {
    text.split_whitespace()
        .filter(|token| token.chars().any(|c| c.is_alphanumeric()))
}

pub fn count_words(text: &str) -> usize {
    words(text).count()
}

/// Splits blocks into sentences, keeping the terminating punctuation.
///
/// Text left at the end of a block without a terminator is a sentence of
/// its own. Fragments with no words ("...", "?!") are dropped.
pub fn split_sentences(blocks: &[String]) -> Vec<String> {
    let mut sentences = Vec::new();

    for block in blocks {
        let mut current = String::new();
        let mut chars = block.chars().peekable();

        while let Some(c) = chars.next() {
            current.push(c);
            if matches!(c, '.' | '!' | '?') {
                // Keep runs like "?!" or "..." together
                while let Some(&next) = chars.peek() {
                    if matches!(next, '.' | '!' | '?') {
                        current.push(next);
                        chars.next();
                    } else {
                        break;
                    }
                }
                // A terminator only ends the sentence before whitespace, so
                // "3.5" and "example.com" stay intact
                if chars.peek().map_or(true, |next| next.is_whitespace()) {
                    push_sentence(&mut current, &mut sentences);
                }
            }
        }
        push_sentence(&mut current, &mut sentences);
    }

    sentences
}

fn push_sentence(current: &mut String, sentences: &mut Vec<String>) {
    let trimmed = current.trim();
    if count_words(trimmed) > 0 {
        sentences.push(trimmed.to_string());
    }
    current.clear();
}

/// A sentence is a question when it ends in '?' or opens with an
/// interrogative word.
pub fn is_question(sentence: &str) -> bool {
    let sentence = sentence.trim();
    if sentence.ends_with('?') {
        return true;
    }

    let Some(first) = words(sentence).next() else {
        return false;
    };
    let first: String = first
        .chars()
        .filter(|c| c.is_alphanumeric())
        .collect::<String>()
        .to_lowercase();
    INTERROGATIVES.contains(&first.as_str())
}

/// Question sentences immediately followed by a non-question sentence.
pub fn count_qa_pairs(sentences: &[String]) -> usize {
    sentences
        .windows(2)
        .filter(|pair| is_question(&pair[0]) && !is_question(&pair[1]))
        .count()
}

/// Vowel-group syllable estimate, minimum one per word.
pub fn count_syllables(word: &str) -> usize {
    let letters: Vec<char> = word
        .chars()
        .filter(|c| c.is_alphabetic())
        .flat_map(|c| c.to_lowercase())
        .collect();
    if letters.is_empty() {
        return 1;
    }

    let is_vowel = |c: char| matches!(c, 'a' | 'e' | 'i' | 'o' | 'u' | 'y');

    let mut count = 0;
    let mut previous_vowel = false;
    for &c in &letters {
        let vowel = is_vowel(c);
        if vowel && !previous_vowel {
            count += 1;
        }
        previous_vowel = vowel;
    }

    // Silent trailing 'e' ("make", "code") but not "-le" ("table")
    let n = letters.len();
    if n > 2 && letters[n - 1] == 'e' && !is_vowel(letters[n - 2]) && letters[n - 2] != 'l' {
        count -= 1;
    }

    count.max(1)
}

/// Flesch reading ease. Zero when there are no words.
pub fn flesch_reading_ease(word_count: usize, sentence_count: usize, syllable_count: usize) -> f64 {
    if word_count == 0 {
        return 0.0;
    }
    let sentences = sentence_count.max(1) as f64;
    let words = word_count as f64;
    let syllables = syllable_count as f64;

    206.835 - 1.015 * (words / sentences) - 84.6 * (syllables / words)
}

/// One frequent content word.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Keyword {
    pub word: String,
    pub count: usize,
    /// Percent of all content words, two decimals
    pub density: f64,
}

/// Keyword usage on one page.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KeywordStats {
    /// Content words on the page
    pub total_words: usize,
    pub unique_words: usize,
    /// Most frequent first, ties in alphabetical order
    pub top_keywords: Vec<Keyword>,
    /// unique / total, three decimals; 0 when there are no content words
    pub vocabulary_richness: f64,
}

pub fn keyword_stats(blocks: &[String]) -> KeywordStats {
    let mut counts: HashMap<String, usize> = HashMap::new();
    let mut total = 0;

    for block in blocks {
        for token in block.split(|c: char| !c.is_alphanumeric()) {
            if token.len() < 3 || !token.chars().all(|c| c.is_ascii_alphabetic()) {
                continue;
            }
            let word = token.to_ascii_lowercase();
            if STOP_WORDS.contains(&word.as_str()) {
                continue;
            }
            total += 1;
            *counts.entry(word).or_insert(0) += 1;
        }
    }

    if total == 0 {
        return KeywordStats::default();
    }

    let unique = counts.len();
    let mut ranked: Vec<(String, usize)> = counts.into_iter().collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));

    let top_keywords = ranked
        .into_iter()
        .take(TOP_KEYWORDS)
        .map(|(word, count)| Keyword {
            density: round_to(count as f64 * 100.0 / total as f64, 2),
            word,
            count,
        })
        .collect();

    KeywordStats {
        total_words: total,
        unique_words: unique,
        top_keywords,
        vocabulary_richness: round_to(unique as f64 / total as f64, 3),
    }
}

fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}

/// Human-readable band for a Flesch score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReadabilityLevel {
    VeryEasy,
    Easy,
    FairlyEasy,
    Standard,
    FairlyDifficult,
    Difficult,
    VeryDifficult,
}

impl ReadabilityLevel {
    pub fn from_score(score: f64) -> Self {
        if score >= 90.0 {
            ReadabilityLevel::VeryEasy
        } else if score >= 80.0 {
            ReadabilityLevel::Easy
        } else if score >= 70.0 {
            ReadabilityLevel::FairlyEasy
        } else if score >= 60.0 {
            ReadabilityLevel::Standard
        } else if score >= 50.0 {
            ReadabilityLevel::FairlyDifficult
        } else if score >= 30.0 {
            ReadabilityLevel::Difficult
        } else {
            ReadabilityLevel::VeryDifficult
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ReadabilityLevel::VeryEasy => "Very Easy",
            ReadabilityLevel::Easy => "Easy",
            ReadabilityLevel::FairlyEasy => "Fairly Easy",
            ReadabilityLevel::Standard => "Standard",
            ReadabilityLevel::FairlyDifficult => "Fairly Difficult",
            ReadabilityLevel::Difficult => "Difficult",
            ReadabilityLevel::VeryDifficult => "Very Difficult",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn blocks(html: &str) -> Vec<String> {
        visible_text_blocks(&Html::parse_document(html))
    }

    #[test]
    fn test_chrome_and_scripts_are_hidden() {
        let html = r#"
            <html><head><title>Title text</title><style>p { color: red }</style></head>
            <body>
              <header>Site header</header>
              <nav><a href="/">Home</a></nav>
              <h1>Main heading</h1>
              <p>Body copy.</p>
              <script>var x = 1;</script>
              <footer>Copyright</footer>
            </body></html>
        "#;
        assert_eq!(blocks(html), vec!["Main heading", "Body copy."]);
    }

    #[test]
    fn test_inline_elements_join_blocks_split() {
        let html = "<p>Some <b>bold</b> text</p><p>Next</p>";
        assert_eq!(blocks(html), vec!["Some bold text", "Next"]);
    }

    #[test]
    fn test_word_count_ignores_punctuation_tokens() {
        assert_eq!(count_words("Hello, world - it's 2024 !"), 4);
        assert_eq!(count_words("   "), 0);
    }

    #[test]
    fn test_split_sentences() {
        let input = vec![
            "Rust is fast. Is it safe? Yes! Version 1.75 shipped".to_string(),
            "Heading without stop".to_string(),
        ];
        assert_eq!(
            split_sentences(&input),
            vec![
                "Rust is fast.",
                "Is it safe?",
                "Yes!",
                "Version 1.75 shipped",
                "Heading without stop",
            ]
        );
    }

    #[test]
    fn test_question_detection() {
        assert!(is_question("Is Rust fast"));
        assert!(is_question("\"How\" does it work."));
        assert!(is_question("Ready?"));
        assert!(!is_question("Rust is fast."));
        assert!(!is_question("Whatever happens, ship it."));
    }

    #[test]
    fn test_qa_pairs() {
        let sentences: Vec<String> = [
            "What is Rust?",
            "A systems language.",
            "Why use it?",
            "How fast is it?",
            "Very fast.",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect();
        assert_eq!(count_qa_pairs(&sentences), 2);
    }

    #[test]
    fn test_syllables() {
        assert_eq!(count_syllables("cat"), 1);
        assert_eq!(count_syllables("make"), 1);
        assert_eq!(count_syllables("table"), 2);
        assert_eq!(count_syllables("readability"), 5);
        assert_eq!(count_syllables("42"), 1);
    }

    #[test]
    fn test_flesch() {
        assert_eq!(flesch_reading_ease(0, 0, 0), 0.0);
        // 10 one-syllable words in one sentence
        let score = flesch_reading_ease(10, 1, 10);
        assert!((score - (206.835 - 10.15 - 84.6)).abs() < 1e-9);
    }

    #[test]
    fn test_keyword_stats() {
        let input = vec![
            "Rust makes systems programming safe. Rust programs are fast and the compiler helps."
                .to_string(),
            "Rust rust RUST! Tokio 2024 it's".to_string(),
        ];
        let stats = keyword_stats(&input);

        assert_eq!(stats.total_words, 14);
        assert_eq!(stats.unique_words, 10);
        assert_eq!(stats.vocabulary_richness, 0.714);
        assert_eq!(stats.top_keywords.len(), 10);
        assert_eq!(
            stats.top_keywords[0],
            Keyword {
                word: "rust".to_string(),
                count: 5,
                density: 35.71,
            }
        );
        // Ties fall back to alphabetical order
        assert_eq!(stats.top_keywords[1].word, "compiler");
        assert!(stats.top_keywords.iter().all(|k| k.word != "the"));
    }

    #[test]
    fn test_keyword_stats_empty() {
        let stats = keyword_stats(&["A is on it. 42!".to_string()]);
        assert_eq!(stats, KeywordStats::default());
    }

    #[test]
    fn test_readability_levels() {
        assert_eq!(ReadabilityLevel::from_score(95.0), ReadabilityLevel::VeryEasy);
        assert_eq!(ReadabilityLevel::from_score(65.0), ReadabilityLevel::Standard);
        assert_eq!(ReadabilityLevel::from_score(-12.0), ReadabilityLevel::VeryDifficult);
        assert_eq!(ReadabilityLevel::FairlyDifficult.label(), "Fairly Difficult");
    }
}
