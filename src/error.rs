// src/error.rs
// =============================================================================
// Error types shared by the crawler, the analyzer and the binary.
//
// Two levels of failure:
// - PageErrorKind: something went wrong with ONE page. It is recorded on that
//   page's PageFetchResult and the crawl carries on.
// - EngineError: the whole call failed (bad input, or the seed URL could not
//   be fetched). These are returned to the caller.
//
// Rust concepts:
// - thiserror: derive macro that writes the Display/Error impls for us
// - #[from]: automatic conversion so the ? operator works across error types
// =============================================================================

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::analyze::RubricError;

/// Why a single page could not be fetched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Error)]
#[serde(tag = "kind", content = "status", rename_all = "snake_case")]
pub enum PageErrorKind {
    /// Connection refused, reset, or otherwise broken
    #[error("network error")]
    Network,
    /// Hostname could not be resolved
    #[error("could not resolve hostname")]
    Dns,
    /// No response within the per-request timeout
    #[error("request timed out")]
    Timeout,
    /// Redirect chain longer than the configured cap
    #[error("too many redirects")]
    TooManyRedirects,
    /// Server answered with a 4xx or 5xx status
    #[error("HTTP {0}")]
    HttpStatus(u16),
    /// Body could not be decoded as text
    #[error("response body could not be parsed")]
    Parse,
}

impl PageErrorKind {
    /// Transient failures get exactly one retry.
    ///
    /// DNS failures, 4xx answers, redirect loops and undecodable bodies
    /// will not change on a second attempt.
    pub fn is_transient(&self) -> bool {
        match self {
            PageErrorKind::Timeout | PageErrorKind::Network => true,
            PageErrorKind::HttpStatus(code) => (500..600).contains(code),
            PageErrorKind::Dns | PageErrorKind::TooManyRedirects | PageErrorKind::Parse => false,
        }
    }
}

/// Errors that abort an analyze/crawl call.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The request itself is malformed
    #[error("invalid configuration: {0}")]
    Config(String),

    /// The scoring rubric failed validation
    #[error("invalid rubric: {0}")]
    Rubric(#[from] RubricError),

    /// The seed URL failed on every attempt, so there is nothing to analyze
    #[error("seed URL {url} could not be fetched: {kind}")]
    SeedUnreachable { url: String, kind: PageErrorKind },

    /// The HTTP client could not be constructed
    #[error("failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),
}

pub type Result<T, E = EngineError> = std::result::Result<T, E>;
