//! Error types for the caching core
//!
//! Provides unified error handling using thiserror.
//!
//! All variants carry owned strings so the enum stays `Clone`: a single
//! fetch outcome must be broadcast verbatim to every caller waiting on
//! the same single-flight key.

use thiserror::Error;

// == Cache Error Enum ==
/// Unified error type for the caching core.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CacheError {
    /// Invalid request data (oversized key, zero page number, ...)
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Invalidation pattern failed to compile as a regex
    #[error("Invalid pattern: {0}")]
    InvalidPattern(String),

    /// Remote fetch failed; the message is propagated to every waiter
    #[error("Fetch failed: {0}")]
    Fetch(String),

    /// In-flight fetch was dropped before settling (e.g. `clear()`)
    #[error("Fetch aborted for key: {0}")]
    Aborted(String),

    /// Pagination operation called on a manager in the other mode
    #[error("Wrong paging mode: {0}")]
    WrongMode(String),

    /// Page requested out of sequence with no known continuation cursor
    #[error("No cursor recorded for page {0}; load pages in order")]
    PageGap(usize),
}

// == Result Type Alias ==
/// Convenience Result type for the caching core.
pub type Result<T> = std::result::Result<T, CacheError>;
