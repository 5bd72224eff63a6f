//! Pagination Types Module
//!
//! Defines the remote page contract and the manager's observable state.

use std::hash::Hash;

use serde::{Deserialize, Serialize};

// == Cursor ==
/// Opaque continuation token returned by a paged remote source.
///
/// The token marks where the next page resumes; its contents are never
/// interpreted by this crate.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Cursor(String);

impl Cursor {
    /// Wraps a token produced by the remote source.
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Returns the raw token, e.g. to pass back over the wire.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

// == Identify ==
/// Stable unique identity for items flowing through pagination.
///
/// Append-mode deduplication keys on this id, not on structural equality.
pub trait Identify {
    type Id: Eq + Hash + Clone;

    fn id(&self) -> Self::Id;
}

// == Page ==
/// One page of results from the remote source.
#[derive(Debug, Clone)]
pub struct Page<T> {
    /// Items in this page, in remote order
    pub data: Vec<T>,
    /// Continuation token for the following page, if any
    pub cursor: Option<Cursor>,
    /// Whether the source reports further pages
    pub has_more: bool,
}

impl<T> Page<T> {
    /// A terminal empty page: no items, no cursor, nothing further.
    pub fn empty() -> Self {
        Self {
            data: Vec::new(),
            cursor: None,
            has_more: false,
        }
    }
}

// == Paging Mode ==
/// How a manager instance is driven. Fixed at construction; mixing the
/// two call families on one instance would leave `items` ambiguous
/// (single page contents vs. cumulative list).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PagingMode {
    /// Page-by-page navigation via `load_page` and friends
    Paged,
    /// Infinite-scroll accumulation via `append_next_page`
    Append,
}

// == Page State ==
/// Snapshot of a manager's observable state.
#[derive(Debug, Clone)]
pub struct PageState<T> {
    /// Current page contents (Paged) or cumulative deduplicated items (Append)
    pub items: Vec<T>,
    /// Current page number, 1-based
    pub current_page: usize,
    /// Items per page
    pub page_size: usize,
    /// Whether the source reports further pages
    pub has_more: bool,
    /// Continuation token for the next fetch, if any
    pub cursor: Option<Cursor>,
    /// Total items loaded across all cached pages
    pub total_loaded: usize,
}
