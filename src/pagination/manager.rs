//! Page Manager Module
//!
//! Stateful forward/backward paging and infinite-scroll accumulation over
//! a remote paged source, with per-page caching.

use std::collections::{HashMap, HashSet};
use std::future::Future;

use tokio::sync::Mutex;
use tracing::debug;

use crate::error::{CacheError, Result};
use crate::pagination::{Cursor, Identify, Page, PageState, PagingMode};
use crate::query::DEFAULT_PAGE_SIZE;

// == Manager State ==
/// Mutable pagination state, guarded by the manager's lock.
#[derive(Debug)]
struct ManagerState<T> {
    /// Current page contents (Paged) or cumulative items (Append)
    items: Vec<T>,
    /// Current page number, 1-based
    current_page: usize,
    /// Items per page
    page_size: usize,
    /// Whether the source reports further pages
    has_more: bool,
    /// The manager's own continuation cursor (drives append mode)
    cursor: Option<Cursor>,
    /// Total items across all cached pages
    total_loaded: usize,
    /// Cached page contents by page number
    pages: HashMap<usize, Vec<T>>,
    /// End-of-page cursor observed for each loaded page
    cursors: HashMap<usize, Option<Cursor>>,
    /// Number of fetches in flight; appends self-serialize on this.
    /// A counter rather than a flag so overlapping page loads cannot
    /// clear each other's in-flight status.
    in_flight: usize,
}

impl<T> ManagerState<T> {
    fn new(page_size: usize) -> Self {
        Self {
            items: Vec::new(),
            current_page: 1,
            page_size,
            has_more: true,
            cursor: None,
            total_loaded: 0,
            pages: HashMap::new(),
            cursors: HashMap::new(),
            in_flight: 0,
        }
    }

    fn reset(&mut self) {
        let page_size = self.page_size;
        *self = Self::new(page_size);
    }
}

// == Page Manager ==
/// Cursor-based pagination over a remote source
/// `fetch(cursor) -> Page<T>`.
///
/// The paging mode is fixed at construction: `Paged` instances navigate
/// with [`load_page`](Self::load_page) and serve repeat visits from the
/// page cache; `Append` instances accumulate deduplicated items with
/// [`append_next_page`](Self::append_next_page). Calling an operation of
/// the other mode is an error.
///
/// One manager instance per logical list; concurrent `load_page` calls on
/// one instance are not ordered (await each call for strict ordering),
/// while appends self-serialize via the in-flight counter.
#[derive(Debug)]
pub struct PageManager<T> {
    mode: PagingMode,
    state: Mutex<ManagerState<T>>,
}

impl<T> PageManager<T>
where
    T: Clone + Identify,
{
    // == Constructor ==
    /// Creates a manager in the given mode with the given page size.
    ///
    /// A page size of zero falls back to the default of 50.
    pub fn new(mode: PagingMode, page_size: usize) -> Self {
        let page_size = if page_size == 0 {
            DEFAULT_PAGE_SIZE
        } else {
            page_size
        };
        Self {
            mode,
            state: Mutex::new(ManagerState::new(page_size)),
        }
    }

    // == Load Page ==
    /// Loads page `n` (1-based), serving it from the page cache when the
    /// page was fetched before.
    ///
    /// An uncached page resumes from the cursor recorded at the end of
    /// page `n-1` (or from the start for page 1). Requesting an uncached
    /// page whose predecessor was never loaded is a [`CacheError::PageGap`].
    pub async fn load_page<F, Fut>(&self, n: usize, fetch: F) -> Result<Vec<T>>
    where
        F: FnOnce(Option<Cursor>) -> Fut,
        Fut: Future<Output = Result<Page<T>>>,
    {
        self.require_mode(PagingMode::Paged)?;
        if n == 0 {
            return Err(CacheError::InvalidRequest(
                "Page numbers are 1-based".to_string(),
            ));
        }

        let resume_cursor = {
            let mut state = self.state.lock().await;

            if let Some(items) = state.pages.get(&n) {
                debug!(page = n, "serving page from cache");
                let items = items.clone();
                state.items = items.clone();
                state.current_page = n;
                state.cursor = state.cursors.get(&n).cloned().flatten();
                return Ok(items);
            }

            let resume_cursor = if n == 1 {
                None
            } else {
                match state.cursors.get(&(n - 1)) {
                    Some(Some(cursor)) => Some(cursor.clone()),
                    // Predecessor loaded but terminal, or never loaded:
                    // there is nothing to resume from.
                    Some(None) | None => return Err(CacheError::PageGap(n)),
                }
            };
            state.in_flight += 1;
            resume_cursor
        };

        let outcome = fetch(resume_cursor).await;

        let mut state = self.state.lock().await;
        state.in_flight -= 1;
        let page = outcome?;

        debug!(page = n, items = page.data.len(), has_more = page.has_more, "page loaded");
        state.pages.insert(n, page.data.clone());
        state.cursors.insert(n, page.cursor.clone());
        state.items = page.data.clone();
        state.current_page = n;
        state.has_more = page.has_more;
        state.cursor = page.cursor;
        state.total_loaded = state.pages.values().map(Vec::len).sum();

        Ok(page.data)
    }

    // == Load Next Page ==
    /// Loads the page after the current one.
    ///
    /// Returns an empty sequence without fetching when the source is
    /// exhausted.
    pub async fn load_next_page<F, Fut>(&self, fetch: F) -> Result<Vec<T>>
    where
        F: FnOnce(Option<Cursor>) -> Fut,
        Fut: Future<Output = Result<Page<T>>>,
    {
        self.require_mode(PagingMode::Paged)?;
        let next = {
            let state = self.state.lock().await;
            if !state.has_more {
                return Ok(Vec::new());
            }
            state.current_page + 1
        };
        self.load_page(next, fetch).await
    }

    // == Load Previous Page ==
    /// Loads the page before the current one.
    ///
    /// Returns the current items without fetching when already on page 1.
    /// The previous page is normally served from the page cache.
    pub async fn load_previous_page<F, Fut>(&self, fetch: F) -> Result<Vec<T>>
    where
        F: FnOnce(Option<Cursor>) -> Fut,
        Fut: Future<Output = Result<Page<T>>>,
    {
        self.require_mode(PagingMode::Paged)?;
        let previous = {
            let state = self.state.lock().await;
            if state.current_page == 1 {
                return Ok(state.items.clone());
            }
            state.current_page - 1
        };
        self.load_page(previous, fetch).await
    }

    // == Append Next Page ==
    /// Infinite-scroll: fetches the next page from the manager's own
    /// cursor, appends onto `items`, and drops any item whose id is
    /// already present (first occurrence wins).
    ///
    /// Returns the current items without fetching when the source is
    /// exhausted or another load is already in flight.
    pub async fn append_next_page<F, Fut>(&self, fetch: F) -> Result<Vec<T>>
    where
        F: FnOnce(Option<Cursor>) -> Fut,
        Fut: Future<Output = Result<Page<T>>>,
    {
        self.require_mode(PagingMode::Append)?;

        let resume_cursor = {
            let mut state = self.state.lock().await;
            if !state.has_more || state.in_flight > 0 {
                return Ok(state.items.clone());
            }
            state.in_flight += 1;
            state.cursor.clone()
        };

        let outcome = fetch(resume_cursor).await;

        let mut state = self.state.lock().await;
        state.in_flight -= 1;
        let page = outcome?;

        let mut seen: HashSet<T::Id> = state.items.iter().map(|item| item.id()).collect();
        let mut appended = 0;
        for item in page.data {
            if seen.insert(item.id()) {
                state.items.push(item);
                appended += 1;
            }
        }

        debug!(appended, total = state.items.len(), has_more = page.has_more, "page appended");
        state.current_page += 1;
        state.has_more = page.has_more;
        state.cursor = page.cursor;
        state.total_loaded = state.items.len();

        Ok(state.items.clone())
    }

    // == Reset ==
    /// Clears items, the page cache, and the cursor map, returning to
    /// page 1 with `has_more = true`. The page size is kept.
    pub async fn reset(&self) {
        self.state.lock().await.reset();
    }

    // == Set Page Size ==
    /// Changes the page size, resetting all state when it differs: cached
    /// page boundaries no longer align once the size changes.
    pub async fn set_page_size(&self, page_size: usize) -> Result<()> {
        if page_size == 0 {
            return Err(CacheError::InvalidRequest(
                "Page size must be positive".to_string(),
            ));
        }
        let mut state = self.state.lock().await;
        if state.page_size != page_size {
            state.page_size = page_size;
            state.reset();
        }
        Ok(())
    }

    // == Accessors ==
    /// Snapshot of the current state.
    pub async fn state(&self) -> PageState<T> {
        let state = self.state.lock().await;
        PageState {
            items: state.items.clone(),
            current_page: state.current_page,
            page_size: state.page_size,
            has_more: state.has_more,
            cursor: state.cursor.clone(),
            total_loaded: state.total_loaded,
        }
    }

    /// True while at least one fetch is in flight.
    pub async fn is_loading(&self) -> bool {
        self.state.lock().await.in_flight > 0
    }

    /// Whether the source reports further pages.
    pub async fn has_more_pages(&self) -> bool {
        self.state.lock().await.has_more
    }

    /// Current page number, 1-based.
    pub async fn current_page(&self) -> usize {
        self.state.lock().await.current_page
    }

    /// Total items loaded across all cached pages.
    pub async fn total_loaded(&self) -> usize {
        self.state.lock().await.total_loaded
    }

    /// Number of pages needed for `total_count` items at the current
    /// page size, rounded up.
    pub async fn calculate_total_pages(&self, total_count: usize) -> usize {
        let page_size = self.state.lock().await.page_size;
        total_count.div_ceil(page_size)
    }

    /// The mode this manager was constructed in.
    pub fn mode(&self) -> PagingMode {
        self.mode
    }

    fn require_mode(&self, required: PagingMode) -> Result<()> {
        if self.mode == required {
            Ok(())
        } else {
            Err(CacheError::WrongMode(format!(
                "operation requires {:?} mode but manager is {:?}",
                required, self.mode
            )))
        }
    }
}
