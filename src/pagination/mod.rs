//! Pagination Module
//!
//! Cursor-based paging over a remote source, with per-page caching and
//! infinite-scroll accumulation.

mod manager;
mod page;

pub use manager::PageManager;
pub use page::{Cursor, Identify, Page, PageState, PagingMode};
