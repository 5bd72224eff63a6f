//! Sidecache - client-side query caching
//!
//! A caching core for apps talking to a remote document store: a TTL
//! cache with FIFO eviction and pattern invalidation, a single-flight
//! fetch coordinator, a cursor pagination manager, and a query shaper.

pub mod cache;
pub mod config;
pub mod error;
pub mod fetch;
pub mod keys;
pub mod pagination;
pub mod query;
pub mod tasks;

pub use cache::{CacheStats, TtlCache};
pub use config::Config;
pub use error::{CacheError, Result};
pub use fetch::FetchCoordinator;
pub use keys::Mutation;
pub use pagination::{Cursor, Identify, Page, PageManager, PageState, PagingMode};
pub use query::{
    build_constraints, dedup_by_id, effective_page_size, QueryConstraint, QueryMetrics,
    QueryOptions, QueryTimer, SortDirection,
};
pub use tasks::Sweeper;
