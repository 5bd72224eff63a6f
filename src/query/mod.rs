//! Query Module
//!
//! Shapes declarative query options into ordered remote-builder
//! constraints and records query execution metrics.

mod metrics;
mod shaper;

pub use metrics::{QueryMetrics, QueryTimer};
pub use shaper::{
    build_constraints, dedup_by_id, effective_page_size, QueryConstraint, QueryOptions,
    SortDirection, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE,
};
