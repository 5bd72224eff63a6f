//! Query Metrics Module
//!
//! Wall-clock timing and result counts for remote queries.

use std::time::Instant;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::debug;

// == Query Metrics ==
/// Execution record for one query.
#[derive(Debug, Clone, Serialize)]
pub struct QueryMetrics {
    /// Caller-supplied query name, e.g. `ingredients:list`
    pub name: String,
    /// Wall-clock duration in milliseconds
    pub duration_ms: u64,
    /// Number of items the query returned
    pub item_count: usize,
    /// When the query finished
    pub recorded_at: DateTime<Utc>,
}

// == Query Timer ==
/// Started when a query begins; `finish` records its metrics.
#[derive(Debug)]
pub struct QueryTimer {
    name: String,
    started: Instant,
}

impl QueryTimer {
    // == Start ==
    /// Starts timing a named query.
    pub fn start(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            started: Instant::now(),
        }
    }

    // == Finish ==
    /// Stops the timer, logs the execution, and returns the record.
    pub fn finish(self, item_count: usize) -> QueryMetrics {
        let duration_ms = self.started.elapsed().as_millis() as u64;
        debug!(
            query = %self.name,
            duration_ms,
            item_count,
            "query executed"
        );
        QueryMetrics {
            name: self.name,
            duration_ms,
            item_count,
            recorded_at: Utc::now(),
        }
    }
}
