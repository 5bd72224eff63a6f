//! Query Shaper Module
//!
//! Translates declarative query options into an ordered constraint list
//! for an order-sensitive remote query builder.

use serde_json::Value;

use crate::pagination::{Cursor, Identify};

// == Public Constants ==
/// Page size applied when a query does not specify one
pub const DEFAULT_PAGE_SIZE: usize = 50;

/// Hard page size cap; larger requests are clamped
pub const MAX_PAGE_SIZE: usize = 100;

// == Sort Direction ==
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    #[default]
    Ascending,
    Descending,
}

// == Query Options ==
/// Declarative description of a remote query.
#[derive(Debug, Clone, Default)]
pub struct QueryOptions {
    /// Equality filters, applied in the order given
    pub filters: Vec<(String, Value)>,
    /// Field to order results by
    pub order_by: Option<String>,
    /// Sort direction for `order_by`
    pub direction: SortDirection,
    /// Requested page size; defaulted and clamped during shaping
    pub page_size: Option<usize>,
    /// Continuation cursor to resume from
    pub cursor: Option<Cursor>,
}

impl QueryOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an equality filter on `field`.
    pub fn filter(mut self, field: impl Into<String>, value: Value) -> Self {
        self.filters.push((field.into(), value));
        self
    }

    /// Orders results by `field` in the given direction.
    pub fn order_by(mut self, field: impl Into<String>, direction: SortDirection) -> Self {
        self.order_by = Some(field.into());
        self.direction = direction;
        self
    }

    /// Requests a page size (clamped to [`MAX_PAGE_SIZE`] during shaping).
    pub fn page_size(mut self, size: usize) -> Self {
        self.page_size = Some(size);
        self
    }

    /// Resumes from a continuation cursor.
    pub fn cursor(mut self, cursor: Cursor) -> Self {
        self.cursor = Some(cursor);
        self
    }
}

// == Query Constraint ==
/// One element of the shaped query, in remote-builder order.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryConstraint {
    /// Equality filter on a field
    Filter { field: String, value: Value },
    /// Result ordering
    OrderBy {
        field: String,
        direction: SortDirection,
    },
    /// Maximum number of results
    Limit(usize),
    /// Resume after a continuation cursor
    StartAfter(Cursor),
}

// == Build Constraints ==
/// Shapes options into the constraint list the remote builder expects.
///
/// Construction order is fixed: equality filters, then ordering, then
/// limit, then cursor. The remote builder is order-sensitive and its
/// compound indexes assume filters precede sort keys.
pub fn build_constraints(options: &QueryOptions) -> Vec<QueryConstraint> {
    let mut constraints = Vec::with_capacity(options.filters.len() + 3);

    for (field, value) in &options.filters {
        constraints.push(QueryConstraint::Filter {
            field: field.clone(),
            value: value.clone(),
        });
    }

    if let Some(field) = &options.order_by {
        constraints.push(QueryConstraint::OrderBy {
            field: field.clone(),
            direction: options.direction,
        });
    }

    constraints.push(QueryConstraint::Limit(effective_page_size(
        options.page_size,
    )));

    if let Some(cursor) = &options.cursor {
        constraints.push(QueryConstraint::StartAfter(cursor.clone()));
    }

    constraints
}

// == Effective Page Size ==
/// Resolves a requested page size: default when unspecified or zero,
/// clamped to [`MAX_PAGE_SIZE`].
pub fn effective_page_size(requested: Option<usize>) -> usize {
    match requested {
        None | Some(0) => DEFAULT_PAGE_SIZE,
        Some(size) => size.min(MAX_PAGE_SIZE),
    }
}

// == Dedup By Id ==
/// Drops items whose id already occurred earlier in the sequence,
/// keeping the first occurrence and the original order.
pub fn dedup_by_id<T: Identify>(items: Vec<T>) -> Vec<T> {
    let mut seen = std::collections::HashSet::with_capacity(items.len());
    items
        .into_iter()
        .filter(|item| seen.insert(item.id()))
        .collect()
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Debug, Clone, PartialEq)]
    struct Row {
        id: String,
    }

    impl Identify for Row {
        type Id = String;

        fn id(&self) -> String {
            self.id.clone()
        }
    }

    #[test]
    fn test_constraint_order_full_options() {
        let options = QueryOptions::new()
            .filter("status", json!("active"))
            .filter("owner", json!("u1"))
            .order_by("created_at", SortDirection::Descending)
            .page_size(25)
            .cursor(Cursor::new("c9"));

        let constraints = build_constraints(&options);

        assert_eq!(constraints.len(), 5);
        assert!(matches!(&constraints[0], QueryConstraint::Filter { field, .. } if field == "status"));
        assert!(matches!(&constraints[1], QueryConstraint::Filter { field, .. } if field == "owner"));
        assert!(matches!(&constraints[2], QueryConstraint::OrderBy { field, direction }
            if field == "created_at" && *direction == SortDirection::Descending));
        assert_eq!(constraints[3], QueryConstraint::Limit(25));
        assert_eq!(constraints[4], QueryConstraint::StartAfter(Cursor::new("c9")));
    }

    #[test]
    fn test_empty_options_still_limit() {
        let constraints = build_constraints(&QueryOptions::new());

        assert_eq!(constraints, vec![QueryConstraint::Limit(DEFAULT_PAGE_SIZE)]);
    }

    #[test]
    fn test_page_size_clamped() {
        assert_eq!(effective_page_size(None), DEFAULT_PAGE_SIZE);
        assert_eq!(effective_page_size(Some(0)), DEFAULT_PAGE_SIZE);
        assert_eq!(effective_page_size(Some(10)), 10);
        assert_eq!(effective_page_size(Some(MAX_PAGE_SIZE)), MAX_PAGE_SIZE);
        assert_eq!(effective_page_size(Some(5000)), MAX_PAGE_SIZE);
    }

    #[test]
    fn test_oversized_request_clamped_in_constraints() {
        let options = QueryOptions::new().page_size(1000);
        let constraints = build_constraints(&options);
        assert_eq!(constraints, vec![QueryConstraint::Limit(MAX_PAGE_SIZE)]);
    }

    #[test]
    fn test_dedup_by_id_keeps_first_occurrence() {
        let rows = vec![
            Row { id: "a".to_string() },
            Row { id: "b".to_string() },
            Row { id: "a".to_string() },
            Row { id: "c".to_string() },
            Row { id: "b".to_string() },
        ];

        let deduped = dedup_by_id(rows);

        let ids: Vec<&str> = deduped.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_dedup_by_id_empty() {
        let deduped: Vec<Row> = dedup_by_id(Vec::new());
        assert!(deduped.is_empty());
    }
}
