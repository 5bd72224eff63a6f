//! Cache Key Convention Module
//!
//! Structured cache keys of the form `<entity>:<operation>[:<id>]`,
//! e.g. `ingredients:list` or `ingredients:detail:123`, plus the fixed
//! invalidation pattern templates applied after each mutation kind.
//!
//! The convention is not enforced by types; callers that build keys by
//! hand must follow the same shape for pattern invalidation to reach them.

use regex::escape;

// == Key Builders ==
/// Builds a list key for an entity type, e.g. `ingredients:list`.
pub fn list_key(entity: &str) -> String {
    format!("{}:list", entity)
}

/// Builds a detail key for one entity, e.g. `ingredients:detail:123`.
pub fn detail_key(entity: &str, id: &str) -> String {
    format!("{}:detail:{}", entity, id)
}

/// Builds a count key for an entity type, e.g. `ingredients:count`.
pub fn count_key(entity: &str) -> String {
    format!("{}:count", entity)
}

/// Builds an arbitrary operation key, with optional id suffix.
pub fn entity_key(entity: &str, operation: &str, id: Option<&str>) -> String {
    match id {
        Some(id) => format!("{}:{}:{}", entity, operation, id),
        None => format!("{}:{}", entity, operation),
    }
}

// == Mutation ==
/// A write against the remote store that requires cache invalidation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mutation {
    /// A new entity was created
    Create,
    /// An existing entity was updated
    Update { id: String },
    /// An entity was deleted
    Delete { id: String },
}

// == Invalidation Patterns ==
/// Returns the regex patterns to invalidate after a mutation on `entity`.
///
/// Templates per mutation kind:
/// - create: all list and count keys for the entity
/// - update: list keys, the entity's detail key, and list keys of each
///   related entity type
/// - delete: list, detail, and count keys, plus any related-entity key
///   carrying the deleted id as a whole key segment (a bare substring
///   match would also hit ids that merely contain this one, e.g. id `7`
///   against `references:detail:77`)
///
/// Patterns are matched by unanchored search (see
/// [`TtlCache::invalidate_pattern`](crate::cache::TtlCache::invalidate_pattern)),
/// so each is anchored at the start here.
pub fn invalidation_patterns(entity: &str, mutation: &Mutation, related: &[&str]) -> Vec<String> {
    let entity = escape(entity);
    let mut patterns = Vec::new();

    match mutation {
        Mutation::Create => {
            patterns.push(format!("^{}:list", entity));
            patterns.push(format!("^{}:count", entity));
        }
        Mutation::Update { id } => {
            let id = escape(id);
            patterns.push(format!("^{}:list", entity));
            patterns.push(format!("^{}:detail:{}$", entity, id));
            for rel in related {
                patterns.push(format!("^{}:list", escape(rel)));
            }
        }
        Mutation::Delete { id } => {
            let id = escape(id);
            patterns.push(format!("^{}:list", entity));
            patterns.push(format!("^{}:detail:{}$", entity, id));
            patterns.push(format!("^{}:count", entity));
            for rel in related {
                patterns.push(format!("^{}:(.*:)?{}($|:)", escape(rel), id));
            }
        }
    }

    patterns
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_builders() {
        assert_eq!(list_key("ingredients"), "ingredients:list");
        assert_eq!(detail_key("ingredients", "123"), "ingredients:detail:123");
        assert_eq!(count_key("users"), "users:count");
        assert_eq!(entity_key("configs", "search", None), "configs:search");
        assert_eq!(entity_key("configs", "search", Some("q1")), "configs:search:q1");
    }

    #[test]
    fn test_create_patterns() {
        let patterns = invalidation_patterns("ingredients", &Mutation::Create, &[]);
        assert_eq!(patterns, vec!["^ingredients:list", "^ingredients:count"]);
    }

    #[test]
    fn test_update_patterns_include_related_lists() {
        let patterns = invalidation_patterns(
            "ingredients",
            &Mutation::Update { id: "42".to_string() },
            &["references"],
        );
        assert_eq!(
            patterns,
            vec![
                "^ingredients:list",
                "^ingredients:detail:42$",
                "^references:list",
            ]
        );
    }

    #[test]
    fn test_delete_patterns_include_related_wildcard() {
        let patterns = invalidation_patterns(
            "ingredients",
            &Mutation::Delete { id: "42".to_string() },
            &["references"],
        );
        assert_eq!(
            patterns,
            vec![
                "^ingredients:list",
                "^ingredients:detail:42$",
                "^ingredients:count",
                "^references:(.*:)?42($|:)",
            ]
        );
    }

    #[test]
    fn test_delete_related_wildcard_matches_whole_id_segment() {
        let patterns = invalidation_patterns(
            "ingredients",
            &Mutation::Delete { id: "7".to_string() },
            &["references"],
        );
        let wildcard = regex::Regex::new(&patterns[3]).unwrap();

        assert!(wildcard.is_match("references:detail:7"));
        assert!(wildcard.is_match("references:7:ingredients"));
        // A longer id containing this one is a different entity
        assert!(!wildcard.is_match("references:detail:77"));
        assert!(!wildcard.is_match("references:list"));
    }

    #[test]
    fn test_regex_metacharacters_escaped() {
        let patterns = invalidation_patterns(
            "a.b",
            &Mutation::Update { id: "x+y".to_string() },
            &[],
        );
        assert_eq!(patterns[1], r"^a\.b:detail:x\+y$");
    }
}
