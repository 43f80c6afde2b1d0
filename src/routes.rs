//! # Route Composite Resolver
//!
//! Resolves an annotated route string to the set of owning teams. Routes
//! carry bracketed annotations after the base route, each either an HTTP
//! method token or a `+`-joined list of queue / GraphQL query names, e.g.
//! `"api_main:/api/internal/graphql [getFoo+getBar]"`. Queue and query
//! names are the most precise ownership signal, the exact route table is
//! the coarser default, and `"unknown"` is the safety net so every route
//! resolves to something.

use crate::model::{OwnershipDataset, TeamId};
use regex::Regex;
use std::collections::BTreeSet;
use std::sync::OnceLock;

/// Annotation block grammar: one or more `+`-joined names, then `]`.
/// Anchored only at the start — trailing bytes after the `]` are
/// tolerated, matching what real traffic produces.
fn annotation_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\A([\w-]+(?:\+[\w-]+)*)\]").expect("annotation grammar"))
}

/// Parse one annotation block (the text after a `" ["` split, still
/// carrying its `]`). Returns the embedded names, or `None` when the block
/// does not follow the grammar at all.
fn annotation_names(block: &str) -> Option<Vec<&str>> {
    annotation_re()
        .captures(block)
        .map(|caps| caps.get(1).map_or(Vec::new(), |m| m.as_str().split('+').collect()))
}

/// All owning team ids for `route`. Never fails: unresolvable routes map
/// to the `"unknown"` sentinel.
pub fn route_owners(data: &OwnershipDataset, route: &str) -> BTreeSet<TeamId> {
    let mut parts = route.trim().split(" [");
    let base = parts.next().unwrap_or("");

    let mut owners = BTreeSet::new();
    for block in parts {
        let Some(names) = annotation_names(block) else {
            // Doesn't follow the grammar; most likely a spam route. Stop
            // looking at annotations and fall through with whatever was
            // accumulated so far.
            break;
        };
        for name in names {
            if let Some(teams) = data.queues.get(name) {
                owners.extend(teams.iter().cloned());
            }
            if let Some(teams) = data.graphql_queries.get(name) {
                owners.extend(teams.iter().cloned());
            }
            // Anything else is probably an HTTP method token; ignore it.
        }
    }
    if !owners.is_empty() {
        return owners;
    }

    // No queue or query matched, so try the route itself.
    if let Some(team) = data.routes.get(base) {
        return BTreeSet::from([team.clone()]);
    }

    BTreeSet::from([TeamId::unknown()])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::RawDataset;

    fn dataset() -> OwnershipDataset {
        let raw: RawDataset = serde_json::from_value(serde_json::json!({
            "files": [],
            "urls": [],
            "queues": [["user-events", ["classroom", "infrastructure"]]],
            "graphql-queries": [
                ["getFoo", ["classroom"]],
                ["getBar", ["test-prep"]]
            ],
            "server-routes": [["main:/profile", null, "classroom"]],
            "teams": []
        }))
        .unwrap();
        OwnershipDataset::compile(raw).unwrap()
    }

    fn ids(names: &[&str]) -> BTreeSet<TeamId> {
        names.iter().map(|name| TeamId::new(*name)).collect()
    }

    #[test]
    fn test_unknown_route_gets_sentinel() {
        let data = OwnershipDataset::default();
        assert_eq!(route_owners(&data, "unknown_route"), ids(&["unknown"]));
    }

    #[test]
    fn test_exact_route_table_hit() {
        assert_eq!(route_owners(&dataset(), "main:/profile"), ids(&["classroom"]));
    }

    #[test]
    fn test_graphql_queries_union_owners() {
        assert_eq!(
            route_owners(&dataset(), "api_main:/api/internal/graphql [getFoo+getBar]"),
            ids(&["classroom", "test-prep"])
        );
    }

    #[test]
    fn test_queue_annotation_resolves_shared_owners() {
        assert_eq!(
            route_owners(&dataset(), "worker:/tasks [user-events]"),
            ids(&["classroom", "infrastructure"])
        );
    }

    #[test]
    fn test_method_token_is_ignored() {
        // GET is neither queue nor query and main:/crash isn't in the
        // route table.
        assert_eq!(route_owners(&dataset(), "main:/crash [GET]"), ids(&["unknown"]));
    }

    #[test]
    fn test_annotations_beat_route_table() {
        assert_eq!(
            route_owners(&dataset(), "main:/profile [getBar]"),
            ids(&["test-prep"])
        );
    }

    #[test]
    fn test_trailing_garbage_after_bracket_is_tolerated() {
        assert_eq!(
            route_owners(&dataset(), "api_main:/graphql [getFoo]trailing"),
            ids(&["classroom"])
        );
    }

    #[test]
    fn test_malformed_annotation_stops_processing() {
        // The second block has no closing bracket, so it aborts annotation
        // processing; owners from the first block survive.
        assert_eq!(
            route_owners(&dataset(), "api_main:/graphql [getFoo] [%%%"),
            ids(&["classroom"])
        );
        // With no owners accumulated, a malformed block falls through to
        // the route table.
        assert_eq!(
            route_owners(&dataset(), "main:/profile [%%%"),
            ids(&["classroom"])
        );
    }

    #[test]
    fn test_owners_are_deduplicated() {
        let raw: RawDataset = serde_json::from_value(serde_json::json!({
            "files": [],
            "urls": [],
            "queues": [["shared", ["infrastructure"]]],
            "graphql-queries": [["shared", ["infrastructure"]]],
            "server-routes": [],
            "teams": []
        }))
        .unwrap();
        let data = OwnershipDataset::compile(raw).unwrap();
        // The name is both a queue and a query owned by the same team.
        assert_eq!(
            route_owners(&data, "worker:/x [shared]"),
            ids(&["infrastructure"])
        );
    }

    #[test]
    fn test_surrounding_whitespace_is_trimmed() {
        assert_eq!(route_owners(&dataset(), "  main:/profile  "), ids(&["classroom"]));
    }
}
