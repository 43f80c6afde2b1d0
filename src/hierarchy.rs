//! # Hierarchical Resolver
//!
//! Resolves a separator-delimited identifier to an owner by walking its
//! prefixes from most-specific to least-specific.

use std::collections::HashMap;

/// Look up `name` in `owners`, truncating at the last `sep` and retrying
/// until a mapping is found or no separator remains. Specificity comes
/// purely from trying longer keys first; an absent mapping is a normal
/// outcome, not an error.
pub fn owner_by_prefix<'a, V>(
    owners: &'a HashMap<String, V>,
    name: &str,
    sep: char,
) -> Option<&'a V> {
    let mut name = name;
    while !name.is_empty() {
        if let Some(owner) = owners.get(name) {
            return Some(owner);
        }
        match name.rfind(sep) {
            Some(idx) => name = &name[..idx],
            None => break,
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::TeamId;

    fn owners(entries: &[(&str, &str)]) -> HashMap<String, TeamId> {
        entries
            .iter()
            .map(|(prefix, team)| (prefix.to_string(), TeamId::new(*team)))
            .collect()
    }

    #[test]
    fn test_exact_match_wins() {
        let map = owners(&[("a/b/c", "one"), ("a/b", "two"), ("a", "three")]);
        assert_eq!(owner_by_prefix(&map, "a/b/c", '/'), Some(&TeamId::new("one")));
    }

    #[test]
    fn test_falls_back_to_longest_present_prefix() {
        // Only a middle segment is mapped; neither the full path nor the
        // root should win over it.
        let map = owners(&[("a/b", "middle")]);
        assert_eq!(
            owner_by_prefix(&map, "a/b/c/d", '/'),
            Some(&TeamId::new("middle"))
        );
    }

    #[test]
    fn test_no_match_is_none() {
        let map = owners(&[("x", "one")]);
        assert_eq!(owner_by_prefix(&map, "a/b/c", '/'), None);
        assert_eq!(owner_by_prefix(&map, "", '/'), None);
    }

    #[test]
    fn test_dotted_identifiers() {
        let map = owners(&[("jobs.reports", "reporting")]);
        assert_eq!(
            owner_by_prefix(&map, "jobs.reports.weekly", '.'),
            Some(&TeamId::new("reporting"))
        );
        assert_eq!(owner_by_prefix(&map, "jobs", '.'), None);
    }
}
