//! # Pattern Resolver
//!
//! Resolves a URL path against an ordered list of regex-set rules. A rule
//! is satisfied only when every pattern in it matches the full candidate;
//! the first satisfied rule in stored order wins.

use crate::model::{TeamId, UrlRule};

/// Return the owner of the first rule whose every pattern matches
/// `candidate`, or `None` when no rule is satisfied.
pub fn owner_by_patterns<'a>(rules: &'a [UrlRule], candidate: &str) -> Option<&'a TeamId> {
    rules
        .iter()
        .find(|rule| rule.patterns.iter().all(|pattern| pattern.is_match(candidate)))
        .map(|rule| &rule.team)
}

/// Extract the path component of a URL: scheme and host stripped, query
/// string and fragment dropped. Bare paths pass through unchanged.
pub(crate) fn path_component(url: &str) -> &str {
    let path = match url.find("://") {
        Some(idx) => {
            let rest = &url[idx + 3..];
            match rest.find('/') {
                Some(slash) => &rest[slash..],
                None => "",
            }
        }
        None => url,
    };
    let end = path.find(['?', '#']).unwrap_or(path.len());
    &path[..end]
}

#[cfg(test)]
mod tests {
    use super::*;
    use regex::Regex;

    fn rule(patterns: &[&str], team: &str) -> UrlRule {
        UrlRule {
            patterns: patterns
                .iter()
                .map(|p| Regex::new(&format!(r"\A(?:{p})\z")).unwrap())
                .collect(),
            team: TeamId::new(team),
        }
    }

    #[test]
    fn test_first_satisfied_rule_wins() {
        // Both rules match; only order decides.
        let rules = vec![rule(&["/video/.*"], "first"), rule(&["/video/.*"], "second")];
        assert_eq!(
            owner_by_patterns(&rules, "/video/123"),
            Some(&TeamId::new("first"))
        );

        let reversed = vec![rule(&["/video/.*"], "second"), rule(&["/video/.*"], "first")];
        assert_eq!(
            owner_by_patterns(&reversed, "/video/123"),
            Some(&TeamId::new("second"))
        );
    }

    #[test]
    fn test_all_patterns_in_a_rule_must_match() {
        let rules = vec![rule(&["/api/.*", ".*internal.*"], "infrastructure")];
        assert_eq!(
            owner_by_patterns(&rules, "/api/internal/users"),
            Some(&TeamId::new("infrastructure"))
        );
        assert_eq!(owner_by_patterns(&rules, "/api/public/users"), None);
    }

    #[test]
    fn test_no_rule_satisfied_is_none() {
        let rules = vec![rule(&["/video/.*"], "content-platform")];
        assert_eq!(owner_by_patterns(&rules, "/exercise/1"), None);
    }

    #[test]
    fn test_path_component() {
        assert_eq!(path_component("https://example.org/a/b?x=1"), "/a/b");
        assert_eq!(path_component("https://example.org"), "");
        assert_eq!(path_component("/a/b#frag"), "/a/b");
        assert_eq!(path_component("/a/b"), "/a/b");
    }
}
