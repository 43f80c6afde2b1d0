//! # Opsdash
//!
//! Scheduled traffic-report jobs and the ownership resolution engine
//! behind them.
//!
//! The engine maps raw identifiers — file paths, URLs, annotated server
//! routes — to the engineering teams responsible for them, using a layered
//! lookup over a published ownership dataset: prefix hierarchy for paths,
//! ordered regex-set rules for URLs, and queue/query annotations with
//! route-table and `"unknown"` fallbacks for routes. The jobs query the
//! warehouse for anomalous traffic and route what they find to the owning
//! teams via chat alerts.

pub mod alert;
pub mod config;
pub mod dos;
pub mod failing_routes;
pub mod hierarchy;
pub mod model;
pub mod patterns;
pub mod registry;
pub mod routes;
pub mod store;
pub mod test_support;
pub mod warehouse;

// Re-export main types for convenience
pub use alert::{AlertSink, SlackWebhook, StdoutSink};
pub use config::{AlertConfig, OpsConfig, OwnershipConfig, WarehouseConfig};
pub use model::{OwnershipDataset, Team, TeamId, UrlRule};
pub use store::{DataUnavailable, DatasetStore, GsutilFetch, RemoteStore};
pub use warehouse::{BqCli, Warehouse};

use anyhow::Result;
use std::collections::BTreeSet;

/// Main API for ownership resolution.
///
/// Owns the dataset handle; the snapshot loads lazily on first use and is
/// shared by every lookup for the rest of the process. Construct once and
/// pass by reference to whatever needs owners resolved.
pub struct Ownership {
    store: DatasetStore,
}

impl Ownership {
    /// Resolver backed by the configured local file and remote store.
    pub fn new(config: &OwnershipConfig) -> Self {
        Self::with_store(DatasetStore::new(
            &config.data_path,
            &config.remote_uri,
            config.staleness(),
            GsutilFetch::new(&config.gsutil_bin),
        ))
    }

    /// Resolver over an explicit dataset store.
    pub fn with_store(store: DatasetStore) -> Self {
        Self { store }
    }

    /// Resolver over an in-memory dataset; nothing is read or fetched.
    pub fn from_dataset(dataset: OwnershipDataset) -> Self {
        Self::with_store(DatasetStore::preloaded(dataset))
    }

    /// Owning team for a repository file path, by longest mapped prefix.
    pub fn file_owner(&self, path: &str) -> Result<Option<TeamId>> {
        let data = self.store.snapshot()?;
        let path = path.strip_prefix('/').unwrap_or(path);
        Ok(hierarchy::owner_by_prefix(&data.files, path, '/').cloned())
    }

    /// Owning team for a URL, matched on its path component.
    pub fn url_owner(&self, url: &str) -> Result<Option<TeamId>> {
        let data = self.store.snapshot()?;
        Ok(patterns::owner_by_patterns(&data.urls, patterns::path_component(url)).cloned())
    }

    /// All owning teams for an annotated route string. Always non-empty;
    /// unresolvable routes map to `"unknown"`.
    pub fn route_owners(&self, route: &str) -> Result<BTreeSet<TeamId>> {
        let data = self.store.snapshot()?;
        Ok(routes::route_owners(&data, route))
    }

    /// Human-readable team name.
    pub fn title(&self, id: &TeamId) -> Result<String> {
        let data = self.store.snapshot()?;
        Ok(registry::title(&data, id)?.to_string())
    }

    /// Chat channel the team watches.
    pub fn slack_channel(&self, id: &TeamId) -> Result<String> {
        let data = self.store.snapshot()?;
        Ok(registry::slack_channel(&data, id)?.to_string())
    }

    /// Reporting e-mail address, from the built-in table.
    pub fn email(&self, id: &TeamId) -> Result<&'static str> {
        Ok(registry::email(id)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::sample_dataset;

    fn ownership() -> Ownership {
        Ownership::from_dataset(sample_dataset())
    }

    #[test]
    fn test_file_owner_most_specific_prefix() {
        let ownership = ownership();
        assert_eq!(
            ownership.file_owner("services/users/badges/streaks.rs").unwrap(),
            Some(TeamId::new("test-prep"))
        );
        assert_eq!(
            ownership.file_owner("/services/users/profile.rs").unwrap(),
            Some(TeamId::new("classroom"))
        );
        assert_eq!(ownership.file_owner("third_party/vendored.rs").unwrap(), None);
    }

    #[test]
    fn test_url_owner_matches_path_component() {
        let ownership = ownership();
        assert_eq!(
            ownership.url_owner("https://example.org/video/123?t=9").unwrap(),
            Some(TeamId::new("content-platform"))
        );
        assert_eq!(
            ownership.url_owner("/api/internal/users").unwrap(),
            Some(TeamId::new("infrastructure"))
        );
        assert_eq!(ownership.url_owner("/about").unwrap(), None);
    }

    #[test]
    fn test_route_owners_through_facade() {
        let ownership = ownership();
        let owners = ownership
            .route_owners("api_main:/api/internal/graphql [getFoo+getBar]")
            .unwrap();
        let names: Vec<&str> = owners.iter().map(TeamId::as_str).collect();
        assert_eq!(names, vec!["classroom", "test-prep"]);
    }

    #[test]
    fn test_registry_through_facade() {
        let ownership = ownership();
        assert_eq!(ownership.title(&TeamId::new("classroom")).unwrap(), "Classroom");
        assert_eq!(
            ownership.slack_channel(&TeamId::new("test-prep")).unwrap(),
            "#test-prep"
        );
        assert!(ownership.email(&TeamId::new("infrastructure")).is_ok());
    }

    #[test]
    fn test_unreferenced_team_resolves_but_has_no_title() {
        let ownership = ownership();
        let owners = ownership.route_owners("main:/ghost").unwrap();
        let names: Vec<&str> = owners.iter().map(TeamId::as_str).collect();
        assert_eq!(names, vec!["ghost-team"]);
        assert!(ownership.title(&TeamId::new("ghost-team")).is_err());
    }
}
