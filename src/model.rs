//! # Data Model
//!
//! Core data structures for ownership resolution: team identifiers, the
//! loaded ownership dataset, and the raw on-disk JSON shape it is compiled
//! from.

use anyhow::{Context, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Stable identifier for an engineering team, the join key across all
/// ownership tables.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TeamId(pub String);

impl TeamId {
    /// Sentinel id returned when no owner can be determined.
    pub const UNKNOWN: &'static str = "unknown";

    /// Create a new team id
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The `"unknown"` sentinel team id.
    pub fn unknown() -> Self {
        Self(Self::UNKNOWN.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TeamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TeamId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// A team record as published in the ownership dataset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Team {
    /// Stable team id
    pub id: TeamId,
    /// Human-readable team name for reports
    pub readable_name: String,
    /// Chat channel the team watches, e.g. `#infrastructure`
    pub slack_channel: String,
}

/// One ordered URL ownership rule: every pattern must match the candidate
/// path for the rule to apply.
#[derive(Debug, Clone)]
pub struct UrlRule {
    /// Compiled full-match patterns, AND semantics within the rule
    pub patterns: Vec<Regex>,
    /// The owning team when the rule is satisfied
    pub team: TeamId,
}

/// The immutable snapshot of ownership configuration a process resolves
/// against. Constructed by compiling [`RawDataset`]; replaced wholesale on
/// refresh, never mutated in place.
#[derive(Debug, Clone, Default)]
pub struct OwnershipDataset {
    /// `/`-separated file-path prefix to owning team
    pub files: HashMap<String, TeamId>,
    /// Ordered URL rules; order is load-bearing, first satisfied rule wins
    pub urls: Vec<UrlRule>,
    /// Exact route string (no annotations) to owning team
    pub routes: HashMap<String, TeamId>,
    /// Queue name to owning teams (queues may be shared)
    pub queues: HashMap<String, Vec<TeamId>>,
    /// GraphQL query name to owning teams
    pub graphql_queries: HashMap<String, Vec<TeamId>>,
    /// Team id to team record
    pub teams: HashMap<TeamId, Team>,
}

/// The dataset file as published: pair/triple arrays rather than maps, with
/// URL patterns still in source form.
#[derive(Debug, Clone, Deserialize)]
pub struct RawDataset {
    pub files: Vec<(String, TeamId)>,
    pub urls: Vec<(Vec<String>, TeamId)>,
    pub queues: Vec<(String, Vec<TeamId>)>,
    #[serde(rename = "graphql-queries")]
    pub graphql_queries: Vec<(String, Vec<TeamId>)>,
    /// Route triples; the middle field is unused by this system.
    #[serde(rename = "server-routes")]
    pub server_routes: Vec<(String, serde_json::Value, TeamId)>,
    pub teams: Vec<Team>,
}

impl OwnershipDataset {
    /// Parse and compile a dataset from its JSON source.
    pub fn from_json(raw: &str) -> Result<Self> {
        let raw: RawDataset =
            serde_json::from_str(raw).context("malformed ownership dataset JSON")?;
        Self::compile(raw)
    }

    /// Compile the raw shape into lookup maps, compiling all URL patterns
    /// eagerly so a bad pattern fails the load rather than a later lookup.
    pub fn compile(raw: RawDataset) -> Result<Self> {
        let urls = raw
            .urls
            .into_iter()
            .map(|(patterns, team)| {
                let patterns = patterns
                    .iter()
                    .map(|pattern| compile_full_match(pattern))
                    .collect::<Result<Vec<_>>>()?;
                Ok(UrlRule { patterns, team })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            files: raw.files.into_iter().collect(),
            urls,
            routes: raw
                .server_routes
                .into_iter()
                .map(|(route, _, team)| (route, team))
                .collect(),
            queues: raw.queues.into_iter().collect(),
            graphql_queries: raw.graphql_queries.into_iter().collect(),
            teams: raw
                .teams
                .into_iter()
                .map(|team| (team.id.clone(), team))
                .collect(),
        })
    }
}

/// Compile a pattern so the entire candidate string must match.
fn compile_full_match(pattern: &str) -> Result<Regex> {
    Regex::new(&format!(r"\A(?:{pattern})\z"))
        .with_context(|| format!("bad URL ownership pattern {pattern:?}"))
}
