//! Shared fixtures for tests and benches: a small ownership dataset and
//! canned warehouse / alert collaborators.

use crate::alert::AlertSink;
use crate::model::OwnershipDataset;
use crate::warehouse::{Row, Warehouse};
use anyhow::Result;
use std::sync::Mutex;

/// The fixture dataset in its on-disk JSON form.
///
/// `main:/ghost` deliberately references a team with no record in `teams`,
/// which resolution must tolerate.
pub fn sample_raw_json() -> String {
    serde_json::json!({
        "files": [
            ["services/users", "classroom"],
            ["services/users/badges", "test-prep"],
            ["services/content", "content-platform"]
        ],
        "urls": [
            [["/video/.*"], "content-platform"],
            [["/api/.*", ".*internal.*"], "infrastructure"]
        ],
        "queues": [
            ["user-events", ["classroom", "infrastructure"]]
        ],
        "graphql-queries": [
            ["getFoo", ["classroom"]],
            ["getBar", ["test-prep"]]
        ],
        "server-routes": [
            ["main:/profile", null, "classroom"],
            ["api_main:/api/internal/graphql", null, "infrastructure"],
            ["main:/ghost", null, "ghost-team"]
        ],
        "teams": [
            {"id": "classroom", "readable_name": "Classroom",
             "slack_channel": "#classroom"},
            {"id": "infrastructure", "readable_name": "Infrastructure",
             "slack_channel": "#infrastructure"},
            {"id": "test-prep", "readable_name": "Test Prep",
             "slack_channel": "#test-prep"},
            {"id": "content-platform", "readable_name": "Content Platform",
             "slack_channel": "#content-platform"}
        ]
    })
    .to_string()
}

/// The fixture dataset, compiled.
pub fn sample_dataset() -> OwnershipDataset {
    OwnershipDataset::from_json(&sample_raw_json()).expect("fixture dataset")
}

/// [`Warehouse`] returning the same canned rows for every query.
pub struct StaticWarehouse {
    rows: Vec<Row>,
}

impl StaticWarehouse {
    /// Build from a JSON array of row objects.
    pub fn new(rows: serde_json::Value) -> Self {
        let rows = match rows {
            serde_json::Value::Array(rows) => rows
                .into_iter()
                .map(|row| match row {
                    serde_json::Value::Object(map) => map,
                    other => panic!("row fixture must be an object, got {other}"),
                })
                .collect(),
            other => panic!("rows fixture must be an array, got {other}"),
        };
        Self { rows }
    }
}

impl Warehouse for StaticWarehouse {
    fn query(&self, _sql: &str) -> Result<Vec<Row>> {
        Ok(self.rows.clone())
    }
}

/// [`AlertSink`] that records every send for assertions.
pub struct RecordingSink {
    pub sent: Mutex<Vec<(String, String)>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
        }
    }
}

impl Default for RecordingSink {
    fn default() -> Self {
        Self::new()
    }
}

impl AlertSink for RecordingSink {
    fn send(&self, channel: &str, message: &str) -> Result<()> {
        self.sent
            .lock()
            .expect("sent lock")
            .push((channel.to_string(), message.to_string()));
        Ok(())
    }
}
