//! # Warehouse Access
//!
//! Thin seam over the data warehouse: submit a query, get rows back. The
//! production implementation shells out to the `bq` CLI and parses its
//! JSON output; jobs and tests depend only on the [`Warehouse`] trait.

use anyhow::{bail, Context, Result};
use std::path::PathBuf;
use std::process::Command;

/// One result row as a JSON object keyed by column name.
pub type Row = serde_json::Map<String, serde_json::Value>;

/// Query seam for the data warehouse.
pub trait Warehouse {
    /// Run `sql` and return all result rows. Transport failures surface as
    /// errors; an empty result set is `Ok(vec![])`.
    fn query(&self, sql: &str) -> Result<Vec<Row>>;
}

/// [`Warehouse`] that shells out to the `bq` CLI.
#[derive(Debug, Clone)]
pub struct BqCli {
    binary: PathBuf,
    project: String,
}

impl BqCli {
    pub fn new(binary: impl Into<PathBuf>, project: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
            project: project.into(),
        }
    }
}

impl Warehouse for BqCli {
    fn query(&self, sql: &str) -> Result<Vec<Row>> {
        tracing::debug!(project = %self.project, "running warehouse query");
        let output = Command::new(&self.binary)
            .arg("--project_id")
            .arg(&self.project)
            .arg("--headless")
            .arg("-q")
            .arg("--format=json")
            .arg("query")
            .arg("--max_rows=100000")
            .arg(sql)
            .output()
            .with_context(|| format!("failed to run {}", self.binary.display()))?;

        if !output.status.success() {
            bail!(
                "bq query exited with {}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }

        parse_rows(&output.stdout)
    }
}

/// Parse the `bq --format=json` output. A query with no results prints
/// nothing at all, which is an empty row set rather than an error.
fn parse_rows(stdout: &[u8]) -> Result<Vec<Row>> {
    let text = std::str::from_utf8(stdout).context("bq output was not UTF-8")?;
    if text.trim().is_empty() {
        return Ok(Vec::new());
    }
    serde_json::from_str(text.trim()).context("bq output was not a JSON row array")
}

/// Pull an unsigned integer column out of a row. The CLI renders integers
/// as JSON strings, so both forms are accepted.
pub fn u64_field(row: &Row, name: &str) -> Result<u64> {
    let value = row
        .get(name)
        .with_context(|| format!("row is missing column {name:?}"))?;
    match value {
        serde_json::Value::Number(n) => n
            .as_u64()
            .with_context(|| format!("column {name:?} is not an unsigned integer: {n}")),
        serde_json::Value::String(s) => s
            .parse()
            .with_context(|| format!("column {name:?} is not an unsigned integer: {s:?}")),
        other => bail!("column {name:?} has unexpected type: {other}"),
    }
}

/// Pull a string column out of a row.
pub fn str_field<'a>(row: &'a Row, name: &str) -> Result<&'a str> {
    row.get(name)
        .and_then(|value| value.as_str())
        .with_context(|| format!("row is missing string column {name:?}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_rows_empty_output() {
        assert_eq!(parse_rows(b"").unwrap().len(), 0);
        assert_eq!(parse_rows(b"  \n").unwrap().len(), 0);
    }

    #[test]
    fn test_parse_rows_json_array() {
        let rows = parse_rows(br#"[{"route": "main:/x", "total_reqs": "12"}]"#).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(str_field(&rows[0], "route").unwrap(), "main:/x");
        assert_eq!(u64_field(&rows[0], "total_reqs").unwrap(), 12);
    }

    #[test]
    fn test_u64_field_accepts_numbers_and_strings() {
        let rows = parse_rows(br#"[{"a": 3, "b": "4"}]"#).unwrap();
        assert_eq!(u64_field(&rows[0], "a").unwrap(), 3);
        assert_eq!(u64_field(&rows[0], "b").unwrap(), 4);
        assert!(u64_field(&rows[0], "missing").is_err());
    }
}
