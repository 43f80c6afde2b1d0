//! Default values for the opsdash configuration.

/// Local cache of the ownership dataset, relative to the working directory.
pub const DEFAULT_DATA_PATH: &str = "ownership_data.json";

/// Remote object the dataset is refreshed from.
pub const DEFAULT_REMOTE_URI: &str = "gs://webapp-artifacts/ownership_data.json";

/// How old the local dataset file may get before a refresh (24 hours).
pub const DEFAULT_STALENESS_SECS: u64 = 60 * 60 * 24;

/// gsutil binary used for the remote copy.
pub const DEFAULT_GSUTIL_BIN: &str = "gsutil";

/// bq CLI binary used for warehouse queries.
pub const DEFAULT_BQ_BIN: &str = "bq";

/// Warehouse project holding the request-log tables.
pub const DEFAULT_WAREHOUSE_PROJECT: &str = "khanacademy.org:deductive-jet-827";

/// Channel traffic alerts go to.
pub const DEFAULT_ALERT_CHANNEL: &str = "#infrastructure-sre";
