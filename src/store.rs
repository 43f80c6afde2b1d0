//! # Dataset Store
//!
//! Loads the ownership dataset and keeps it for the life of the process.
//!
//! Load order:
//! - memory, if a snapshot was already loaded (no staleness re-check)
//! - the local file, if it is fresher than the staleness window
//! - remote storage otherwise, copied over the local file first
//!
//! The remote copy goes through the [`RemoteStore`] seam so jobs and tests
//! can substitute their own transport.

use crate::model::OwnershipDataset;
use anyhow::{bail, Result};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::{Arc, Mutex};
use std::time::{Duration, SystemTime};

/// The ownership data could not be loaded: the local file is missing or
/// unreadable and a remote refresh did not produce one. Fatal to any
/// resolution call, since resolving without data is meaningless.
#[derive(Debug)]
pub struct DataUnavailable {
    pub path: PathBuf,
    pub reason: String,
}

impl DataUnavailable {
    fn new(path: &Path, reason: impl fmt::Display) -> Self {
        Self {
            path: path.to_path_buf(),
            reason: reason.to_string(),
        }
    }
}

impl fmt::Display for DataUnavailable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ownership data unavailable at {}: {}",
            self.path.display(),
            self.reason
        )
    }
}

impl std::error::Error for DataUnavailable {}

/// Transport seam for refreshing the local dataset file from remote
/// storage.
pub trait RemoteStore: Send + Sync {
    /// Copy the remote object at `uri` to `dest`, replacing any existing
    /// file.
    fn fetch(&self, uri: &str, dest: &Path) -> Result<()>;
}

/// [`RemoteStore`] that shells out to `gsutil cp`.
#[derive(Debug, Clone)]
pub struct GsutilFetch {
    binary: PathBuf,
}

impl GsutilFetch {
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
        }
    }
}

impl RemoteStore for GsutilFetch {
    fn fetch(&self, uri: &str, dest: &Path) -> Result<()> {
        tracing::info!(uri, dest = %dest.display(), "refreshing ownership data");
        let status = Command::new(&self.binary)
            .arg("cp")
            .arg(uri)
            .arg(dest)
            .status()?;
        if !status.success() {
            bail!("gsutil cp {uri} exited with {status}");
        }
        Ok(())
    }
}

/// Process-wide handle to the ownership dataset. Construct one at startup
/// and pass it to whatever resolves owners; every caller shares the single
/// loaded snapshot.
pub struct DatasetStore {
    path: PathBuf,
    remote_uri: String,
    staleness: Duration,
    remote: Box<dyn RemoteStore>,
    snapshot: Mutex<Option<Arc<OwnershipDataset>>>,
}

impl DatasetStore {
    pub fn new(
        path: impl Into<PathBuf>,
        remote_uri: impl Into<String>,
        staleness: Duration,
        remote: impl RemoteStore + 'static,
    ) -> Self {
        Self {
            path: path.into(),
            remote_uri: remote_uri.into(),
            staleness,
            remote: Box::new(remote),
            snapshot: Mutex::new(None),
        }
    }

    /// A store whose snapshot is already in memory. No file or remote
    /// access will ever happen; intended for tests and fixtures.
    pub fn preloaded(dataset: OwnershipDataset) -> Self {
        Self {
            path: PathBuf::new(),
            remote_uri: String::new(),
            staleness: Duration::ZERO,
            remote: Box::new(NoRemote),
            snapshot: Mutex::new(Some(Arc::new(dataset))),
        }
    }

    /// The loaded snapshot, loading it on first use. Concurrent first
    /// callers serialize on the cache lock, so at most one refresh is
    /// issued per process.
    pub fn snapshot(&self) -> Result<Arc<OwnershipDataset>, DataUnavailable> {
        let mut guard = self.snapshot.lock().expect("snapshot lock");
        if let Some(data) = guard.as_ref() {
            return Ok(Arc::clone(data));
        }

        self.refresh_local()?;
        let raw = fs::read_to_string(&self.path)
            .map_err(|err| DataUnavailable::new(&self.path, err))?;
        let data = OwnershipDataset::from_json(&raw)
            .map_err(|err| DataUnavailable::new(&self.path, err))?;

        let data = Arc::new(data);
        *guard = Some(Arc::clone(&data));
        tracing::debug!(path = %self.path.display(), "ownership snapshot loaded");
        Ok(data)
    }

    /// Copy the dataset down from remote storage if the local file is
    /// missing or older than the staleness window. A file that is still
    /// fresh is used as-is.
    fn refresh_local(&self) -> Result<(), DataUnavailable> {
        if !self.needs_refresh() {
            return Ok(());
        }
        self.remote
            .fetch(&self.remote_uri, &self.path)
            .map_err(|err| DataUnavailable::new(&self.path, err))
    }

    fn needs_refresh(&self) -> bool {
        match fs::metadata(&self.path).and_then(|meta| meta.modified()) {
            Ok(modified) => match SystemTime::now().duration_since(modified) {
                Ok(age) => age > self.staleness,
                // An mtime in the future counts as fresh.
                Err(_) => false,
            },
            Err(_) => true,
        }
    }
}

impl fmt::Debug for DatasetStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatasetStore")
            .field("path", &self.path)
            .field("remote_uri", &self.remote_uri)
            .field("staleness", &self.staleness)
            .finish_non_exhaustive()
    }
}

/// Remote seam for preloaded stores; never reached.
struct NoRemote;

impl RemoteStore for NoRemote {
    fn fetch(&self, uri: &str, _dest: &Path) -> Result<()> {
        bail!("no remote store configured (fetch of {uri})");
    }
}
