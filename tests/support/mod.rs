use anyhow::{bail, Result};
use opsdash::RemoteStore;
use std::fs;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Remote store that writes the fixture dataset and counts every fetch.
pub struct CountingRemote {
    pub calls: Arc<AtomicUsize>,
}

impl CountingRemote {
    pub fn new() -> (Self, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        (
            Self {
                calls: Arc::clone(&calls),
            },
            calls,
        )
    }
}

impl RemoteStore for CountingRemote {
    fn fetch(&self, _uri: &str, dest: &Path) -> Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        fs::write(dest, opsdash::test_support::sample_raw_json())?;
        Ok(())
    }
}

/// Remote store whose copies always fail.
pub struct FailingRemote;

impl RemoteStore for FailingRemote {
    fn fetch(&self, uri: &str, _dest: &Path) -> Result<()> {
        bail!("copy of {uri} failed");
    }
}
