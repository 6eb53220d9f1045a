//! On-disk cache of raw upstream response bodies.
//!
//! Entries never expire: a hit replays the exact bytes of the fetch that
//! populated it. Only [`CacheMode::Refresh`] overwrites an entry.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CacheMode {
    /// Read a present entry, otherwise fetch and store. (Default)
    #[default]
    Use,
    /// Always fetch and overwrite the entry.
    Refresh,
    /// Always fetch; neither read nor write.
    Bypass,
}

impl CacheMode {
    pub const fn reads(self) -> bool {
        matches!(self, Self::Use)
    }

    pub const fn writes(self) -> bool {
        matches!(self, Self::Use | Self::Refresh)
    }
}

/// Directory of named cache files owned by one client.
#[derive(Debug, Clone)]
pub struct FactsCache {
    dir: PathBuf,
    mode: CacheMode,
}

impl FactsCache {
    pub fn new(dir: impl Into<PathBuf>, mode: CacheMode) -> Self {
        Self {
            dir: dir.into(),
            mode,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub const fn mode(&self) -> CacheMode {
        self.mode
    }

    pub fn path(&self, name: &str) -> PathBuf {
        self.dir.join(name)
    }

    /// Cached body for `name`, if the mode allows reading and it exists.
    pub async fn get(&self, name: &str) -> std::io::Result<Option<String>> {
        if !self.mode.reads() {
            return Ok(None);
        }
        match tokio::fs::read_to_string(self.path(name)).await {
            Ok(body) => {
                debug!(entry = name, "cache hit");
                Ok(Some(body))
            }
            Err(error) if error.kind() == ErrorKind::NotFound => Ok(None),
            Err(error) => Err(error),
        }
    }

    /// Reads `name` regardless of mode. Used for offline operation.
    pub async fn peek(&self, name: &str) -> std::io::Result<Option<String>> {
        match tokio::fs::read_to_string(self.path(name)).await {
            Ok(body) => Ok(Some(body)),
            Err(error) if error.kind() == ErrorKind::NotFound => Ok(None),
            Err(error) => Err(error),
        }
    }

    /// Stores `body` under `name` via a temp file and rename, so readers
    /// never observe a partial entry.
    pub async fn put(&self, name: &str, body: &str) -> std::io::Result<()> {
        if !self.mode.writes() {
            return Ok(());
        }
        tokio::fs::create_dir_all(&self.dir).await?;
        let target = self.path(name);
        let staging = self.path(&format!(".{name}.tmp"));
        tokio::fs::write(&staging, body).await?;
        tokio::fs::rename(&staging, &target).await?;
        debug!(entry = name, bytes = body.len(), "cache stored");
        Ok(())
    }
}
