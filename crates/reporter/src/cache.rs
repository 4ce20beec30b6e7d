//! On-disk cache for unsent events.
//!
//! The cache file is a JSON array of [`AnalyticsEvent`]. Writes go to a
//! sibling temp file which is then renamed over the cache, so a crash never
//! leaves a half-written cache behind.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::error::Result;
use crate::event::AnalyticsEvent;
use crate::identity::default_data_dir;

/// Default path for the event cache file.
pub fn default_cache_path() -> PathBuf {
    default_data_dir().join("cached_events.json")
}

/// Cache of unsent events at a fixed path.
#[derive(Debug, Clone)]
pub struct EventCache {
    path: PathBuf,
}

impl EventCache {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Replace the cache contents with `events`.
    ///
    /// Writing an empty slice removes the cache file.
    pub fn save(&self, events: &[AnalyticsEvent]) -> Result<()> {
        if events.is_empty() {
            return self.remove();
        }

        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let json = serde_json::to_vec(events)?;
        let tmp = self.tmp_path();
        std::fs::write(&tmp, json)?;
        std::fs::rename(&tmp, &self.path)?;

        debug!(path = %self.path.display(), events = events.len(), "event cache saved");
        Ok(())
    }

    /// Read cached events. A missing file is an empty cache.
    ///
    /// A file that cannot be parsed is discarded with a warning.
    pub fn load(&self) -> Result<Vec<AnalyticsEvent>> {
        let bytes = match std::fs::read(&self.path) {
            Ok(b) => b,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        match serde_json::from_slice(&bytes) {
            Ok(events) => Ok(events),
            Err(e) => {
                warn!(
                    path = %self.path.display(),
                    error = %e,
                    "discarding corrupt event cache"
                );
                self.remove()?;
                Ok(Vec::new())
            }
        }
    }

    /// Delete the cache file if present.
    pub fn remove(&self) -> Result<()> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    fn tmp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}
