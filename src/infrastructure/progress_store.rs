//! JSON progress checkpoint: the set of processed dedup keys plus a
//! monotonic record counter, rewritten atomically at every checkpoint.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::domain::errors::HarvestResult;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProgressCheckpoint {
    #[serde(default)]
    pub processed_keys: HashSet<String>,
    #[serde(default)]
    pub record_count: u64,
    #[serde(default)]
    pub last_updated: Option<DateTime<Utc>>,
}

impl ProgressCheckpoint {
    /// Record a key as processed; returns true when it was new.
    pub fn mark(&mut self, key: impl Into<String>) -> bool {
        self.processed_keys.insert(key.into())
    }

    pub fn is_processed(&self, key: &str) -> bool {
        self.processed_keys.contains(key)
    }
}

pub struct ProgressStore {
    path: PathBuf,
}

impl ProgressStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the checkpoint. A missing file starts a fresh run; an unreadable
    /// one is backed up and replaced rather than aborting the crawl.
    pub fn load(&self) -> HarvestResult<ProgressCheckpoint> {
        if !self.path.exists() {
            debug!("No progress file at {:?}, starting fresh", self.path);
            return Ok(ProgressCheckpoint::default());
        }
        let raw = fs::read_to_string(&self.path)?;
        match serde_json::from_str::<ProgressCheckpoint>(&raw) {
            Ok(checkpoint) => {
                debug!(
                    "Resuming with {} processed keys, {} records",
                    checkpoint.processed_keys.len(),
                    checkpoint.record_count
                );
                Ok(checkpoint)
            }
            Err(e) => {
                let backup = self.path.with_extension("json.corrupted");
                warn!(
                    "Progress file {:?} is corrupt ({e}); backing up to {:?} and starting fresh",
                    self.path, backup
                );
                fs::rename(&self.path, &backup)?;
                Ok(ProgressCheckpoint::default())
            }
        }
    }

    /// Persist the checkpoint atomically, stamping `last_updated`.
    pub fn save(&self, checkpoint: &mut ProgressCheckpoint) -> HarvestResult<()> {
        checkpoint.last_updated = Some(Utc::now());
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let temp = self.path.with_extension("json.tmp");
        fs::write(&temp, serde_json::to_string_pretty(checkpoint)?)?;
        fs::rename(&temp, &self.path)?;
        Ok(())
    }
}
