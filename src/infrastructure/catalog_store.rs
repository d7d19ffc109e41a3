//! CSV-backed catalog persistence.
//!
//! The listing pass only ever appends; enrichment and grouping replace the
//! whole file through a temp-file rename so readers never observe a
//! half-written catalog.

use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::domain::errors::HarvestResult;
use crate::domain::product::ProductRecord;

pub struct CatalogStore {
    path: PathBuf,
}

impl CatalogStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Load every record. A missing file is an empty catalog, not an error.
    pub fn read_all(&self) -> HarvestResult<Vec<ProductRecord>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let mut reader = csv::Reader::from_path(&self.path)?;
        let mut records = Vec::new();
        for row in reader.deserialize() {
            records.push(row?);
        }
        debug!("Loaded {} catalog records from {:?}", records.len(), self.path);
        Ok(records)
    }

    /// Append records, writing the header row only when the file is new.
    pub fn append(&self, records: &[ProductRecord]) -> HarvestResult<()> {
        if records.is_empty() {
            return Ok(());
        }
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let write_header =
            !self.path.exists() || fs::metadata(&self.path).map(|m| m.len() == 0).unwrap_or(true);
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        let mut writer = csv::WriterBuilder::new()
            .has_headers(write_header)
            .from_writer(file);
        for record in records {
            writer.serialize(record)?;
        }
        writer.flush()?;
        Ok(())
    }

    /// Replace the whole catalog atomically (temp file + rename).
    pub fn rewrite(&self, records: &[ProductRecord]) -> HarvestResult<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let temp = self.path.with_extension("csv.tmp");
        {
            let mut writer = csv::Writer::from_path(&temp)?;
            for record in records {
                writer.serialize(record)?;
            }
            writer.flush()?;
        }
        fs::rename(&temp, &self.path)?;
        debug!("Rewrote catalog at {:?} ({} records)", self.path, records.len());
        Ok(())
    }
}
