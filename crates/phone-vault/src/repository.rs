//! Flat-file client repository.

use crate::error::StoreError;
use crate::record::Record;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info};

/// Storage-key indexed records backed by a single JSON document.
///
/// The whole document is held in memory. The file is only written by
/// [`Repository::save`]; [`Repository::add`] never touches disk.
#[derive(Debug)]
pub struct Repository {
    path: PathBuf,
    items: HashMap<String, Record>,
}

impl Repository {
    /// Load the repository from an existing document.
    ///
    /// A missing or unparsable document is a [`StoreError::Load`].
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();

        let data = fs::read(&path)
            .await
            .map_err(|e| StoreError::load(&path, e))?;
        let items: HashMap<String, Record> =
            serde_json::from_slice(&data).map_err(|e| StoreError::load(&path, e))?;

        info!("Loaded client repository with {} records from {:?}", items.len(), path);

        Ok(Self { path, items })
    }

    /// Path of the backing document.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The live record mapping, not a copy.
    pub fn get_all(&self) -> &HashMap<String, Record> {
        &self.items
    }

    /// Get a record by storage key.
    pub fn get_by_email(&self, key: &str) -> Result<&Record, StoreError> {
        self.items.get(key).ok_or(StoreError::NotFound)
    }

    /// Insert or overwrite a record in memory.
    pub fn add(&mut self, key: impl Into<String>, record: Record) -> &mut Self {
        self.items.insert(key.into(), record);
        self
    }

    /// Number of records.
    pub fn count(&self) -> usize {
        self.items.len()
    }

    /// Put back the entry a key held before a failed commit.
    pub(crate) fn restore(&mut self, key: &str, previous: Option<Record>) {
        match previous {
            Some(record) => {
                self.items.insert(key.to_string(), record);
            }
            None => {
                self.items.remove(key);
            }
        }
    }

    /// Write the whole mapping to the backing document.
    ///
    /// Writes a sibling temp file and renames it over the document.
    pub async fn save(&self) -> Result<(), StoreError> {
        let data =
            serde_json::to_vec_pretty(&self.items).map_err(|e| StoreError::save(&self.path, e))?;

        let temp_path = self.path.with_extension("tmp");
        fs::write(&temp_path, &data)
            .await
            .map_err(|e| StoreError::save(&self.path, e))?;
        fs::rename(&temp_path, &self.path)
            .await
            .map_err(|e| StoreError::save(&self.path, e))?;

        debug!(
            "Saved client repository ({} records, {} bytes) to {:?}",
            self.items.len(),
            data.len(),
            self.path
        );
        Ok(())
    }
}
