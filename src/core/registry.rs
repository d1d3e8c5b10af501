//! Configured-device registry
//!
//! The setup flow only ever asks one read-only question of the host: is this
//! `host:port` already configured? [`EntryStore`] is the file-backed host
//! implementation used by the CLI; entries are added after a flow completes.

use crate::core::flow::EntryDescriptor;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;
use uuid::Uuid;

/// Read-only duplicate check against already-configured devices
#[cfg_attr(test, mockall::automock)]
pub trait DeviceRegistry {
    /// Whether a device with this `"host:port"` key is configured
    fn is_configured(&self, key: &str) -> bool;
}

impl DeviceRegistry for HashSet<String> {
    fn is_configured(&self, key: &str) -> bool {
        self.contains(key)
    }
}

/// Entry store errors
#[derive(Error, Debug)]
pub enum StoreError {
    /// Platform has no data directory
    #[error("could not determine data directory")]
    NoDataDir,

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed store file
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Entry with the same key already stored
    #[error("{0} is already configured")]
    Duplicate(String),
}

/// A persisted device entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredEntry {
    /// Entry identifier
    pub id: String,
    /// When the entry was added
    pub added_at: DateTime<Utc>,
    /// The descriptor produced by the setup flow
    #[serde(flatten)]
    pub entry: EntryDescriptor,
}

/// File-backed store of configured devices
pub struct EntryStore {
    path: PathBuf,
    entries: Vec<StoredEntry>,
}

impl EntryStore {
    /// Open a store, loading existing entries from `path`
    pub fn open(path: PathBuf) -> Result<Self, StoreError> {
        let entries = load_entries(&path)?;
        Ok(Self { path, entries })
    }

    /// Open the store in the default data directory
    pub fn open_default() -> Result<Self, StoreError> {
        let path = crate::config::default_store_path().ok_or(StoreError::NoDataDir)?;
        Self::open(path)
    }

    /// Path of the backing file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// All entries, in insertion order
    pub fn entries(&self) -> &[StoredEntry] {
        &self.entries
    }

    /// Look up an entry by `"host:port"` key
    pub fn get(&self, key: &str) -> Option<&StoredEntry> {
        self.entries.iter().find(|e| e.entry.key() == key)
    }

    /// Count entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the store is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Add an entry and persist
    pub fn add(&mut self, entry: EntryDescriptor) -> Result<&StoredEntry, StoreError> {
        let key = entry.key();
        if self.is_configured(&key) {
            return Err(StoreError::Duplicate(key));
        }

        self.entries.push(StoredEntry {
            id: Uuid::new_v4().to_string(),
            added_at: Utc::now(),
            entry,
        });
        if let Err(e) = self.persist() {
            self.entries.pop();
            return Err(e);
        }

        let index = self.entries.len() - 1;
        Ok(&self.entries[index])
    }

    /// Remove an entry by key and persist
    pub fn remove(&mut self, key: &str) -> Result<Option<StoredEntry>, StoreError> {
        let Some(index) = self.entries.iter().position(|e| e.entry.key() == key) else {
            return Ok(None);
        };
        let removed = self.entries.remove(index);
        if let Err(e) = self.persist() {
            self.entries.insert(index, removed);
            return Err(e);
        }
        Ok(Some(removed))
    }

    /// Write the current entries to disk
    fn persist(&self) -> Result<(), StoreError> {
        let json = serde_json::to_string_pretty(&self.entries)?;
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, json)?;
        debug!("persisted {} entry(s) to {:?}", self.entries.len(), self.path);
        Ok(())
    }
}

impl DeviceRegistry for EntryStore {
    fn is_configured(&self, key: &str) -> bool {
        self.get(key).is_some()
    }
}

fn load_entries(path: &Path) -> Result<Vec<StoredEntry>, StoreError> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    let data = fs::read_to_string(path)?;
    let entries: Vec<StoredEntry> = serde_json::from_str(&data)?;
    debug!("loaded {} entry(s) from {:?}", entries.len(), path);
    Ok(entries)
}
