// Net Connection - Preference Storage
// Copyright (C) 2026 Christos A. Daggas
// SPDX-License-Identifier: MIT

//! Counter storage backing the cellular statistics.
//!
//! Handles:
//! - The [`PreferenceStore`] seam the registry reads counters through
//! - A JSON file store with per-key update timestamps
//! - An in-memory store for embedding and tests
//!
//! This module uses RwLock for thread-safe access. Lock poisoning is handled
//! gracefully by recovering the inner value, as poison indicates a panic
//! in another thread but the data itself may still be valid.

use std::collections::{BTreeMap, HashMap};
use std::fs::{self, File};
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use crate::models::{Error, Result};

/// Key/value store of unsigned counters.
pub trait PreferenceStore: Send + Sync {
    /// Read a counter; `None` if it was never written.
    fn get(&self, key: &str) -> Result<Option<u64>>;

    /// Write a counter.
    fn set(&self, key: &str, value: u64) -> Result<()>;
}

/// One stored counter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CounterEntry {
    pub value: u64,
    pub updated_at: DateTime<Utc>,
}

/// Read from RwLock, recovering from poison if needed.
fn read_lock<T, F, R>(lock: &RwLock<T>, context: &str, reader: F) -> R
where
    F: FnOnce(&T) -> R,
{
    match lock.read() {
        Ok(guard) => reader(&*guard),
        Err(poisoned) => {
            warn!("RwLock poisoned reading {}, recovering", context);
            reader(&*poisoned.into_inner())
        }
    }
}

/// Write to RwLock, recovering from poison if needed.
fn write_lock<T, F, R>(lock: &RwLock<T>, context: &str, writer: F) -> R
where
    F: FnOnce(&mut T) -> R,
{
    match lock.write() {
        Ok(mut guard) => writer(&mut *guard),
        Err(poisoned) => {
            warn!("RwLock poisoned writing {}, recovering", context);
            writer(&mut *poisoned.into_inner())
        }
    }
}

/// Counters persisted as a JSON object on disk.
#[derive(Debug)]
pub struct JsonPreferenceStore {
    path: PathBuf,
    counters: RwLock<BTreeMap<String, CounterEntry>>,
}

impl JsonPreferenceStore {
    /// Open the store at `path`, loading existing counters if the file exists.
    ///
    /// An unreadable file is logged and treated as empty; it is replaced on
    /// the next write.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();

        if let Some(dir) = path.parent() {
            if let Err(e) = fs::create_dir_all(dir) {
                error!("Failed to create preference directory {:?}: {}", dir, e);
            }
            // Set restrictive permissions on the directory (0700)
            #[cfg(unix)]
            {
                use std::os::unix::fs::PermissionsExt;
                let _ = fs::set_permissions(dir, fs::Permissions::from_mode(0o700));
            }
        }

        let counters = if path.exists() {
            match Self::load(&path) {
                Ok(counters) => {
                    info!("Loaded {} counters from {:?}", counters.len(), path);
                    counters
                }
                Err(e) => {
                    error!("Failed to load preference file {:?}: {}", path, e);
                    BTreeMap::new()
                }
            }
        } else {
            BTreeMap::new()
        };

        Self {
            path,
            counters: RwLock::new(counters),
        }
    }

    fn load(path: &Path) -> Result<BTreeMap<String, CounterEntry>> {
        let reader = BufReader::new(File::open(path)?);
        Ok(serde_json::from_reader(reader)?)
    }

    fn save(&self, counters: &BTreeMap<String, CounterEntry>) -> Result<()> {
        let file = File::create(&self.path)
            .map_err(|e| Error::ConfigWriteFailed(format!("{:?}: {}", self.path, e)))?;
        // Set restrictive permissions on the store file
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let _ = fs::set_permissions(&self.path, fs::Permissions::from_mode(0o600));
        }
        let writer = BufWriter::new(file);
        serde_json::to_writer_pretty(writer, counters)
            .map_err(|e| Error::ConfigWriteFailed(e.to_string()))
    }

    /// When a counter was last written.
    pub fn updated_at(&self, key: &str) -> Option<DateTime<Utc>> {
        read_lock(&self.counters, "counters", |c| c.get(key).map(|e| e.updated_at))
    }

    /// Get the store file path.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl PreferenceStore for JsonPreferenceStore {
    fn get(&self, key: &str) -> Result<Option<u64>> {
        Ok(read_lock(&self.counters, "counters", |c| {
            c.get(key).map(|e| e.value)
        }))
    }

    fn set(&self, key: &str, value: u64) -> Result<()> {
        write_lock(&self.counters, "counters", |counters| {
            let previous = counters.insert(
                key.to_string(),
                CounterEntry {
                    value,
                    updated_at: Utc::now(),
                },
            );
            if let Err(e) = self.save(counters) {
                // Keep memory and disk in step.
                match previous {
                    Some(entry) => counters.insert(key.to_string(), entry),
                    None => counters.remove(key),
                };
                return Err(e);
            }
            debug!(key, value, "Counter written");
            Ok(())
        })
    }
}

/// Counters kept in memory only.
#[derive(Debug, Default)]
pub struct MemoryPreferenceStore {
    values: RwLock<HashMap<String, u64>>,
}

impl MemoryPreferenceStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-seeded with `values`.
    pub fn with_values<'a>(values: impl IntoIterator<Item = (&'a str, u64)>) -> Self {
        Self {
            values: RwLock::new(
                values
                    .into_iter()
                    .map(|(k, v)| (k.to_string(), v))
                    .collect(),
            ),
        }
    }
}

impl PreferenceStore for MemoryPreferenceStore {
    fn get(&self, key: &str) -> Result<Option<u64>> {
        Ok(read_lock(&self.values, "values", |v| v.get(key).copied()))
    }

    fn set(&self, key: &str, value: u64) -> Result<()> {
        write_lock(&self.values, "values", |v| {
            v.insert(key.to_string(), value);
        });
        Ok(())
    }
}
