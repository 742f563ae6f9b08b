//! Snapshot persistence: the saved envelope plus in-memory and file backends.
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use thiserror::Error;

use crate::ProgressStorage;
use crate::constants::SNAPSHOT_VERSION;
use crate::progress::PlayerProgress;

/// On-disk shape of a saved snapshot: `{"state": {...}, "version": 0}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistedProgress {
    pub state: PlayerProgress,
    #[serde(default)]
    pub version: u32,
}

impl PersistedProgress {
    #[must_use]
    pub fn new(state: PlayerProgress) -> Self {
        Self {
            state,
            version: SNAPSHOT_VERSION,
        }
    }

    /// Serialize a snapshot inside the versioned envelope.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn encode(progress: &PlayerProgress) -> Result<String, StorageError> {
        Ok(serde_json::to_string(&Self::new(progress.clone()))?)
    }

    /// Parse a saved envelope, rejecting unknown versions.
    ///
    /// # Errors
    ///
    /// Returns an error for malformed JSON or a version this build cannot read.
    pub fn decode(raw: &str) -> Result<PlayerProgress, StorageError> {
        let envelope: Self = serde_json::from_str(raw)?;
        if envelope.version != SNAPSHOT_VERSION {
            return Err(StorageError::Version {
                found: envelope.version,
                expected: SNAPSHOT_VERSION,
            });
        }
        Ok(envelope.state.normalized())
    }
}

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("unsupported snapshot version {found} (expected {expected})")]
    Version { found: u32, expected: u32 },
}

/// Key-value storage kept in memory; clones share the same map.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    saves: Rc<RefCell<HashMap<String, String>>>,
}

impl MemoryStorage {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store raw text under a key, bypassing serialization.
    pub fn insert_raw(&self, key: &str, raw: impl Into<String>) {
        self.saves.borrow_mut().insert(key.to_string(), raw.into());
    }

    #[must_use]
    pub fn raw(&self, key: &str) -> Option<String> {
        self.saves.borrow().get(key).cloned()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.saves.borrow().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.saves.borrow().is_empty()
    }
}

impl ProgressStorage for MemoryStorage {
    type Error = StorageError;

    fn save_progress(&self, key: &str, progress: &PlayerProgress) -> Result<(), Self::Error> {
        let encoded = PersistedProgress::encode(progress)?;
        self.insert_raw(key, encoded);
        Ok(())
    }

    fn load_progress(&self, key: &str) -> Result<Option<PlayerProgress>, Self::Error> {
        self.raw(key)
            .map(|raw| PersistedProgress::decode(&raw))
            .transpose()
    }

    fn delete_progress(&self, key: &str) -> Result<(), Self::Error> {
        self.saves.borrow_mut().remove(key);
        Ok(())
    }
}

/// One `<dir>/<key>.json` file per key.
#[derive(Debug, Clone)]
pub struct JsonFileStorage {
    dir: PathBuf,
}

impl JsonFileStorage {
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    #[must_use]
    pub fn path_for(&self, key: &str) -> PathBuf {
        let file: String = key
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.') {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        self.dir.join(format!("{file}.json"))
    }
}

impl ProgressStorage for JsonFileStorage {
    type Error = StorageError;

    fn save_progress(&self, key: &str, progress: &PlayerProgress) -> Result<(), Self::Error> {
        fs::create_dir_all(&self.dir).map_err(|source| StorageError::Io {
            path: self.dir.clone(),
            source,
        })?;
        let path = self.path_for(key);
        let encoded = PersistedProgress::encode(progress)?;
        fs::write(&path, encoded).map_err(|source| StorageError::Io { path, source })
    }

    fn load_progress(&self, key: &str) -> Result<Option<PlayerProgress>, Self::Error> {
        let path = self.path_for(key);
        match fs::read_to_string(&path) {
            Ok(raw) => PersistedProgress::decode(&raw).map(Some),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(source) => Err(StorageError::Io { path, source }),
        }
    }

    fn delete_progress(&self, key: &str) -> Result<(), Self::Error> {
        let path = self.path_for(key);
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
            Err(source) => Err(StorageError::Io { path, source }),
        }
    }
}
