use crate::dlog;
use crate::types::Workout;
use crate::utils::ensure_dir;
use anyhow::Result;
use std::collections::HashMap;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use thiserror::Error;

/// Slot holding the serialized workout list.
pub const WORKOUTS_KEY: &str = "workouts";

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage is unavailable")]
    Unavailable,

    #[error("invalid storage key: {0:?}")]
    InvalidKey(String),

    #[error("storage quota exceeded: {needed} bytes needed, {quota} allowed")]
    QuotaExceeded { needed: usize, quota: usize },

    #[error("storage I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("could not encode workouts: {0}")]
    Encode(#[source] serde_json::Error),

    #[error("stored workouts are corrupt: {0}")]
    Corrupt(#[from] serde_json::Error),
}

/// Named string slots that survive a restart.
pub trait Storage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError>;
    fn remove(&mut self, key: &str) -> Result<(), StorageError>;
}

fn check_quota(quota: Option<usize>, value: &str) -> Result<(), StorageError> {
    match quota {
        Some(quota) if value.len() > quota => Err(StorageError::QuotaExceeded {
            needed: value.len(),
            quota,
        }),
        _ => Ok(()),
    }
}

/// One file per key under a data directory.
#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
    quota: Option<usize>,
}

impl FileStorage {
    pub fn open(dir: &Path) -> Result<Self> {
        ensure_dir(dir)?;
        Ok(Self {
            dir: dir.to_path_buf(),
            quota: None,
        })
    }

    /// Rejects values longer than `bytes`.
    #[must_use]
    pub fn with_quota(mut self, bytes: usize) -> Self {
        self.quota = Some(bytes);
        self
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, StorageError> {
        // Keys become file names; only allow simple identifiers.
        if key.is_empty()
            || !key
                .bytes()
                .all(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'-')
        {
            return Err(StorageError::InvalidKey(key.to_string()));
        }
        Ok(self.dir.join(format!("{key}.json")))
    }
}

impl Storage for FileStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let path = self.path_for(key)?;
        match fs::read_to_string(&path) {
            Ok(s) => Ok(Some(s)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(StorageError::Io { path, source }),
        }
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        let path = self.path_for(key)?;
        check_quota(self.quota, value)?;

        let io_err = |source| StorageError::Io {
            path: path.clone(),
            source,
        };

        // Write next to the target and rename so a crash never leaves half a slot.
        let mut tmp = NamedTempFile::new_in(&self.dir).map_err(io_err)?;
        tmp.write_all(value.as_bytes()).map_err(io_err)?;
        tmp.persist(&path).map_err(|e| io_err(e.error))?;

        dlog!("storage_set key={key} bytes={}", value.len());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StorageError> {
        let path = self.path_for(key)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(StorageError::Io { path, source }),
        }
    }
}

/// In-process slots; can simulate a quota or a disabled storage.
#[derive(Debug, Clone)]
pub struct MemoryStorage {
    slots: HashMap<String, String>,
    quota: Option<usize>,
    available: bool,
}

impl Default for MemoryStorage {
    fn default() -> Self {
        Self {
            slots: HashMap::new(),
            quota: None,
            available: true,
        }
    }
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_quota(mut self, bytes: usize) -> Self {
        self.quota = Some(bytes);
        self
    }

    /// Every operation fails with [`StorageError::Unavailable`].
    pub fn unavailable() -> Self {
        Self {
            available: false,
            ..Self::default()
        }
    }

    fn check(&self) -> Result<(), StorageError> {
        if self.available {
            Ok(())
        } else {
            Err(StorageError::Unavailable)
        }
    }
}

impl Storage for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        self.check()?;
        Ok(self.slots.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        self.check()?;
        check_quota(self.quota, value)?;
        self.slots.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StorageError> {
        self.check()?;
        self.slots.remove(key);
        Ok(())
    }
}

/// Saves and loads the whole workout list as one JSON slot.
#[derive(Debug, Clone)]
pub struct WorkoutStore<S: Storage> {
    storage: S,
}

impl<S: Storage> WorkoutStore<S> {
    pub const fn new(storage: S) -> Self {
        Self { storage }
    }

    /// Overwrites the slot with `workouts`.
    pub fn save(&mut self, workouts: &[Workout]) -> Result<(), StorageError> {
        let json = serde_json::to_string(workouts).map_err(StorageError::Encode)?;
        self.storage.set(WORKOUTS_KEY, &json)?;
        tracing::debug!(workouts = workouts.len(), "saved workouts");
        Ok(())
    }

    /// `None` when nothing was ever saved (or the slot holds `null`).
    pub fn load(&self) -> Result<Option<Vec<Workout>>, StorageError> {
        let Some(raw) = self.storage.get(WORKOUTS_KEY)? else {
            return Ok(None);
        };
        let workouts: Option<Vec<Workout>> = serde_json::from_str(&raw)?;
        dlog!(
            "loaded_workouts count={}",
            workouts.as_ref().map_or(0, Vec::len)
        );
        Ok(workouts)
    }

    pub fn clear(&mut self) -> Result<(), StorageError> {
        self.storage.remove(WORKOUTS_KEY)
    }

    pub const fn storage(&self) -> &S {
        &self.storage
    }

    pub fn into_inner(self) -> S {
        self.storage
    }
}
