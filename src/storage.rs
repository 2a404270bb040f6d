//! JSON record storage for persisting application state to disk.
//!
//! Two independent string-keyed records live in the data directory: the
//! full recipe collection and the current edit-session snapshot. Writes
//! are whole-document replacements.

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

/// The records this application persists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKind {
    /// The serialized array of all recipes.
    Recipes,
    /// The serialized current edit-session snapshot. Absent when no
    /// session is active.
    Session,
}

impl RecordKind {
    pub fn filename(&self) -> &'static str {
        match self {
            RecordKind::Recipes => "recipes.json",
            RecordKind::Session => "session.json",
        }
    }
}

/// Errors that can occur during record storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("I/O error for {}: {}", .0.display(), .1)]
    Io(PathBuf, #[source] io::Error),

    #[error("Failed to parse {}: {}", .0.display(), .1)]
    Parse(PathBuf, #[source] serde_json::Error),

    #[error("Failed to serialize {} record: {}", .0.filename(), .1)]
    Encode(RecordKind, #[source] serde_json::Error),
}

/// Storage for JSON records.
///
/// Handles loading and saving records to the filesystem.
#[derive(Debug, Clone)]
pub struct JsonStorage {
    data_dir: PathBuf,
}

impl JsonStorage {
    /// Creates a new storage instance over a data directory.
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    /// Returns the data directory path.
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Returns the full path for a record kind.
    pub fn path(&self, kind: RecordKind) -> PathBuf {
        self.data_dir.join(kind.filename())
    }

    /// Checks if a record exists on disk.
    pub fn exists(&self, kind: RecordKind) -> bool {
        self.path(kind).exists()
    }

    /// Loads a record from disk.
    ///
    /// Returns `Ok(None)` if the file doesn't exist.
    /// Returns `Err` for other I/O or parsing errors.
    pub fn load<T: DeserializeOwned>(&self, kind: RecordKind) -> Result<Option<T>, StorageError> {
        let path = self.path(kind);

        match fs::read_to_string(&path) {
            Ok(contents) => {
                let value = serde_json::from_str(&contents)
                    .map_err(|e| StorageError::Parse(path, e))?;
                Ok(Some(value))
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StorageError::Io(path, e)),
        }
    }

    /// Saves a record to disk as pretty-printed JSON, replacing any
    /// previous contents.
    ///
    /// Creates the data directory if it doesn't exist.
    pub fn save<T: Serialize>(&self, kind: RecordKind, value: &T) -> Result<(), StorageError> {
        fs::create_dir_all(&self.data_dir)
            .map_err(|e| StorageError::Io(self.data_dir.clone(), e))?;

        let path = self.path(kind);
        let contents =
            serde_json::to_string_pretty(value).map_err(|e| StorageError::Encode(kind, e))?;

        fs::write(&path, contents).map_err(|e| StorageError::Io(path.clone(), e))?;
        debug!(path = %path.display(), "saved record");

        Ok(())
    }

    /// Removes a record from disk. Removing a record that doesn't exist
    /// is not an error.
    pub fn remove(&self, kind: RecordKind) -> Result<(), StorageError> {
        let path = self.path(kind);
        match fs::remove_file(&path) {
            Ok(()) => {
                debug!(path = %path.display(), "removed record");
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StorageError::Io(path, e)),
        }
    }
}
