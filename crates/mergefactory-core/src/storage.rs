//! Persistence contract.
//!
//! The core stores exactly one blob under a fixed key. What medium holds it
//! is up to the embedder; [`SaveStore`] is all the session needs. Two
//! implementations ship here: [`MemoryStore`] for tests and headless runs,
//! and [`FileStore`] for a save file on disk.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Key the save is stored under.
pub const SAVE_KEY: &str = "idle_merge_factory_save";

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("storage I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

/// Read, write and delete the single save blob.
pub trait SaveStore {
    /// The stored blob, or `None` if nothing has been saved.
    fn load(&self) -> Result<Option<String>, StorageError>;
    fn save(&mut self, blob: &str) -> Result<(), StorageError>;
    /// Remove the blob. Deleting a missing save is not an error.
    fn delete(&mut self) -> Result<(), StorageError>;

    fn exists(&self) -> bool {
        matches!(self.load(), Ok(Some(_)))
    }
}

// ---------------------------------------------------------------------------
// MemoryStore
// ---------------------------------------------------------------------------

/// In-memory store. Can be switched into a failing mode to exercise the
/// storage-failure path.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    blob: Option<String>,
    failing: bool,
    writes: usize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store that already holds `blob`.
    pub fn with_blob(blob: impl Into<String>) -> Self {
        Self {
            blob: Some(blob.into()),
            ..Self::default()
        }
    }

    /// Make every operation fail (or succeed again).
    pub fn set_failing(&mut self, failing: bool) {
        self.failing = failing;
    }

    pub fn blob(&self) -> Option<&str> {
        self.blob.as_deref()
    }

    /// Number of successful saves.
    pub fn writes(&self) -> usize {
        self.writes
    }

    fn check(&self) -> Result<(), StorageError> {
        if self.failing {
            return Err(StorageError::Unavailable("memory store set to fail".into()));
        }
        Ok(())
    }
}

impl SaveStore for MemoryStore {
    fn load(&self) -> Result<Option<String>, StorageError> {
        self.check()?;
        Ok(self.blob.clone())
    }

    fn save(&mut self, blob: &str) -> Result<(), StorageError> {
        self.check()?;
        self.blob = Some(blob.to_string());
        self.writes += 1;
        Ok(())
    }

    fn delete(&mut self) -> Result<(), StorageError> {
        self.check()?;
        self.blob = None;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// FileStore
// ---------------------------------------------------------------------------

/// Save file at `<dir>/<SAVE_KEY>.json`. Writes go to a sibling temp file
/// first and are renamed into place, so a crash mid-write keeps the old save.
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            path: dir.as_ref().join(format!("{SAVE_KEY}.json")),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: io::Error) -> StorageError {
        StorageError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

impl SaveStore for FileStore {
    fn load(&self) -> Result<Option<String>, StorageError> {
        match fs::read_to_string(&self.path) {
            Ok(blob) => Ok(Some(blob)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(self.io_error(e)),
        }
    }

    fn save(&mut self, blob: &str) -> Result<(), StorageError> {
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, blob).map_err(|e| self.io_error(e))?;
        fs::rename(&tmp, &self.path).map_err(|e| self.io_error(e))
    }

    fn delete(&mut self) -> Result<(), StorageError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(self.io_error(e)),
        }
    }

    fn exists(&self) -> bool {
        self.path.is_file()
    }
}
