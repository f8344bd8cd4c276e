//! Typed TOML record storage with atomic writes.
//!
//! Persists a single serializable record to a TOML file. Writes go through a
//! temporary file plus atomic rename with an exclusive advisory lock, so a
//! crash mid-write never leaves a half-written record behind.

use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fs::{self, File, OpenOptions};
use std::io::Write as IoWrite;
use std::path::{Path, PathBuf};

/// Errors that can occur during record storage operations.
#[derive(Debug)]
pub enum RecordStorageError {
    /// File I/O error.
    IoError(std::io::Error),
    /// TOML parsing error.
    TomlParseError(toml::de::Error),
    /// TOML serialization error.
    TomlSerError(toml::ser::Error),
    /// File locking error.
    LockError(String),
}

impl std::fmt::Display for RecordStorageError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RecordStorageError::IoError(e) => write!(f, "I/O error: {}", e),
            RecordStorageError::TomlParseError(e) => write!(f, "TOML parse error: {}", e),
            RecordStorageError::TomlSerError(e) => write!(f, "TOML serialization error: {}", e),
            RecordStorageError::LockError(e) => write!(f, "Lock error: {}", e),
        }
    }
}

impl std::error::Error for RecordStorageError {}

impl From<std::io::Error> for RecordStorageError {
    fn from(e: std::io::Error) -> Self {
        RecordStorageError::IoError(e)
    }
}

impl From<toml::de::Error> for RecordStorageError {
    fn from(e: toml::de::Error) -> Self {
        RecordStorageError::TomlParseError(e)
    }
}

impl From<toml::ser::Error> for RecordStorageError {
    fn from(e: toml::ser::Error) -> Self {
        RecordStorageError::TomlSerError(e)
    }
}

/// A single-record TOML file store.
///
/// Provides:
/// - **Atomicity**: updates are all-or-nothing via tmp file + atomic rename
/// - **Isolation**: an exclusive advisory lock serializes concurrent writers
/// - **Durability**: explicit fsync before rename
pub struct RecordStorage {
    path: PathBuf,
}

impl RecordStorage {
    /// Creates a new storage handle for the given file path.
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// The file path this storage writes to.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads the record, if any.
    ///
    /// A missing or empty file yields `Ok(None)`; a present but unparseable
    /// file is an error the caller decides how to treat.
    pub fn load<T: DeserializeOwned>(&self) -> Result<Option<T>, RecordStorageError> {
        if !self.path.exists() {
            return Ok(None);
        }

        let content = fs::read_to_string(&self.path)?;
        if content.trim().is_empty() {
            return Ok(None);
        }

        Ok(Some(toml::from_str(&content)?))
    }

    /// Saves the record atomically, replacing any previous content.
    pub fn save<T: Serialize>(&self, record: &T) -> Result<(), RecordStorageError> {
        let _lock = FileLock::acquire(&self.path)?;

        if let Some(parent) = self.path.parent() {
            if !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }

        let toml_string = toml::to_string_pretty(record)?;

        // Write to a temporary file in the same directory, then rename
        let tmp_path = self.temp_path()?;
        let mut tmp_file = File::create(&tmp_path)?;
        tmp_file.write_all(toml_string.as_bytes())?;
        tmp_file.sync_all()?;
        drop(tmp_file);

        fs::rename(&tmp_path, &self.path)?;

        Ok(())
    }

    fn temp_path(&self) -> Result<PathBuf, RecordStorageError> {
        let parent = self.path.parent().ok_or_else(|| {
            RecordStorageError::IoError(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "Path has no parent directory",
            ))
        })?;

        let file_name = self.path.file_name().ok_or_else(|| {
            RecordStorageError::IoError(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "Path has no file name",
            ))
        })?;

        let tmp_name = format!(".{}.tmp", file_name.to_string_lossy());
        Ok(parent.join(tmp_name))
    }
}

/// A file lock guard that automatically releases the lock when dropped.
struct FileLock {
    #[allow(dead_code)]
    file: File,
    lock_path: PathBuf,
}

impl FileLock {
    fn acquire(path: &Path) -> Result<Self, RecordStorageError> {
        let lock_path = path.with_extension("lock");

        if let Some(parent) = lock_path.parent() {
            if !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }

        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(false)
            .open(&lock_path)?;

        #[cfg(unix)]
        {
            use fs2::FileExt;
            file.lock_exclusive().map_err(|e| {
                RecordStorageError::LockError(format!("Failed to acquire lock: {}", e))
            })?;
        }

        #[cfg(not(unix))]
        {
            // No advisory locking on non-Unix systems; single-user client
        }

        Ok(FileLock { file, lock_path })
    }
}

impl Drop for FileLock {
    fn drop(&mut self) {
        // Unlock is automatic when the file handle is dropped
        let _ = fs::remove_file(&self.lock_path);
    }
}
