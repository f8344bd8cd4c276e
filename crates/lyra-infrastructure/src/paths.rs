//! Unified path management for Lyra's local files.
//!
//! All local client state lives under the platform config directory:
//!
//! ```text
//! ~/.config/lyra/              # Config directory
//! ├── config.toml              # Client configuration (API base URL, ...)
//! └── session.toml             # Session store (token, profile cache, ...)
//! ```

use std::path::PathBuf;

/// Errors that can occur during path resolution.
#[derive(Debug)]
pub enum PathError {
    /// Home directory could not be determined.
    HomeDirNotFound,
}

impl std::fmt::Display for PathError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PathError::HomeDirNotFound => write!(f, "Cannot find home directory"),
        }
    }
}

impl std::error::Error for PathError {}

/// Unified path management for Lyra.
pub struct LyraPaths;

impl LyraPaths {
    /// Returns the Lyra configuration directory (e.g. `~/.config/lyra/`).
    pub fn config_dir() -> Result<PathBuf, PathError> {
        dirs::config_dir()
            .map(|dir| dir.join("lyra"))
            .ok_or(PathError::HomeDirNotFound)
    }

    /// Returns the path to the main configuration file.
    pub fn config_file() -> Result<PathBuf, PathError> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    /// Returns the path to the session store file.
    pub fn session_file() -> Result<PathBuf, PathError> {
        Ok(Self::config_dir()?.join("session.toml"))
    }
}
