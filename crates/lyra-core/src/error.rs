//! Error types for the Lyra client.

use thiserror::Error;

/// A shared error type for the entire Lyra client.
///
/// This provides typed, structured error variants with automatic conversion
/// from common error types via the `From` trait.
#[derive(Error, Debug, Clone)]
pub enum LyraError {
    /// Non-success HTTP response with a normalized human-readable message
    #[error("{message}")]
    Request { message: String, status: u16 },

    /// 401 on an authenticated call; the session is no longer valid
    #[error("Session is no longer valid")]
    Auth,

    /// 429 on the guest chat call; carries the server-provided wait
    #[error("Rate limited, retry in {retry_after_seconds}s")]
    RateLimited { retry_after_seconds: u64 },

    /// Network failure or unreachable server
    #[error("Could not reach server: {0}")]
    Transport(String),

    /// Local input validation failure
    #[error("Invalid {field}: {message}")]
    Validation {
        field: &'static str,
        message: String,
    },

    /// Local storage error (session store file)
    #[error("Storage error: {0}")]
    Storage(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Internal error (should not happen in normal operation)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl LyraError {
    /// Creates a Request error
    pub fn request(message: impl Into<String>, status: u16) -> Self {
        Self::Request {
            message: message.into(),
            status,
        }
    }

    /// Creates a Transport error
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport(message.into())
    }

    /// Creates a Validation error
    pub fn validation(field: &'static str, message: impl Into<String>) -> Self {
        Self::Validation {
            field,
            message: message.into(),
        }
    }

    /// Creates a Storage error
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage(message.into())
    }

    /// Creates an Internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Check if this error invalidates the session
    pub fn is_auth(&self) -> bool {
        matches!(self, Self::Auth)
    }

    /// Check if this is a rate-limit signal
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, Self::RateLimited { .. })
    }

    /// The HTTP status code, if this error carries one.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Request { status, .. } => Some(*status),
            Self::Auth => Some(401),
            Self::RateLimited { .. } => Some(429),
            _ => None,
        }
    }
}

impl From<std::io::Error> for LyraError {
    fn from(err: std::io::Error) -> Self {
        Self::Storage(format!("{} (kind: {:?})", err, err.kind()))
    }
}

impl From<serde_json::Error> for LyraError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

impl From<toml::de::Error> for LyraError {
    fn from(err: toml::de::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

impl From<toml::ser::Error> for LyraError {
    fn from(err: toml::ser::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

/// Conversion from anyhow::Error (used at application edges)
impl From<anyhow::Error> for LyraError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

/// A type alias for `Result<T, LyraError>`.
pub type Result<T> = std::result::Result<T, LyraError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_is_derived_from_variant() {
        assert_eq!(LyraError::Auth.status(), Some(401));
        assert_eq!(
            LyraError::RateLimited {
                retry_after_seconds: 60
            }
            .status(),
            Some(429)
        );
        assert_eq!(LyraError::request("boom", 500).status(), Some(500));
        assert_eq!(LyraError::transport("down").status(), None);
    }

    #[test]
    fn request_error_displays_its_message_only() {
        let err = LyraError::request("Este email já está registrado.", 400);
        assert_eq!(err.to_string(), "Este email já está registrado.");
    }
}
