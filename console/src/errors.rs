//! Error types for KeyVault

use thiserror::Error;

/// Main error type for KeyVault
#[derive(Error, Debug)]
pub enum KeyVaultError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("HTTP {code}: {reason}")]
    HttpStatus { code: u16, reason: String },

    #[error("URL error: {0}")]
    UrlError(#[from] url::ParseError),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Server error: {0}")]
    ServerError(String),

    #[error("Clipboard error: {0}")]
    ClipboardError(String),

    #[error("Shutdown error: {0}")]
    ShutdownError(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<anyhow::Error> for KeyVaultError {
    fn from(err: anyhow::Error) -> Self {
        KeyVaultError::Internal(err.to_string())
    }
}

/// Errors raised by the device directory
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DirectoryError {
    #[error("Device with IP {0} already exists")]
    DuplicateIp(String),

    #[error("Device {0} not found")]
    NotFound(String),
}
