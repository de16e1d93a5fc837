//! Custom error types for Lara API operations

use thiserror::Error;

/// Lara client errors
#[derive(Error, Debug)]
pub enum LaraError {
    /// The server answered with a failure, or a document translation ended in error
    #[error("API error: {status_code} {error_type} - {message}")]
    ApiError {
        status_code: u16,
        error_type: String,
        message: String,
    },

    /// Local encode/decode failure
    #[error("Transport error: {message}")]
    TransportError {
        message: String,
    },

    /// A poll loop exceeded its maximum wait
    #[error("Timeout: {message}")]
    TimeoutError {
        message: String,
    },

    /// Upload to or download from a pre-signed storage URL failed
    #[error("Storage transfer failed with status {status_code}: {body}")]
    StorageTransferError {
        status_code: u16,
        body: String,
    },

    /// Configuration error
    #[error("Configuration error: {message}")]
    ConfigError {
        message: String,
    },

    /// File operation error
    #[error("File error: {path} - {message}")]
    FileError {
        path: String,
        message: String,
    },

    /// IO error
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Reqwest error
    #[error("HTTP client error: {0}")]
    HttpError(#[from] reqwest::Error),
}

impl LaraError {
    /// Build an API error
    pub fn api(
        status_code: u16,
        error_type: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        LaraError::ApiError {
            status_code,
            error_type: error_type.into(),
            message: message.into(),
        }
    }

    /// Build a transport error
    pub fn transport(message: impl Into<String>) -> Self {
        LaraError::TransportError {
            message: message.into(),
        }
    }

    /// HTTP status of a server-reported failure, if any
    pub fn status_code(&self) -> Option<u16> {
        match self {
            LaraError::ApiError { status_code, .. }
            | LaraError::StorageTransferError { status_code, .. } => Some(*status_code),
            _ => None,
        }
    }
}

impl From<config::ConfigError> for LaraError {
    fn from(err: config::ConfigError) -> Self {
        LaraError::ConfigError {
            message: err.to_string(),
        }
    }
}

/// Result type for Lara operations
pub type Result<T> = std::result::Result<T, LaraError>;
