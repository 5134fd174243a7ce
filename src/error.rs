// file: src/error.rs
// description: Custom error types and result type aliases
// reference: https://docs.rs/thiserror

use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ArchiverError>;

#[derive(Error, Debug)]
pub enum ArchiverError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Repository enumeration failed: {0}")]
    Enumeration(String),

    #[error("Remote directory provisioning failed for {path}: {message}")]
    Provisioning { path: String, message: String },

    #[error("Clone failed for {repository}: {message}")]
    Clone { repository: String, message: String },

    #[error("Archive failed for {repository}: {message}")]
    Archive { repository: String, message: String },

    #[error("Upload failed for {repository}: {message}")]
    Upload { repository: String, message: String },

    #[error("Remote listing failed for {path}: {message}")]
    DiagnosticList { path: String, message: String },

    #[error("Staging area operation failed for {path}: {source}")]
    Staging {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ArchiverError {
    /// Errors that stop the whole run instead of a single job.
    pub fn is_fatal_to_run(&self) -> bool {
        matches!(
            self,
            ArchiverError::Config(_) | ArchiverError::Enumeration(_) | ArchiverError::Staging { .. }
        )
    }
}
