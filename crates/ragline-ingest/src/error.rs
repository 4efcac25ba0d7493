//! Error types for the ingestion stages.

use ragline_core::CoreError;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for ingestion operations.
pub type IngestResult<T> = Result<T, IngestError>;

/// Errors that can occur while parsing, caching or chunking.
#[derive(Error, Debug)]
pub enum IngestError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config error: {0}")]
    Config(#[from] ragline_config::ConfigError),

    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Unsupported file type: {0}")]
    UnsupportedFileType(PathBuf),

    #[error("Parse error for {path}: {message}")]
    ParseError { path: PathBuf, message: String },

    #[error("Cache error: {0}")]
    Cache(String),

    #[error("Invalid chunking settings: {0}")]
    InvalidSettings(String),
}

impl From<IngestError> for CoreError {
    fn from(err: IngestError) -> Self {
        match err {
            IngestError::Io(e) => CoreError::Io(e),
            IngestError::UnsupportedFileType(path) | IngestError::FileNotFound(path) => {
                CoreError::Unsupported(path)
            }
            IngestError::InvalidSettings(message) => CoreError::Chunking(message),
            other => CoreError::Parse(other.to_string()),
        }
    }
}
