//! Error types shared by every collaborator.

use crate::types::ComponentFamily;
use std::path::PathBuf;
use thiserror::Error;

/// Error raised by parsers, chunkers, stores, embedders and reasoning models.
#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Unknown {family} component: {name}")]
    UnknownComponent {
        family: ComponentFamily,
        name: String,
    },

    #[error("Invalid parameters for {component}: {message}")]
    InvalidParams { component: String, message: String },

    #[error("Unsupported source: {0}")]
    Unsupported(PathBuf),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Chunking error: {0}")]
    Chunking(String),

    #[error("Store error: {0}")]
    Store(String),

    #[error("Embedding error: {0}")]
    Embedding(String),

    #[error("Reasoning error: {0}")]
    Reasoning(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("{0}")]
    Other(String),
}

/// Result type alias using Ragline's core error.
pub type CoreResult<T> = std::result::Result<T, CoreError>;

impl From<serde_json::Error> for CoreError {
    fn from(err: serde_json::Error) -> Self {
        CoreError::Serialization(err.to_string())
    }
}
