//! Pipeline error types.

use ragline_config::ConfigError;
use ragline_core::{ComponentFamily, CoreError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Unknown {family} component: {name}")]
    UnknownComponent {
        family: ComponentFamily,
        name: String,
    },

    #[error("Failed to initialize {family}: {reason}")]
    Init {
        family: ComponentFamily,
        reason: String,
    },

    /// `document` is the source's display form (`path [plan]`).
    #[error("Failed to ingest {document}: {reason}")]
    Ingestion { document: String, reason: String },

    #[error("Failed to answer {question:?}: {reason}")]
    Query { question: String, reason: String },

    #[error("{operation} timed out after {seconds}s")]
    Timeout { operation: String, seconds: u64 },
}

impl PipelineError {
    /// Map a constructor failure, keeping unknown names distinguishable.
    pub(crate) fn from_build(family: ComponentFamily, err: CoreError) -> Self {
        match err {
            CoreError::UnknownComponent { family, name } => {
                PipelineError::UnknownComponent { family, name }
            }
            other => PipelineError::Init {
                family,
                reason: other.to_string(),
            },
        }
    }
}

pub type PipelineResult<T> = std::result::Result<T, PipelineError>;
