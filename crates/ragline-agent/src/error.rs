//! Agent error types.

use ragline_core::CoreError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AgentError {
    /// Reported back to the model as conversation text, never raised from the loop.
    #[error("tool '{0}' not found")]
    ToolNotFound(String),

    #[error("tool '{tool}' failed: {message}")]
    ToolFailed { tool: String, message: String },

    #[error("tool loop exceeded {limit} iterations without a final answer")]
    ToolLoopExceeded { limit: usize },

    #[error("reasoning failed: {0}")]
    Reasoning(String),
}

pub type AgentResult<T> = Result<T, AgentError>;

impl From<AgentError> for CoreError {
    fn from(err: AgentError) -> Self {
        match err {
            AgentError::Reasoning(message) => CoreError::Reasoning(message),
            other => CoreError::Other(other.to_string()),
        }
    }
}
