//! Failures talking to the Ollama server.

use thiserror::Error;

/// Why a chat or embedding call against Ollama did not produce a result.
#[derive(Error, Debug)]
pub enum OllamaError {
    /// No response within the client's configured `timeout_seconds`.
    #[error("Ollama did not answer within {seconds}s")]
    Timeout { seconds: u64 },

    /// The server reported the requested model missing (404 or a "not found" body).
    #[error("Model '{model}' is not installed. Pull it with 'ollama pull {model}'.")]
    ModelNotFound { model: String },

    /// Connecting to `host` failed outright.
    #[error("Cannot reach Ollama at {host}. Is 'ollama serve' running?")]
    ServerNotRunning { host: String },

    /// Any other non-success status, with the body the server sent.
    #[error("Ollama returned status {status}: {message}")]
    ApiError { status: u16, message: String },

    /// The body arrived but did not have the expected shape.
    #[error("Unexpected response body: {0}")]
    ParseError(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type OllamaResult<T> = Result<T, OllamaError>;
