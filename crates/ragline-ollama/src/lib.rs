//! Ragline Ollama - Ollama integration for embeddings and tool-calling chat.
//!
//! This crate provides an async client for Ollama's API and the two
//! collaborators the pipeline needs from it: an [`Embedder`](ragline_core::Embedder)
//! and a [`ReasoningModel`](ragline_core::ReasoningModel).

mod chat;
mod client;
pub mod context;
mod embedder;
mod error;
mod types;

pub use chat::OllamaChat;
pub use client::OllamaClient;
pub use context::format_context;
pub use embedder::OllamaEmbedder;
pub use error::{OllamaError, OllamaResult};
pub use types::*;
