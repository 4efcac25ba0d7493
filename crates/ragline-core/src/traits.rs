//! Contracts for the swappable collaborators.
//!
//! Each family is a capability interface with no shared base state. Parsing
//! is CPU-bound and synchronous. Chunking is async because a strategy may
//! embed text; storage, embedding and reasoning talk to external services.

use crate::conversation::{ChatMessage, ReasoningStep, ToolDescriptor};
use crate::error::CoreResult;
use crate::types::{Chunk, ChunkId, ParsedDocument, SearchFilter, SearchHit, SourceRef};
use async_trait::async_trait;
use std::path::Path;

/// Converts a raw source into text documents.
pub trait Parser: Send + Sync {
    /// Parse the source into one or more documents tagged with `source.name`.
    fn parse(&self, source: &SourceRef) -> CoreResult<Vec<ParsedDocument>>;

    /// Get the supported file extensions (without the dot).
    fn extensions(&self) -> &[&str];

    /// The implementation name used in the registry.
    fn name(&self) -> &str;

    /// Supported extensions as owned strings.
    fn supported_formats(&self) -> Vec<String> {
        self.extensions().iter().map(|e| e.to_string()).collect()
    }

    /// Check if this parser supports the given extension.
    fn supports(&self, extension: &str) -> bool {
        self.extensions()
            .iter()
            .any(|ext| ext.eq_ignore_ascii_case(extension))
    }

    /// Check whether the path exists and has a supported extension.
    fn validate(&self, path: &Path) -> bool {
        path.is_file()
            && path
                .extension()
                .and_then(|e| e.to_str())
                .map(|e| self.supports(e))
                .unwrap_or(false)
    }
}

/// Splits documents into chunks.
#[async_trait]
pub trait Chunker: Send + Sync {
    async fn chunk(&self, documents: &[ParsedDocument]) -> CoreResult<Vec<Chunk>>;

    /// Name of the strategy, recorded in every chunk's metadata.
    fn strategy_name(&self) -> &str;

    /// The effective configuration of this chunker.
    fn config(&self) -> serde_json::Value;
}

/// Persists chunks and answers similarity searches.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Store chunks, returning their IDs in input order.
    async fn add(&self, chunks: Vec<Chunk>) -> CoreResult<Vec<ChunkId>>;

    /// Return at most `top_k` hits ordered by descending score.
    async fn search(
        &self,
        query: &str,
        top_k: usize,
        filter: Option<&SearchFilter>,
    ) -> CoreResult<Vec<SearchHit>>;

    async fn delete(&self, ids: &[ChunkId]) -> CoreResult<bool>;

    async fn clear_collection(&self) -> CoreResult<bool>;

    async fn collection_info(&self) -> CoreResult<serde_json::Value>;

    fn name(&self) -> &str;
}

/// Turns text into a dense vector.
#[async_trait]
pub trait Embedder: Send + Sync {
    async fn embed(&self, text: &str) -> CoreResult<Vec<f32>>;

    fn model_name(&self) -> &str;
}

/// The language-model call at the heart of the agent loop.
#[async_trait]
pub trait ReasoningModel: Send + Sync {
    async fn respond(
        &self,
        conversation: &[ChatMessage],
        tools: &[ToolDescriptor],
    ) -> CoreResult<ReasoningStep>;

    fn model_name(&self) -> &str;
}
