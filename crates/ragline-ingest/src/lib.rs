//! Ragline Ingest - Parsing and chunking stages of the ingestion pipeline.
//!
//! This crate provides:
//! - Document parsers (markdown, plain text, PDF)
//! - A content-addressed cache so expensive parses are not repeated
//! - Chunking strategies (paragraph window, hierarchical, semantic)

pub mod cache;
mod chunker;
mod error;
mod parsers;

pub use cache::{CacheInfo, CacheStats, CachedArtifact, ContentCache};
pub use chunker::{
    HierarchicalChunker, ParagraphChunker, SemanticChunker, SemanticParams, SplitConfig, TextSplitter,
};
pub use error::{IngestError, IngestResult};
pub use parsers::{MarkdownParser, ParserOptions, PdfParser, TextParser};
