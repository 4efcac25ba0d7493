//! Chunking strategies for RAG retrieval.

mod hierarchical;
mod paragraph;
mod semantic;
mod splitter;

pub use hierarchical::HierarchicalChunker;
pub use paragraph::ParagraphChunker;
pub use semantic::{SemanticChunker, SemanticParams};
pub use splitter::{SplitConfig, TextSplitter};

use ragline_core::{merge_metadata, ParsedDocument};
use serde_json::json;

/// Metadata for a chunk cut from `document`: the document's keys plus the strategy keys.
fn chunk_metadata(document: &ParsedDocument, strategy: &str, index: usize) -> serde_json::Value {
    let mut metadata = document.metadata.clone();
    merge_metadata(
        &mut metadata,
        &json!({
            "chunker": strategy,
            "chunk_index": index,
        }),
    );
    metadata
}
