use super::chunk_metadata;
use super::splitter::{SplitConfig, TextSplitter};
use async_trait::async_trait;
use ragline_core::{decode_params, Chunk, Chunker, CoreResult, ParsedDocument};

const STRATEGY: &str = "paragraph";

/// Sliding-window chunker that prefers paragraph and sentence boundaries.
#[derive(Debug, Clone, Default)]
pub struct ParagraphChunker {
    splitter: TextSplitter,
}

impl ParagraphChunker {
    pub fn new(config: SplitConfig) -> CoreResult<Self> {
        Ok(Self {
            splitter: TextSplitter::new(config)?,
        })
    }

    /// Build from a parameter bag with `chunk_size`, `chunk_overlap` and `min_chunk_size`.
    pub fn from_params(params: &serde_json::Value) -> CoreResult<Self> {
        let config: SplitConfig = decode_params("ParagraphChunker", params)?;
        Self::new(config)
    }
}

#[async_trait]
impl Chunker for ParagraphChunker {
    async fn chunk(&self, documents: &[ParsedDocument]) -> CoreResult<Vec<Chunk>> {
        let mut chunks = Vec::new();
        for document in documents {
            for (index, piece) in self.splitter.split(&document.content).into_iter().enumerate() {
                chunks.push(Chunk::new(piece, chunk_metadata(document, STRATEGY, index)));
            }
        }
        tracing::debug!(
            documents = documents.len(),
            chunks = chunks.len(),
            "Paragraph chunking complete"
        );
        Ok(chunks)
    }

    fn strategy_name(&self) -> &str {
        STRATEGY
    }

    fn config(&self) -> serde_json::Value {
        serde_json::to_value(self.splitter.config()).unwrap_or_default()
    }
}
