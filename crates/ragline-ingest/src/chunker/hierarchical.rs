//! Multi-level chunking: every piece is re-split at the next smaller size.

use super::chunk_metadata;
use super::splitter::{SplitConfig, TextSplitter};
use crate::error::IngestError;
use async_trait::async_trait;
use ragline_core::{decode_params, merge_metadata, Chunk, Chunker, CoreResult, ParsedDocument};
use serde::{Deserialize, Serialize};
use serde_json::json;

const STRATEGY: &str = "hierarchical";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HierarchicalParams {
    /// Piece size per level, largest first.
    pub chunk_sizes: Vec<usize>,
    pub chunk_overlap: usize,
}

impl Default for HierarchicalParams {
    fn default() -> Self {
        Self {
            chunk_sizes: vec![1536, 512, 128],
            chunk_overlap: 0,
        }
    }
}

/// Emits a tree of chunks per document. Level 0 holds the largest pieces;
/// each deeper level links to its parent through `parent_id`.
#[derive(Debug, Clone)]
pub struct HierarchicalChunker {
    params: HierarchicalParams,
    levels: Vec<TextSplitter>,
}

impl HierarchicalChunker {
    pub fn new(params: HierarchicalParams) -> CoreResult<Self> {
        if params.chunk_sizes.is_empty() {
            return Err(IngestError::InvalidSettings("chunk_sizes must not be empty".into()).into());
        }
        if params.chunk_sizes.windows(2).any(|w| w[1] >= w[0]) {
            return Err(IngestError::InvalidSettings(format!(
                "chunk_sizes must be strictly decreasing, got {:?}",
                params.chunk_sizes
            ))
            .into());
        }

        let levels = params
            .chunk_sizes
            .iter()
            .map(|&chunk_size| {
                TextSplitter::new(SplitConfig {
                    chunk_size,
                    chunk_overlap: params.chunk_overlap.min(chunk_size / 2),
                    min_chunk_size: 0,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { params, levels })
    }

    pub fn from_params(params: &serde_json::Value) -> CoreResult<Self> {
        Self::new(decode_params("HierarchicalChunker", params)?)
    }

    fn split_level(
        &self,
        document: &ParsedDocument,
        text: &str,
        level: usize,
        parent_id: Option<&str>,
        out: &mut Vec<Chunk>,
    ) {
        let Some(splitter) = self.levels.get(level) else {
            return;
        };
        for piece in splitter.split(text) {
            let mut metadata = chunk_metadata(document, STRATEGY, out.len());
            merge_metadata(
                &mut metadata,
                &json!({
                    "level": level,
                    "parent_id": parent_id,
                }),
            );
            let chunk = Chunk::new(piece, metadata);
            let id = chunk.id.clone();
            let content = chunk.content.clone();
            out.push(chunk);
            self.split_level(document, &content, level + 1, Some(&id), out);
        }
    }
}

impl Default for HierarchicalChunker {
    fn default() -> Self {
        let levels = HierarchicalParams::default()
            .chunk_sizes
            .into_iter()
            .map(|chunk_size| {
                TextSplitter::new(SplitConfig {
                    chunk_size,
                    chunk_overlap: 0,
                    min_chunk_size: 0,
                })
                .unwrap_or_default()
            })
            .collect();
        Self {
            params: HierarchicalParams::default(),
            levels,
        }
    }
}

#[async_trait]
impl Chunker for HierarchicalChunker {
    async fn chunk(&self, documents: &[ParsedDocument]) -> CoreResult<Vec<Chunk>> {
        let mut chunks = Vec::new();
        for document in documents {
            let mut tree = Vec::new();
            self.split_level(document, &document.content, 0, None, &mut tree);
            chunks.extend(tree);
        }
        tracing::debug!(
            documents = documents.len(),
            chunks = chunks.len(),
            levels = self.levels.len(),
            "Hierarchical chunking complete"
        );
        Ok(chunks)
    }

    fn strategy_name(&self) -> &str {
        STRATEGY
    }

    fn config(&self) -> serde_json::Value {
        serde_json::to_value(&self.params).unwrap_or_default()
    }
}
