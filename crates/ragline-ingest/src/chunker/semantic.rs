//! Semantic chunking: cut where neighbouring sentence windows stop resembling
//! each other.

use super::chunk_metadata;
use super::splitter::split_sentences;
use crate::error::IngestError;
use async_trait::async_trait;
use ragline_core::{merge_metadata, Chunk, Chunker, CoreResult, Embedder, ParsedDocument};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;

const STRATEGY: &str = "semantic";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SemanticParams {
    /// Sentences on each side folded into a sentence's window before embedding.
    pub buffer_size: usize,
    /// Percentile of the window distances, as a fraction in `(0, 1]`.
    /// Boundaries more distant than this percentile become cuts.
    pub threshold: f32,
}

impl Default for SemanticParams {
    fn default() -> Self {
        Self {
            buffer_size: 1,
            threshold: 0.75,
        }
    }
}

/// Splits each document into sentences, embeds every sentence together with
/// `buffer_size` neighbours on each side, and cuts between consecutive windows
/// whose cosine distance lies above the `threshold` percentile.
pub struct SemanticChunker {
    params: SemanticParams,
    embedder: Arc<dyn Embedder>,
}

impl SemanticChunker {
    pub fn new(params: SemanticParams, embedder: Arc<dyn Embedder>) -> CoreResult<Self> {
        if !(params.threshold > 0.0 && params.threshold <= 1.0) {
            return Err(IngestError::InvalidSettings(format!(
                "threshold must be in (0, 1], got {}",
                params.threshold
            ))
            .into());
        }
        Ok(Self { params, embedder })
    }

    pub fn params(&self) -> &SemanticParams {
        &self.params
    }

    /// Group the sentences of `text` into semantically coherent pieces.
    async fn split(&self, text: &str) -> CoreResult<Vec<String>> {
        let sentences: Vec<&str> = text.split("\n\n").flat_map(split_sentences).collect();
        if sentences.len() < 2 {
            return Ok(sentences.into_iter().map(str::to_string).collect());
        }

        let buffer = self.params.buffer_size;
        let mut embeddings = Vec::with_capacity(sentences.len());
        for i in 0..sentences.len() {
            let start = i.saturating_sub(buffer);
            let end = (i + buffer + 1).min(sentences.len());
            let window = sentences[start..end].join(" ");
            embeddings.push(self.embedder.embed(&window).await?);
        }

        let distances: Vec<f32> = embeddings
            .windows(2)
            .map(|pair| 1.0 - cosine(&pair[0], &pair[1]))
            .collect();
        let cutoff = percentile(&distances, self.params.threshold);

        let mut pieces = Vec::new();
        let mut start = 0;
        for (i, distance) in distances.iter().enumerate() {
            if *distance > cutoff {
                pieces.push(sentences[start..=i].join(" "));
                start = i + 1;
            }
        }
        pieces.push(sentences[start..].join(" "));
        Ok(pieces)
    }
}

#[async_trait]
impl Chunker for SemanticChunker {
    async fn chunk(&self, documents: &[ParsedDocument]) -> CoreResult<Vec<Chunk>> {
        let mut chunks = Vec::new();
        for document in documents {
            for (index, piece) in self.split(&document.content).await?.into_iter().enumerate() {
                let mut metadata = chunk_metadata(document, STRATEGY, index);
                merge_metadata(
                    &mut metadata,
                    &json!({
                        "buffer_size": self.params.buffer_size,
                        "threshold": self.params.threshold,
                        "embed_model": self.embedder.model_name(),
                    }),
                );
                chunks.push(Chunk::new(piece, metadata));
            }
        }
        tracing::debug!(
            documents = documents.len(),
            chunks = chunks.len(),
            model = self.embedder.model_name(),
            "Semantic chunking complete"
        );
        Ok(chunks)
    }

    fn strategy_name(&self) -> &str {
        STRATEGY
    }

    fn config(&self) -> serde_json::Value {
        json!({
            "buffer_size": self.params.buffer_size,
            "threshold": self.params.threshold,
            "embed_model": self.embedder.model_name(),
        })
    }
}

fn cosine(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm = a.iter().map(|x| x * x).sum::<f32>().sqrt() * b.iter().map(|y| y * y).sum::<f32>().sqrt();
    if norm == 0.0 {
        return 0.0;
    }
    dot / norm
}

/// Linearly interpolated percentile of a non-empty slice; `fraction` in `[0, 1]`.
fn percentile(values: &[f32], fraction: f32) -> f32 {
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let rank = fraction * (sorted.len() - 1) as f32;
    let lower = rank.floor() as usize;
    let upper = rank.ceil() as usize;
    sorted[lower] + (sorted[upper] - sorted[lower]) * (rank - lower as f32)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ragline_core::CoreError;
    use ragline_store::HashingEmbedder;
    use std::sync::Mutex;

    /// Returns the same vector for every text and records what it was asked to embed.
    #[derive(Default)]
    struct RecordingEmbedder {
        texts: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl Embedder for RecordingEmbedder {
        async fn embed(&self, text: &str) -> CoreResult<Vec<f32>> {
            self.texts.lock().unwrap().push(text.to_string());
            Ok(vec![1.0, 0.0])
        }

        fn model_name(&self) -> &str {
            "recording"
        }
    }

    struct OfflineEmbedder;

    #[async_trait]
    impl Embedder for OfflineEmbedder {
        async fn embed(&self, _text: &str) -> CoreResult<Vec<f32>> {
            Err(CoreError::Embedding("connection refused".to_string()))
        }

        fn model_name(&self) -> &str {
            "offline"
        }
    }

    fn hashing(buffer_size: usize) -> SemanticChunker {
        let params = SemanticParams {
            buffer_size,
            threshold: 0.75,
        };
        SemanticChunker::new(params, Arc::new(HashingEmbedder::new(512))).unwrap()
    }

    fn two_topics() -> ParsedDocument {
        ParsedDocument::new(
            "Rust ownership moves values. Rust ownership borrows values. Rust ownership drops values. \
             Bread dough needs flour. Bread dough needs yeast. Bread dough needs water.",
        )
        .with_metadata(json!({"plan_name": "planA", "parser": "TextParser"}))
    }

    #[tokio::test]
    async fn test_cuts_at_topic_shift() {
        let chunks = hashing(0).chunk(&[two_topics()]).await.unwrap();

        assert_eq!(chunks.len(), 2);
        assert!(chunks[0].content.starts_with("Rust ownership moves"));
        assert!(chunks[0].content.ends_with("drops values."));
        assert!(!chunks[0].content.contains("Bread"));
        assert!(chunks[1].content.starts_with("Bread dough needs flour."));
        assert!(!chunks[1].content.contains("Rust"));
    }

    #[tokio::test]
    async fn test_chunks_are_tagged() {
        let chunks = hashing(0).chunk(&[two_topics()]).await.unwrap();

        for (i, chunk) in chunks.iter().enumerate() {
            assert_eq!(chunk.metadata["chunker"], "semantic");
            assert_eq!(chunk.metadata["chunk_index"], i);
            assert_eq!(chunk.metadata["buffer_size"], 0);
            assert_eq!(chunk.metadata["threshold"], 0.75);
            assert_eq!(chunk.metadata["embed_model"], "hashing-512");
            assert_eq!(chunk.metadata["parser"], "TextParser");
            assert_eq!(chunk.plan_name(), Some("planA"));
        }
    }

    #[tokio::test]
    async fn test_windows_include_neighbours() {
        let embedder = Arc::new(RecordingEmbedder::default());
        let chunker = SemanticChunker::new(SemanticParams::default(), embedder.clone()).unwrap();

        let chunks = chunker
            .chunk(&[ParsedDocument::new("A one. B two.\n\nC three")])
            .await
            .unwrap();

        assert_eq!(
            *embedder.texts.lock().unwrap(),
            vec!["A one. B two.", "A one. B two. C three", "B two. C three"]
        );
        // Identical vectors leave nothing above the cutoff.
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].content, "A one. B two. C three");
    }

    #[tokio::test]
    async fn test_short_documents_skip_embedding() {
        let embedder = Arc::new(RecordingEmbedder::default());
        let chunker = SemanticChunker::new(SemanticParams::default(), embedder.clone()).unwrap();

        let chunks = chunker
            .chunk(&[ParsedDocument::new("Only one sentence."), ParsedDocument::new("  ")])
            .await
            .unwrap();

        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].content, "Only one sentence.");
        assert!(embedder.texts.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_embedding_failure_propagates() {
        let chunker = SemanticChunker::new(SemanticParams::default(), Arc::new(OfflineEmbedder)).unwrap();
        let err = chunker.chunk(&[two_topics()]).await.unwrap_err();
        assert!(matches!(err, CoreError::Embedding(_)));
    }

    #[test]
    fn test_threshold_must_be_a_fraction() {
        for threshold in [0.0, 1.5, 95.0] {
            let params = SemanticParams {
                buffer_size: 1,
                threshold,
            };
            let err = SemanticChunker::new(params, Arc::new(HashingEmbedder::new(8)))
                .err()
                .unwrap();
            assert!(matches!(err, CoreError::Chunking(_)));
        }
    }

    #[test]
    fn test_config_reports_settings() {
        let chunker = hashing(2);
        assert_eq!(chunker.strategy_name(), "semantic");
        assert_eq!(
            chunker.config(),
            json!({"buffer_size": 2, "threshold": 0.75, "embed_model": "hashing-512"})
        );
    }

    #[test]
    fn test_percentile_interpolates() {
        let values = [0.4, 0.1, 0.3, 0.2, 0.5];
        assert_eq!(percentile(&values, 0.0), 0.1);
        assert_eq!(percentile(&values, 1.0), 0.5);
        assert_eq!(percentile(&values, 0.75), 0.4);
        assert!((percentile(&[0.0, 1.0], 0.25) - 0.25).abs() < 1e-6);
    }
}
