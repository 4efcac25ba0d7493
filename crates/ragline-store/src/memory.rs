//! Volatile vector store.

use crate::operations::vectors::{cosine_similarity, rank};
use async_trait::async_trait;
use ragline_core::{
    Chunk, ChunkId, CoreResult, Embedder, SearchFilter, SearchHit, VectorStore,
};
use std::collections::HashSet;
use std::sync::{Arc, RwLock};

struct Entry {
    chunk: Chunk,
    vector: Vec<f32>,
}

/// Keeps chunks and vectors in process memory. Contents are lost on drop.
pub struct MemoryStore {
    collection: String,
    embedder: Arc<dyn Embedder>,
    entries: RwLock<Vec<Entry>>,
}

impl MemoryStore {
    pub fn new(collection: impl Into<String>, embedder: Arc<dyn Embedder>) -> Self {
        Self {
            collection: collection.into(),
            embedder,
            entries: RwLock::new(Vec::new()),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl VectorStore for MemoryStore {
    async fn add(&self, chunks: Vec<Chunk>) -> CoreResult<Vec<ChunkId>> {
        let mut staged = Vec::with_capacity(chunks.len());
        for chunk in chunks {
            let vector = self.embedder.embed(&chunk.content).await?;
            staged.push(Entry { chunk, vector });
        }
        let ids = staged.iter().map(|e| e.chunk.id.clone()).collect();

        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        entries.extend(staged);
        Ok(ids)
    }

    async fn search(
        &self,
        query: &str,
        top_k: usize,
        filter: Option<&SearchFilter>,
    ) -> CoreResult<Vec<SearchHit>> {
        if top_k == 0 {
            return Ok(Vec::new());
        }
        let vector = self.embedder.embed(query).await?;

        let entries = self.entries.read().unwrap_or_else(|e| e.into_inner());
        let mut hits: Vec<SearchHit> = entries
            .iter()
            .filter(|e| filter.map_or(true, |f| f.matches(&e.chunk.metadata)))
            .map(|e| SearchHit {
                chunk_id: e.chunk.id.clone(),
                content: e.chunk.content.clone(),
                score: cosine_similarity(&vector, &e.vector),
                metadata: e.chunk.metadata.clone(),
            })
            .collect();
        drop(entries);

        rank(&mut hits, top_k);
        Ok(hits)
    }

    async fn delete(&self, ids: &[ChunkId]) -> CoreResult<bool> {
        let ids: HashSet<&str> = ids.iter().map(String::as_str).collect();
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        let before = entries.len();
        entries.retain(|e| !ids.contains(e.chunk.id.as_str()));
        Ok(entries.len() < before)
    }

    async fn clear_collection(&self) -> CoreResult<bool> {
        self.entries
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .clear();
        Ok(true)
    }

    async fn collection_info(&self) -> CoreResult<serde_json::Value> {
        let entries = self.entries.read().unwrap_or_else(|e| e.into_inner());
        Ok(serde_json::json!({
            "name": self.collection,
            "store": "MemoryStore",
            "count": entries.len(),
            "dimensions": entries.first().map(|e| e.vector.len()),
            "embedding_model": self.embedder.model_name(),
        }))
    }

    fn name(&self) -> &str {
        "MemoryStore"
    }
}
