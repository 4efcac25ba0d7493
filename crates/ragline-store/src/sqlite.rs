//! Persistent vector store on SQLite.

use crate::database::Database;
use crate::error::{StoreError, StoreResult};
use async_trait::async_trait;
use ragline_core::{
    Chunk, ChunkId, CoreResult, Embedder, SearchFilter, SearchHit, VectorStore,
};
use std::sync::Arc;
use tracing::debug;

/// A named collection in a SQLite database, embedding with the given embedder.
///
/// Database calls run on the blocking thread pool.
pub struct SqliteStore {
    db: Database,
    collection: String,
    embedder: Arc<dyn Embedder>,
}

impl SqliteStore {
    pub fn new(db: Database, collection: impl Into<String>, embedder: Arc<dyn Embedder>) -> Self {
        Self {
            db,
            collection: collection.into(),
            embedder,
        }
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    async fn blocking<T, F>(&self, op: F) -> CoreResult<T>
    where
        T: Send + 'static,
        F: FnOnce(Database, String) -> StoreResult<T> + Send + 'static,
    {
        let db = self.db.clone();
        let collection = self.collection.clone();
        let result = tokio::task::spawn_blocking(move || op(db, collection))
            .await
            .map_err(StoreError::from)?;
        Ok(result?)
    }
}

#[async_trait]
impl VectorStore for SqliteStore {
    async fn add(&self, chunks: Vec<Chunk>) -> CoreResult<Vec<ChunkId>> {
        if chunks.is_empty() {
            return Ok(Vec::new());
        }

        let mut entries = Vec::with_capacity(chunks.len());
        for chunk in chunks {
            let vector = self.embedder.embed(&chunk.content).await?;
            entries.push((chunk, vector));
        }
        let ids: Vec<ChunkId> = entries.iter().map(|(c, _)| c.id.clone()).collect();
        let model = self.embedder.model_name().to_string();

        self.blocking(move |db, collection| db.insert_chunks(&collection, &entries, &model))
            .await?;
        debug!("Stored {} chunks in collection {}", ids.len(), self.collection);
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
        let plan = filter.and_then(|f| f.plan_name.clone());

        self.blocking(move |db, collection| {
            db.vector_search(&collection, &vector, top_k, plan.as_deref())
        })
        .await
    }

    async fn delete(&self, ids: &[ChunkId]) -> CoreResult<bool> {
        let ids = ids.to_vec();
        let removed = self
            .blocking(move |db, collection| db.delete_chunks(&collection, &ids))
            .await?;
        Ok(removed > 0)
    }

    async fn clear_collection(&self) -> CoreResult<bool> {
        let removed = self
            .blocking(|db, collection| db.clear_collection(&collection))
            .await?;
        debug!("Cleared {} chunks from collection {}", removed, self.collection);
        Ok(true)
    }

    async fn collection_info(&self) -> CoreResult<serde_json::Value> {
        let stats = self
            .blocking(|db, collection| db.embedding_stats(&collection))
            .await?;
        Ok(serde_json::json!({
            "name": self.collection,
            "store": self.name(),
            "count": stats.count,
            "dimensions": stats.dimensions,
            "embedding_model": self.embedder.model_name(),
        }))
    }

    fn name(&self) -> &str {
        "SqliteStore"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::HashingEmbedder;
    use serde_json::json;

    fn store(collection: &str, db: Database) -> SqliteStore {
        SqliteStore::new(db, collection, Arc::new(HashingEmbedder::new(128)))
    }

    fn chunk(text: &str, plan: &str) -> Chunk {
        Chunk::new(text, json!({"plan_name": plan}))
    }

    #[tokio::test]
    async fn test_add_and_search() {
        let store = store("docs", Database::open_in_memory().unwrap());
        let ids = store
            .add(vec![
                chunk("tokio runtime spawns async tasks", "planA"),
                chunk("sourdough bread needs a starter", "planB"),
            ])
            .await
            .unwrap();
        assert_eq!(ids.len(), 2);

        let hits = store.search("async tasks in tokio", 5, None).await.unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].chunk_id, ids[0]);
        assert!(hits[0].score > hits[1].score);
    }

    #[tokio::test]
    async fn test_plan_filter() {
        let store = store("docs", Database::open_in_memory().unwrap());
        store
            .add(vec![
                chunk("alpha notes about rust", "planA"),
                chunk("beta notes about rust", "planB"),
            ])
            .await
            .unwrap();

        let hits = store
            .search("rust notes", 5, Some(&SearchFilter::plan("planB")))
            .await
            .unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].metadata["plan_name"], "planB");
    }

    #[tokio::test]
    async fn test_collections_are_isolated() {
        let db = Database::open_in_memory().unwrap();
        let first = store("first", db.clone());
        let second = store("second", db);

        first.add(vec![chunk("only in first", "p")]).await.unwrap();
        assert!(second.search("first", 5, None).await.unwrap().is_empty());

        let info = first.collection_info().await.unwrap();
        assert_eq!(info["count"], 1);
        assert_eq!(info["dimensions"], 128);
        assert_eq!(info["embedding_model"], "hashing-128");
    }

    #[tokio::test]
    async fn test_delete_and_clear() {
        let store = store("docs", Database::open_in_memory().unwrap());
        let ids = store
            .add(vec![chunk("one", "p"), chunk("two", "p")])
            .await
            .unwrap();

        assert!(store.delete(&ids[..1]).await.unwrap());
        assert!(!store.delete(&ids[..1]).await.unwrap());
        assert_eq!(store.search("two", 5, None).await.unwrap().len(), 1);

        assert!(store.clear_collection().await.unwrap());
        assert!(store.search("two", 5, None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_persists_across_reopen() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("store.db");
        {
            let store = store("docs", Database::open(&path).unwrap());
            store.add(vec![chunk("durable text", "p")]).await.unwrap();
        }
        let store = store("docs", Database::open(&path).unwrap());
        let hits = store.search("durable", 1, None).await.unwrap();
        assert_eq!(hits[0].content, "durable text");
    }
}
