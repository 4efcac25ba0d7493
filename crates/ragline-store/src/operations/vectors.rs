//! Brute-force vector search over stored embeddings.

use super::chunks::chunk_from_row;
use crate::database::Database;
use crate::error::StoreResult;
use ragline_core::SearchHit;
use rusqlite::params;
use std::cmp::Ordering;

/// Calculate cosine similarity between two vectors.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let (dot, norm_a, norm_b) = a
        .iter()
        .zip(b)
        .fold((0.0f32, 0.0f32, 0.0f32), |(dot, na, nb), (x, y)| {
            (dot + x * y, na + x * x, nb + y * y)
        });

    let denominator = norm_a.sqrt() * norm_b.sqrt();
    if denominator == 0.0 {
        return 0.0;
    }
    dot / denominator
}

pub(crate) fn encode_vector(vector: &[f32]) -> Vec<u8> {
    vector.iter().flat_map(|f| f.to_le_bytes()).collect()
}

pub(crate) fn decode_vector(bytes: &[u8], dimensions: usize) -> Vec<f32> {
    bytes
        .chunks_exact(4)
        .take(dimensions)
        .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
        .collect()
}

/// Sort hits by descending score and keep the best `limit`.
pub(crate) fn rank(hits: &mut Vec<SearchHit>, limit: usize) {
    hits.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
    hits.truncate(limit);
}

/// Embedding summary for one collection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EmbeddingStats {
    pub count: i64,
    pub dimensions: Option<i64>,
    pub model: Option<String>,
}

impl Database {
    /// Score every chunk in the collection against `query`.
    ///
    /// Efficient enough for collections of up to ~100K chunks.
    pub fn vector_search(
        &self,
        collection: &str,
        query: &[f32],
        limit: usize,
        plan_name: Option<&str>,
    ) -> StoreResult<Vec<SearchHit>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT c.id, c.content, c.metadata, c.created_at, e.vector, e.dimensions
            FROM chunks c
            JOIN embeddings e ON e.chunk_id = c.id
            WHERE c.collection = ?1
              AND (?2 IS NULL OR c.plan_name = ?2)
            "#,
        )?;

        let rows = stmt.query_map(params![collection, plan_name], |row| {
            let chunk = chunk_from_row(row, 0)?;
            let bytes: Vec<u8> = row.get(4)?;
            let dimensions: i64 = row.get(5)?;
            Ok((chunk, bytes, dimensions))
        })?;

        let mut hits = Vec::new();
        for row in rows {
            let (chunk, bytes, dimensions) = row?;
            let vector = decode_vector(&bytes, dimensions.max(0) as usize);
            hits.push(SearchHit {
                chunk_id: chunk.id,
                content: chunk.content,
                score: cosine_similarity(query, &vector),
                metadata: chunk.metadata,
            });
        }

        rank(&mut hits, limit);
        Ok(hits)
    }

    pub fn embedding_stats(&self, collection: &str) -> StoreResult<EmbeddingStats> {
        let conn = self.conn()?;
        let (count, dimensions, model) = conn.query_row(
            r#"
            SELECT COUNT(*), MAX(e.dimensions), MAX(e.model)
            FROM embeddings e
            JOIN chunks c ON c.id = e.chunk_id
            WHERE c.collection = ?1
            "#,
            params![collection],
            |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, Option<i64>>(1)?,
                    row.get::<_, Option<String>>(2)?,
                ))
            },
        )?;
        Ok(EmbeddingStats {
            count,
            dimensions,
            model,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ragline_core::Chunk;
    use serde_json::json;

    #[test]
    fn test_cosine_similarity() {
        assert!((cosine_similarity(&[1.0, 0.0, 0.0], &[1.0, 0.0, 0.0]) - 1.0).abs() < 0.0001);
        assert!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]).abs() < 0.0001);
        assert!((cosine_similarity(&[1.0, 0.0], &[-1.0, 0.0]) + 1.0).abs() < 0.0001);
        assert_eq!(cosine_similarity(&[], &[]), 0.0);
        assert_eq!(cosine_similarity(&[1.0, 0.0], &[1.0]), 0.0);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]), 0.0);
    }

    #[test]
    fn test_vector_round_trip_bytes() {
        let v = vec![0.5, -1.25, 3.0];
        assert_eq!(decode_vector(&encode_vector(&v), 3), v);
    }

    #[test]
    fn test_vector_search_orders_and_filters() {
        let db = Database::open_in_memory().unwrap();
        let rust = Chunk::new("Rust programming", json!({"plan_name": "planA"}));
        let python = Chunk::new("Python programming", json!({"plan_name": "planA"}));
        let other = Chunk::new("Other plan", json!({"plan_name": "planB"}));
        db.insert_chunks(
            "docs",
            &[
                (rust.clone(), vec![1.0, 0.0, 0.0, 0.0]),
                (python.clone(), vec![0.0, 1.0, 0.0, 0.0]),
                (other.clone(), vec![0.95, 0.05, 0.0, 0.0]),
            ],
            "test-model",
        )
        .unwrap();

        let query = [0.9, 0.1, 0.0, 0.0];
        let hits = db.vector_search("docs", &query, 10, None).unwrap();
        assert_eq!(hits.len(), 3);
        assert!(hits.windows(2).all(|w| w[0].score >= w[1].score));

        let hits = db.vector_search("docs", &query, 10, Some("planA")).unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].chunk_id, rust.id);
        assert!(hits.iter().all(|h| h.metadata["plan_name"] == "planA"));

        let hits = db.vector_search("docs", &query, 1, None).unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].chunk_id, other.id);
    }

    #[test]
    fn test_embedding_stats() {
        let db = Database::open_in_memory().unwrap();
        assert_eq!(db.embedding_stats("docs").unwrap().count, 0);

        db.insert_chunks(
            "docs",
            &[(Chunk::new("a", json!({})), vec![1.0, 2.0])],
            "test-model",
        )
        .unwrap();
        let stats = db.embedding_stats("docs").unwrap();
        assert_eq!(stats.count, 1);
        assert_eq!(stats.dimensions, Some(2));
        assert_eq!(stats.model.as_deref(), Some("test-model"));
    }
}
