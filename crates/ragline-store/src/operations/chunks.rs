//! Chunk persistence.

use super::vectors::encode_vector;
use crate::database::Database;
use crate::error::{StoreError, StoreResult};
use chrono::{DateTime, Utc};
use ragline_core::{Chunk, ChunkId};
use rusqlite::{params, types::Type, Row};

pub(crate) fn chunk_from_row(row: &Row<'_>, offset: usize) -> rusqlite::Result<Chunk> {
    let created_at: String = row.get(offset + 3)?;
    let created_at = DateTime::parse_from_rfc3339(&created_at)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(offset + 3, Type::Text, Box::new(e)))?;
    Ok(Chunk {
        id: row.get(offset)?,
        content: row.get(offset + 1)?,
        metadata: row.get(offset + 2)?,
        created_at,
    })
}

impl Database {
    /// Insert chunks and their vectors in one transaction.
    pub fn insert_chunks(
        &self,
        collection: &str,
        entries: &[(Chunk, Vec<f32>)],
        model: &str,
    ) -> StoreResult<()> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        {
            let mut chunk_stmt = tx.prepare(
                r#"
                INSERT INTO chunks (id, collection, plan_name, content, metadata, created_at)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                "#,
            )?;
            let mut vector_stmt = tx.prepare(
                r#"
                INSERT INTO embeddings (chunk_id, vector, model, dimensions)
                VALUES (?1, ?2, ?3, ?4)
                "#,
            )?;

            for (chunk, vector) in entries {
                chunk_stmt.execute(params![
                    chunk.id,
                    collection,
                    chunk.plan_name(),
                    chunk.content,
                    chunk.metadata,
                    chunk.created_at.to_rfc3339(),
                ])?;
                vector_stmt.execute(params![
                    chunk.id,
                    encode_vector(vector),
                    model,
                    vector.len() as i64,
                ])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    pub fn get_chunk(&self, collection: &str, id: &str) -> StoreResult<Chunk> {
        let conn = self.conn()?;
        conn.query_row(
            "SELECT id, content, metadata, created_at FROM chunks WHERE collection = ?1 AND id = ?2",
            params![collection, id],
            |row| chunk_from_row(row, 0),
        )
        .map_err(|e| match e {
            rusqlite::Error::QueryReturnedNoRows => {
                StoreError::NotFound(format!("Chunk not found: {}", id))
            }
            _ => StoreError::from(e),
        })
    }

    /// Delete the given chunks, returning how many existed.
    pub fn delete_chunks(&self, collection: &str, ids: &[ChunkId]) -> StoreResult<usize> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        let mut removed = 0;
        {
            let mut stmt = tx.prepare("DELETE FROM chunks WHERE collection = ?1 AND id = ?2")?;
            for id in ids {
                removed += stmt.execute(params![collection, id])?;
            }
        }
        tx.commit()?;
        Ok(removed)
    }

    pub fn clear_collection(&self, collection: &str) -> StoreResult<usize> {
        let conn = self.conn()?;
        let removed = conn.execute("DELETE FROM chunks WHERE collection = ?1", params![collection])?;
        Ok(removed)
    }

    pub fn count_chunks(&self, collection: &str) -> StoreResult<i64> {
        let conn = self.conn()?;
        let count = conn.query_row(
            "SELECT COUNT(*) FROM chunks WHERE collection = ?1",
            params![collection],
            |row| row.get(0),
        )?;
        Ok(count)
    }
}
