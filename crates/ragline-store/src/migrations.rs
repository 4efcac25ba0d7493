//! Schema management keyed on SQLite's `user_version`.

use crate::error::StoreResult;
use rusqlite::Connection;
use tracing::info;

pub const SCHEMA_VERSION: i32 = 1;

pub fn initialize_schema(conn: &Connection) -> StoreResult<()> {
    let current_version: i32 = conn.pragma_query_value(None, "user_version", |row| row.get(0))?;

    if current_version == 0 {
        info!("Creating vector store schema...");
        create_initial_schema(conn)?;
        conn.pragma_update(None, "user_version", SCHEMA_VERSION)?;
    } else if current_version > SCHEMA_VERSION {
        return Err(crate::StoreError::Migration(format!(
            "database schema version {} is newer than supported version {}",
            current_version, SCHEMA_VERSION
        )));
    }

    Ok(())
}

fn create_initial_schema(conn: &Connection) -> StoreResult<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS chunks (
            id TEXT PRIMARY KEY,
            collection TEXT NOT NULL,
            plan_name TEXT,
            content TEXT NOT NULL,
            metadata TEXT NOT NULL DEFAULT '{}',
            created_at TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_chunks_collection ON chunks(collection);
        CREATE INDEX IF NOT EXISTS idx_chunks_plan ON chunks(collection, plan_name);

        -- Vectors stored as little-endian f32 BLOBs
        CREATE TABLE IF NOT EXISTS embeddings (
            chunk_id TEXT PRIMARY KEY REFERENCES chunks(id) ON DELETE CASCADE,
            vector BLOB NOT NULL,
            model TEXT NOT NULL,
            dimensions INTEGER NOT NULL
        );
        "#,
    )?;
    Ok(())
}
