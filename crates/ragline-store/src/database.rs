//! Database connection and pool management.

use crate::error::{StoreError, StoreResult};
use crate::migrations;
use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use std::path::Path;
use tracing::info;

pub type ConnectionPool = Pool<SqliteConnectionManager>;
pub type PooledConn = PooledConnection<SqliteConnectionManager>;

/// Pooled handle to the chunk database.
#[derive(Clone)]
pub struct Database {
    pool: ConnectionPool,
}

impl Database {
    /// Open a database at the specified path, creating parent directories.
    pub fn open<P: AsRef<Path>>(path: P) -> StoreResult<Self> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| StoreError::Other(e.to_string()))?;
        }

        info!("Opening vector database at: {}", path.display());

        let manager = SqliteConnectionManager::file(path).with_init(|conn| {
            conn.execute_batch(
                "PRAGMA journal_mode = WAL;
                 PRAGMA synchronous = NORMAL;
                 PRAGMA foreign_keys = ON;
                 PRAGMA cache_size = -64000;",
            )?;
            Ok(())
        });

        Self::with_manager(manager, 8)
    }

    /// Open an in-memory database (for testing).
    pub fn open_in_memory() -> StoreResult<Self> {
        let manager = SqliteConnectionManager::memory().with_init(|conn| {
            conn.execute_batch("PRAGMA foreign_keys = ON;")?;
            Ok(())
        });
        // Each in-memory connection is its own database.
        Self::with_manager(manager, 1)
    }

    fn with_manager(manager: SqliteConnectionManager, max_size: u32) -> StoreResult<Self> {
        let pool = Pool::builder().max_size(max_size).build(manager)?;
        {
            let conn = pool.get()?;
            migrations::initialize_schema(&conn)?;
        }
        Ok(Self { pool })
    }

    pub fn conn(&self) -> StoreResult<PooledConn> {
        self.pool.get().map_err(StoreError::from)
    }

    /// Run integrity check on the database.
    pub fn integrity_check(&self) -> StoreResult<bool> {
        let conn = self.conn()?;
        let result: String = conn.query_row("PRAGMA integrity_check", [], |row| row.get(0))?;
        Ok(result == "ok")
    }
}
