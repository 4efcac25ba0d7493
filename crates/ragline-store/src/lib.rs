//! Ragline Store - Vector stores backed by SQLite or memory.

mod database;
mod embedder;
mod error;
mod memory;
mod migrations;
mod operations;
mod sqlite;

pub use database::Database;
pub use embedder::HashingEmbedder;
pub use error::{StoreError, StoreResult};
pub use memory::MemoryStore;
pub use operations::vectors::cosine_similarity;
pub use sqlite::SqliteStore;
