//! Constructors for the shipped implementations.

use crate::registry::Registry;
use ragline_agent::{AgentRole, ToolAgent};
use ragline_config::{AppPaths, ConfigError, OllamaConfig};
use ragline_core::{decode_params, Chunker, CoreError, CoreResult, Embedder, VectorStore};
use ragline_ingest::{
    HierarchicalChunker, MarkdownParser, ParagraphChunker, PdfParser, SemanticChunker,
    SemanticParams, TextParser,
};
use ragline_ollama::{OllamaClient, OllamaEmbedder};
use ragline_store::{Database, HashingEmbedder, MemoryStore, SqliteStore};
use serde::Deserialize;
use serde_json::Value;
use std::path::PathBuf;
use std::sync::Arc;

const IN_MEMORY: &str = ":memory:";

/// Parameters shared by both stores.
#[derive(Debug, Deserialize)]
#[serde(default)]
struct StoreParams {
    collection: String,
    /// Database file for `SqliteStore`; `:memory:` for a throwaway database.
    path: Option<PathBuf>,
    embedder: EmbedderParams,
}

impl Default for StoreParams {
    fn default() -> Self {
        Self {
            collection: "documents".to_string(),
            path: None,
            embedder: EmbedderParams::default(),
        }
    }
}

/// Which embedder a store or the semantic chunker computes vectors with.
#[derive(Debug, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
enum EmbedderParams {
    Ollama(OllamaEmbedderParams),
    Hashing(HashingParams),
}

impl Default for EmbedderParams {
    fn default() -> Self {
        EmbedderParams::Ollama(OllamaEmbedderParams::default())
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct OllamaEmbedderParams {
    host: String,
    model: String,
    timeout_seconds: u64,
}

impl Default for OllamaEmbedderParams {
    fn default() -> Self {
        let ollama = OllamaConfig::default();
        Self {
            host: ollama.host,
            model: ollama.embedding_model,
            timeout_seconds: ollama.timeout_seconds,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct HashingParams {
    dimensions: usize,
}

impl Default for HashingParams {
    fn default() -> Self {
        Self { dimensions: 256 }
    }
}

impl EmbedderParams {
    fn build(self, component: &str) -> CoreResult<Arc<dyn Embedder>> {
        match self {
            EmbedderParams::Ollama(params) => {
                let config = OllamaConfig {
                    host: params.host,
                    embedding_model: params.model.clone(),
                    timeout_seconds: params.timeout_seconds,
                    ..OllamaConfig::default()
                };
                let client = OllamaClient::from_config(&config).map_err(|e| {
                    CoreError::InvalidParams {
                        component: component.to_string(),
                        message: e.to_string(),
                    }
                })?;
                Ok(Arc::new(OllamaEmbedder::new(client, params.model)))
            }
            EmbedderParams::Hashing(params) => {
                if params.dimensions == 0 {
                    return Err(CoreError::InvalidParams {
                        component: component.to_string(),
                        message: "embedder.dimensions must be positive".to_string(),
                    });
                }
                Ok(Arc::new(HashingEmbedder::new(params.dimensions)))
            }
        }
    }
}

/// `buffer_size` and `threshold` plus the embedder that scores sentence windows.
#[derive(Debug, Deserialize)]
struct SemanticChunkerParams {
    #[serde(flatten)]
    split: SemanticParams,
    #[serde(default)]
    embedder: EmbedderParams,
}

fn semantic_chunker(params: &Value) -> CoreResult<Box<dyn Chunker>> {
    let params: SemanticChunkerParams = decode_params("SemanticChunker", params)?;
    let embedder = params.embedder.build("SemanticChunker")?;
    Ok(Box::new(SemanticChunker::new(params.split, embedder)?))
}

fn sqlite_store(params: &Value) -> CoreResult<Box<dyn VectorStore>> {
    let params: StoreParams = decode_params("SqliteStore", params)?;
    let embedder = params.embedder.build("SqliteStore")?;

    let db = match &params.path {
        Some(path) if path.as_os_str() == IN_MEMORY => Database::open_in_memory()?,
        Some(path) => Database::open(path)?,
        None => {
            let paths = AppPaths::new().ok_or_else(|| CoreError::InvalidParams {
                component: "SqliteStore".to_string(),
                message: ConfigError::NoConfigDir.to_string(),
            })?;
            Database::open(paths.store_file)?
        }
    };
    Ok(Box::new(SqliteStore::new(db, params.collection, embedder)))
}

fn memory_store(params: &Value) -> CoreResult<Box<dyn VectorStore>> {
    let params: StoreParams = decode_params("MemoryStore", params)?;
    let embedder = params.embedder.build("MemoryStore")?;
    Ok(Box::new(MemoryStore::new(params.collection, embedder)))
}

pub(crate) fn register_all(registry: &mut Registry) {
    registry.register_parser("MarkdownParser", |p| Ok(Box::new(MarkdownParser::from_params(p)?)));
    registry.register_parser("TextParser", |p| Ok(Box::new(TextParser::from_params(p)?)));
    registry.register_parser("PdfParser", |p| Ok(Box::new(PdfParser::from_params(p)?)));

    registry.register_chunker("ParagraphChunker", |p| {
        Ok(Box::new(ParagraphChunker::from_params(p)?))
    });
    registry.register_chunker("HierarchicalChunker", |p| {
        Ok(Box::new(HierarchicalChunker::from_params(p)?))
    });
    registry.register_chunker("SemanticChunker", semantic_chunker);

    registry.register_store("SqliteStore", sqlite_store);
    registry.register_store("MemoryStore", memory_store);

    for role in [AgentRole::Manager, AgentRole::Assistant] {
        registry.register_agent(role.class_name(), move |p| {
            Ok(Arc::new(ToolAgent::from_params(role, p)?))
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_store_params_defaults() {
        let params: StoreParams = decode_params("MemoryStore", &Value::Null).unwrap();
        assert_eq!(params.collection, "documents");
        assert!(params.path.is_none());
        assert!(matches!(params.embedder, EmbedderParams::Ollama(_)));
    }

    #[test]
    fn test_embedder_kind_is_required_tag() {
        let params: StoreParams =
            decode_params("MemoryStore", &json!({"embedder": {"kind": "hashing", "dimensions": 32}}))
                .unwrap();
        match params.embedder {
            EmbedderParams::Hashing(h) => assert_eq!(h.dimensions, 32),
            other => panic!("unexpected embedder {other:?}"),
        }

        let err = decode_params::<StoreParams>("MemoryStore", &json!({"embedder": {"kind": "openai"}}))
            .unwrap_err();
        assert!(matches!(err, CoreError::InvalidParams { .. }));
    }

    #[test]
    fn test_zero_dimensions_rejected() {
        let err = memory_store(&json!({"embedder": {"kind": "hashing", "dimensions": 0}}))
            .err()
            .unwrap();
        assert!(err.to_string().contains("dimensions"));
    }

    #[test]
    fn test_semantic_params_flatten() {
        let params: SemanticChunkerParams = decode_params(
            "SemanticChunker",
            &json!({"buffer_size": 2, "embedder": {"kind": "hashing", "dimensions": 32}}),
        )
        .unwrap();
        assert_eq!(params.split.buffer_size, 2);
        assert_eq!(params.split.threshold, 0.75);
        assert!(matches!(params.embedder, EmbedderParams::Hashing(_)));

        let params: SemanticChunkerParams = decode_params("SemanticChunker", &Value::Null).unwrap();
        assert_eq!(params.split, SemanticParams::default());
        assert!(matches!(params.embedder, EmbedderParams::Ollama(_)));
    }

    #[tokio::test]
    async fn test_semantic_chunker_with_hashing_embedder() {
        let chunker = semantic_chunker(&json!({
            "buffer_size": 0,
            "threshold": 0.75,
            "embedder": {"kind": "hashing", "dimensions": 512},
        }))
        .unwrap();
        assert_eq!(chunker.strategy_name(), "semantic");
        assert_eq!(chunker.config()["embed_model"], "hashing-512");

        let document = ragline_core::ParsedDocument::new(
            "Rust ownership moves values. Rust ownership borrows values. Rust ownership drops values. \
             Bread dough needs flour. Bread dough needs yeast. Bread dough needs water.",
        );
        let chunks = chunker.chunk(&[document]).await.unwrap();
        assert_eq!(chunks.len(), 2);
        assert!(chunks[1].content.starts_with("Bread"));

        let err = semantic_chunker(&json!({"threshold": 95})).err().unwrap();
        assert!(matches!(err, CoreError::Chunking(_)));
    }

    #[tokio::test]
    async fn test_sqlite_store_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("store.db");
        let store = sqlite_store(&json!({
            "collection": "notes",
            "path": path,
            "embedder": {"kind": "hashing", "dimensions": 16},
        }))
        .unwrap();

        let info = store.collection_info().await.unwrap();
        assert_eq!(info["name"], "notes");
        assert_eq!(info["count"], 0);
        assert!(path.exists());
    }
}
