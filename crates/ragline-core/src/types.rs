//! Core domain types for Ragline.

use crate::error::{CoreError, CoreResult};
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use uuid::Uuid;

/// Unique identifier for chunks.
pub type ChunkId = String;

/// Metadata key carrying the logical collection (plan) tag.
pub const PLAN_NAME_KEY: &str = "plan_name";

/// Generate a new unique ID.
pub fn new_id() -> String {
    Uuid::new_v4().to_string()
}

/// The capability families that can be swapped by configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ComponentFamily {
    Parser,
    Chunker,
    Store,
    Agent,
}

impl ComponentFamily {
    pub fn as_str(&self) -> &'static str {
        match self {
            ComponentFamily::Parser => "parser",
            ComponentFamily::Chunker => "chunker",
            ComponentFamily::Store => "store",
            ComponentFamily::Agent => "agent",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "parser" | "parsers" => Some(ComponentFamily::Parser),
            "chunker" | "chunkers" => Some(ComponentFamily::Chunker),
            "store" | "vector_store" | "vector_stores" => Some(ComponentFamily::Store),
            "agent" | "agents" => Some(ComponentFamily::Agent),
            _ => None,
        }
    }
}

impl std::fmt::Display for ComponentFamily {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A raw document to ingest and the collection it belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceRef {
    pub path: PathBuf,
    /// Logical collection/plan tag propagated into every chunk.
    pub name: String,
}

impl SourceRef {
    pub fn new(path: impl Into<PathBuf>, name: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            name: name.into(),
        }
    }
}

impl std::fmt::Display for SourceRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} [{}]", self.path.display(), self.name)
    }
}

/// Text extracted from a source by a parser.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParsedDocument {
    /// The main text content.
    pub content: String,
    /// Metadata, always including the plan tag.
    pub metadata: serde_json::Value,
}

impl ParsedDocument {
    /// Create a new parsed document.
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            metadata: serde_json::json!({}),
        }
    }

    /// Merge the given keys into the metadata.
    pub fn with_metadata(mut self, metadata: serde_json::Value) -> Self {
        merge_metadata(&mut self.metadata, &metadata);
        self
    }

    /// The plan tag, if the parser recorded one.
    pub fn plan_name(&self) -> Option<&str> {
        self.metadata.get(PLAN_NAME_KEY).and_then(|v| v.as_str())
    }
}

/// A derived unit of a parsed document, handed to the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    pub id: ChunkId,
    pub content: String,
    /// Document metadata plus strategy-specific keys.
    pub metadata: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

impl Chunk {
    pub fn new(content: impl Into<String>, metadata: serde_json::Value) -> Self {
        Self {
            id: new_id(),
            content: content.into(),
            metadata,
            created_at: Utc::now(),
        }
    }

    pub fn plan_name(&self) -> Option<&str> {
        self.metadata.get(PLAN_NAME_KEY).and_then(|v| v.as_str())
    }
}

/// A ranked content fragment returned by a store search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    pub chunk_id: ChunkId,
    pub content: String,
    pub score: f32,
    pub metadata: serde_json::Value,
}

/// Restricts a search to one collection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchFilter {
    pub plan_name: Option<String>,
}

impl SearchFilter {
    pub fn plan(name: impl Into<String>) -> Self {
        Self {
            plan_name: Some(name.into()),
        }
    }

    /// Check whether a chunk's metadata satisfies the filter.
    pub fn matches(&self, metadata: &serde_json::Value) -> bool {
        match &self.plan_name {
            Some(plan) => metadata.get(PLAN_NAME_KEY).and_then(|v| v.as_str()) == Some(plan),
            None => true,
        }
    }
}

/// Copy every key of `extra` into `target`, overwriting existing keys.
pub fn merge_metadata(target: &mut serde_json::Value, extra: &serde_json::Value) {
    if !target.is_object() {
        *target = serde_json::json!({});
    }
    if let (Some(target), Some(extra)) = (target.as_object_mut(), extra.as_object()) {
        for (key, value) in extra {
            target.insert(key.clone(), value.clone());
        }
    }
}

/// Decode a component's parameter bag into its typed parameters.
///
/// A `null` bag is treated as an empty object so components with all-default
/// parameters can be declared without a `config` key.
pub fn decode_params<T: DeserializeOwned>(component: &str, bag: &serde_json::Value) -> CoreResult<T> {
    let bag = if bag.is_null() {
        serde_json::json!({})
    } else {
        bag.clone()
    };
    serde_json::from_value(bag).map_err(|e| CoreError::InvalidParams {
        component: component.to_string(),
        message: e.to_string(),
    })
}
