//! Configuration structures and loading.
//!
//! The document has one sub-config per swappable family. Each names a
//! `default` implementation and the `available` ones, keyed by a short alias,
//! with the registered class name and its parameter bag:
//!
//! ```json
//! "chunkers": {
//!   "default": "paragraph",
//!   "available": {
//!     "paragraph": { "class": "ParagraphChunker", "config": { "chunk_size": 1000 } }
//!   }
//! }
//! ```

use crate::error::{ConfigError, ConfigResult};
use crate::paths::AppPaths;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::BTreeMap;
use std::io::Write;
use std::path::Path;
use tracing::debug;

/// Main configuration structure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    pub system: SystemConfig,
    pub parsers: FamilyConfig,
    pub chunkers: FamilyConfig,
    pub vector_stores: FamilyConfig,
    pub agents: AgentsConfig,
}

/// System metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemConfig {
    pub name: String,
    pub version: String,
    #[serde(default)]
    pub debug: bool,
    /// Deadline applied to each ingest and query call.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_seconds: Option<u64>,
}

/// An implementation class plus the parameters to build it with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentDescriptor {
    pub class: String,
    #[serde(default, skip_serializing_if = "serde_json::Value::is_null")]
    pub config: serde_json::Value,
}

impl ComponentDescriptor {
    pub fn new(class: impl Into<String>, config: serde_json::Value) -> Self {
        Self {
            class: class.into(),
            config,
        }
    }
}

/// The selection for one capability family.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FamilyConfig {
    pub default: String,
    pub available: BTreeMap<String, ComponentDescriptor>,
}

impl FamilyConfig {
    pub fn contains(&self, name: &str) -> bool {
        self.available.contains_key(name)
    }

    pub fn descriptor(&self, name: &str) -> Option<&ComponentDescriptor> {
        self.available.get(name)
    }

    /// Make `name` the default, refusing names that are not available.
    pub fn select(&mut self, name: &str) -> ConfigResult<()> {
        if !self.contains(name) {
            return Err(ConfigError::Invalid(format!(
                "'{}' is not one of the available entries ({})",
                name,
                self.names().join(", ")
            )));
        }
        self.default = name.to_string();
        Ok(())
    }

    pub fn names(&self) -> Vec<&str> {
        self.available.keys().map(|k| k.as_str()).collect()
    }

    fn validate(&self, section: &str) -> ConfigResult<()> {
        if self.available.is_empty() {
            return Err(ConfigError::Invalid(format!(
                "{}.available must not be empty",
                section
            )));
        }
        if !self.contains(&self.default) {
            return Err(ConfigError::Invalid(format!(
                "{}.default '{}' is not a key of {}.available",
                section, self.default, section
            )));
        }
        for (name, descriptor) in &self.available {
            if descriptor.class.trim().is_empty() {
                return Err(ConfigError::Invalid(format!(
                    "{}.available.{}.class must not be empty",
                    section, name
                )));
            }
        }
        Ok(())
    }
}

/// The two agent roles.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentsConfig {
    pub manager: ComponentDescriptor,
    pub assistant: ComponentDescriptor,
}

/// Serialization format, chosen by file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Json,
    Toml,
}

impl ConfigFormat {
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("toml") => ConfigFormat::Toml,
            _ => ConfigFormat::Json,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::bootstrap()
    }
}

impl Config {
    /// Load configuration from the default location.
    pub fn load() -> ConfigResult<Self> {
        let paths = AppPaths::new().ok_or(ConfigError::NoConfigDir)?;
        Self::load_from(&paths.config_file)
    }

    /// Load configuration from a specific path.
    pub fn load_from(path: &Path) -> ConfigResult<Self> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.to_path_buf()));
        }

        let contents = std::fs::read_to_string(path)?;
        let config = Self::parse_str(&contents, ConfigFormat::from_path(path))?;
        debug!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Parse and validate configuration text.
    pub fn parse_str(contents: &str, format: ConfigFormat) -> ConfigResult<Self> {
        let config: Config = match format {
            ConfigFormat::Json => serde_json::from_str(contents)?,
            ConfigFormat::Toml => toml::from_str(contents)?,
        };
        config.validate()?;
        Ok(config)
    }

    /// Serialize in the given format.
    pub fn render(&self, format: ConfigFormat) -> ConfigResult<String> {
        match format {
            ConfigFormat::Json => serde_json::to_string_pretty(self)
                .map_err(|e| ConfigError::SerializeError(e.to_string())),
            ConfigFormat::Toml => Ok(toml::to_string_pretty(self)?),
        }
    }

    /// Save configuration to the default location.
    pub fn save(&self) -> ConfigResult<()> {
        let paths = AppPaths::new().ok_or(ConfigError::NoConfigDir)?;
        self.save_to(&paths.config_file)
    }

    /// Save configuration to a specific path, replacing it atomically.
    pub fn save_to(&self, path: &Path) -> ConfigResult<()> {
        self.validate()?;
        let contents = self.render(ConfigFormat::from_path(path))?;

        let parent = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        std::fs::create_dir_all(parent)?;

        let mut temp = tempfile::NamedTempFile::new_in(parent)?;
        temp.write_all(contents.as_bytes())?;
        temp.persist(path).map_err(|e| ConfigError::ReadError(e.error))?;
        Ok(())
    }

    /// Write the bootstrap configuration to `path`.
    pub fn create_default_file(path: &Path) -> ConfigResult<Self> {
        let config = Self::bootstrap();
        config.save_to(path)?;
        Ok(config)
    }

    /// Load `path`, writing the bootstrap configuration first if it is missing.
    pub fn load_or_create(path: &Path) -> ConfigResult<Self> {
        match Self::load_from(path) {
            Err(ConfigError::NotFound(_)) => Self::create_default_file(path),
            other => other,
        }
    }

    /// Check the cross-field invariants serde cannot express.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.system.name.trim().is_empty() {
            return Err(ConfigError::Invalid("system.name must not be empty".into()));
        }
        self.parsers.validate("parsers")?;
        self.chunkers.validate("chunkers")?;
        self.vector_stores.validate("vector_stores")?;
        if self.agents.manager.class.trim().is_empty()
            || self.agents.assistant.class.trim().is_empty()
        {
            return Err(ConfigError::Invalid("agent class must not be empty".into()));
        }
        Ok(())
    }

    /// A reasonable configuration for a first run against a local Ollama.
    pub fn bootstrap() -> Self {
        let ollama = OllamaConfig::default();

        let parsers = FamilyConfig {
            default: "markdown".to_string(),
            available: BTreeMap::from([
                (
                    "markdown".to_string(),
                    ComponentDescriptor::new("MarkdownParser", json!({ "enable_cache": true })),
                ),
                (
                    "text".to_string(),
                    ComponentDescriptor::new("TextParser", json!({ "enable_cache": false })),
                ),
                (
                    "pdf".to_string(),
                    ComponentDescriptor::new("PdfParser", json!({ "enable_cache": true })),
                ),
            ]),
        };

        let chunkers = FamilyConfig {
            default: "paragraph".to_string(),
            available: BTreeMap::from([
                (
                    "paragraph".to_string(),
                    ComponentDescriptor::new(
                        "ParagraphChunker",
                        json!({ "chunk_size": 1000, "chunk_overlap": 100, "min_chunk_size": 100 }),
                    ),
                ),
                (
                    "hierarchical".to_string(),
                    ComponentDescriptor::new(
                        "HierarchicalChunker",
                        json!({ "chunk_sizes": [1536, 512, 128] }),
                    ),
                ),
                (
                    "semantic".to_string(),
                    ComponentDescriptor::new(
                        "SemanticChunker",
                        json!({
                            "buffer_size": 1,
                            "threshold": 0.75,
                            "embedder": {
                                "kind": "ollama",
                                "host": ollama.host,
                                "model": ollama.embedding_model,
                            },
                        }),
                    ),
                ),
            ]),
        };

        let vector_stores = FamilyConfig {
            default: "sqlite".to_string(),
            available: BTreeMap::from([
                (
                    "sqlite".to_string(),
                    ComponentDescriptor::new(
                        "SqliteStore",
                        json!({
                            "collection": "documents",
                            "embedder": {
                                "kind": "ollama",
                                "host": ollama.host,
                                "model": ollama.embedding_model,
                            },
                        }),
                    ),
                ),
                (
                    "memory".to_string(),
                    ComponentDescriptor::new(
                        "MemoryStore",
                        json!({ "embedder": { "kind": "hashing", "dimensions": 256 } }),
                    ),
                ),
            ]),
        };

        let agents = AgentsConfig {
            manager: ComponentDescriptor::new(
                "ManagerAgent",
                json!({
                    "host": ollama.host,
                    "model": ollama.model,
                    "max_iterations": 8,
                    "top_k": 5,
                    "plans": ["documents"],
                }),
            ),
            assistant: ComponentDescriptor::new(
                "AssistantAgent",
                json!({
                    "host": ollama.host,
                    "model": ollama.model,
                    "max_iterations": 8,
                    "top_k": 5,
                    "specialization": "general",
                }),
            ),
        };

        Self {
            system: SystemConfig {
                name: "ragline".to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
                debug: false,
                timeout_seconds: None,
            },
            parsers,
            chunkers,
            vector_stores,
            agents,
        }
    }
}

/// Ollama connection settings, embedded in agent and embedder parameter bags.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OllamaConfig {
    pub host: String,
    pub model: String,
    pub embedding_model: String,
    pub timeout_seconds: u64,
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            host: "http://localhost:11434".to_string(),
            model: "gpt-oss:20b".to_string(),
            embedding_model: "nomic-embed-text".to_string(),
            timeout_seconds: 120,
        }
    }
}
