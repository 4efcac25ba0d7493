//! Component registry.
//!
//! Maps implementation names to constructors, one table per capability
//! family. Built once at startup and handed to the orchestrator; there is no
//! process-wide instance.

use crate::builtins;
use ragline_agent::Agent;
use ragline_core::{Chunker, ComponentFamily, CoreError, CoreResult, Parser, VectorStore};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::debug;

pub type ParserCtor = Arc<dyn Fn(&Value) -> CoreResult<Box<dyn Parser>> + Send + Sync>;
pub type ChunkerCtor = Arc<dyn Fn(&Value) -> CoreResult<Box<dyn Chunker>> + Send + Sync>;
pub type StoreCtor = Arc<dyn Fn(&Value) -> CoreResult<Box<dyn VectorStore>> + Send + Sync>;
pub type AgentCtor = Arc<dyn Fn(&Value) -> CoreResult<Arc<dyn Agent>> + Send + Sync>;

/// Constructors keyed by implementation name.
#[derive(Default, Clone)]
pub struct Registry {
    parsers: BTreeMap<String, ParserCtor>,
    chunkers: BTreeMap<String, ChunkerCtor>,
    stores: BTreeMap<String, StoreCtor>,
    agents: BTreeMap<String, AgentCtor>,
}

impl Registry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry with every shipped implementation registered.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        builtins::register_all(&mut registry);
        registry
    }

    /// Register a parser constructor. Returns true if one was replaced.
    pub fn register_parser<F>(&mut self, name: impl Into<String>, ctor: F) -> bool
    where
        F: Fn(&Value) -> CoreResult<Box<dyn Parser>> + Send + Sync + 'static,
    {
        let ctor: ParserCtor = Arc::new(ctor);
        insert(&mut self.parsers, ComponentFamily::Parser, name.into(), ctor)
    }

    /// Register a chunker constructor. Returns true if one was replaced.
    pub fn register_chunker<F>(&mut self, name: impl Into<String>, ctor: F) -> bool
    where
        F: Fn(&Value) -> CoreResult<Box<dyn Chunker>> + Send + Sync + 'static,
    {
        let ctor: ChunkerCtor = Arc::new(ctor);
        insert(&mut self.chunkers, ComponentFamily::Chunker, name.into(), ctor)
    }

    /// Register a store constructor. Returns true if one was replaced.
    pub fn register_store<F>(&mut self, name: impl Into<String>, ctor: F) -> bool
    where
        F: Fn(&Value) -> CoreResult<Box<dyn VectorStore>> + Send + Sync + 'static,
    {
        let ctor: StoreCtor = Arc::new(ctor);
        insert(&mut self.stores, ComponentFamily::Store, name.into(), ctor)
    }

    /// Register an agent constructor. Returns true if one was replaced.
    pub fn register_agent<F>(&mut self, name: impl Into<String>, ctor: F) -> bool
    where
        F: Fn(&Value) -> CoreResult<Arc<dyn Agent>> + Send + Sync + 'static,
    {
        let ctor: AgentCtor = Arc::new(ctor);
        insert(&mut self.agents, ComponentFamily::Agent, name.into(), ctor)
    }

    pub fn create_parser(&self, name: &str, params: &Value) -> CoreResult<Box<dyn Parser>> {
        lookup(&self.parsers, ComponentFamily::Parser, name)?(params)
    }

    pub fn create_chunker(&self, name: &str, params: &Value) -> CoreResult<Box<dyn Chunker>> {
        lookup(&self.chunkers, ComponentFamily::Chunker, name)?(params)
    }

    pub fn create_store(&self, name: &str, params: &Value) -> CoreResult<Box<dyn VectorStore>> {
        lookup(&self.stores, ComponentFamily::Store, name)?(params)
    }

    pub fn create_agent(&self, name: &str, params: &Value) -> CoreResult<Arc<dyn Agent>> {
        lookup(&self.agents, ComponentFamily::Agent, name)?(params)
    }

    /// Check whether `name` is registered in `family`.
    pub fn contains(&self, family: ComponentFamily, name: &str) -> bool {
        match family {
            ComponentFamily::Parser => self.parsers.contains_key(name),
            ComponentFamily::Chunker => self.chunkers.contains_key(name),
            ComponentFamily::Store => self.stores.contains_key(name),
            ComponentFamily::Agent => self.agents.contains_key(name),
        }
    }

    /// Registered names in `family`, sorted.
    pub fn names(&self, family: ComponentFamily) -> Vec<String> {
        match family {
            ComponentFamily::Parser => self.parsers.keys().cloned().collect(),
            ComponentFamily::Chunker => self.chunkers.keys().cloned().collect(),
            ComponentFamily::Store => self.stores.keys().cloned().collect(),
            ComponentFamily::Agent => self.agents.keys().cloned().collect(),
        }
    }
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field("parsers", &self.names(ComponentFamily::Parser))
            .field("chunkers", &self.names(ComponentFamily::Chunker))
            .field("stores", &self.names(ComponentFamily::Store))
            .field("agents", &self.names(ComponentFamily::Agent))
            .finish()
    }
}

fn insert<C>(
    table: &mut BTreeMap<String, C>,
    family: ComponentFamily,
    name: String,
    ctor: C,
) -> bool {
    let replaced = table.insert(name.clone(), ctor).is_some();
    if replaced {
        debug!("Replaced {} constructor '{}'", family, name);
    }
    replaced
}

fn lookup<'a, C>(
    table: &'a BTreeMap<String, C>,
    family: ComponentFamily,
    name: &str,
) -> CoreResult<&'a C> {
    table.get(name).ok_or_else(|| CoreError::UnknownComponent {
        family,
        name: name.to_string(),
    })
}
