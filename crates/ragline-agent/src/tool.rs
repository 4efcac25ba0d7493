//! Tools an agent can offer to its reasoning model.

use crate::error::{AgentError, AgentResult};
use async_trait::async_trait;
use ragline_core::ToolDescriptor;
use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};

#[async_trait]
pub trait Tool: Send + Sync {
    /// Name, description and JSON Schema of the arguments.
    fn descriptor(&self) -> ToolDescriptor;

    async fn call(&self, arguments: serde_json::Value) -> AgentResult<String>;
}

/// Name-keyed tool bindings. Registering an existing name replaces it.
#[derive(Default)]
pub struct ToolSet {
    tools: RwLock<BTreeMap<String, Arc<dyn Tool>>>,
}

impl ToolSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind a tool under its descriptor name. Returns true if a binding was replaced.
    pub fn register(&self, tool: Arc<dyn Tool>) -> bool {
        let name = tool.descriptor().name;
        self.tools
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(name, tool)
            .is_some()
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(name)
            .cloned()
    }

    /// Descriptors ordered by tool name.
    pub fn descriptors(&self) -> Vec<ToolDescriptor> {
        self.tools
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .values()
            .map(|t| t.descriptor())
            .collect()
    }

    pub fn names(&self) -> Vec<String> {
        self.tools
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .keys()
            .cloned()
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.read().unwrap_or_else(|e| e.into_inner()).is_empty()
    }
}

/// Read a required string argument.
pub(crate) fn string_arg(tool: &str, arguments: &serde_json::Value, key: &str) -> AgentResult<String> {
    arguments
        .get(key)
        .and_then(|v| v.as_str())
        .map(|s| s.to_string())
        .ok_or_else(|| AgentError::ToolFailed {
            tool: tool.to_string(),
            message: format!("missing string argument '{}'", key),
        })
}
