//! Retrieval and delegation tools.

use crate::agent::Agent;
use crate::error::{AgentError, AgentResult};
use crate::tool::{string_arg, Tool};
use async_trait::async_trait;
use ragline_core::{SearchFilter, ToolDescriptor, VectorStore};
use ragline_ollama::format_context;
use serde_json::json;
use std::sync::Arc;
use tracing::debug;

pub const CONTEXT_TOOL: &str = "get_context";
pub const DELEGATE_TOOL: &str = "ask_assistant";

/// `get_context`: top-k search over the store.
///
/// With a plan set the tool takes a required `plan_name` argument and only
/// searches that plan. The plan set is closed: other names are rejected.
pub struct ContextTool {
    store: Arc<dyn VectorStore>,
    top_k: usize,
    plans: Option<Vec<String>>,
}

impl ContextTool {
    /// Unfiltered search.
    pub fn new(store: Arc<dyn VectorStore>, top_k: usize) -> Self {
        Self {
            store,
            top_k,
            plans: None,
        }
    }

    /// Search restricted to one plan per call.
    pub fn with_plans(store: Arc<dyn VectorStore>, top_k: usize, plans: Vec<String>) -> Self {
        Self {
            store,
            top_k,
            plans: Some(plans),
        }
    }

    pub fn store(&self) -> &Arc<dyn VectorStore> {
        &self.store
    }

    fn plan_filter(&self, arguments: &serde_json::Value) -> AgentResult<Option<SearchFilter>> {
        let Some(plans) = &self.plans else {
            return Ok(None);
        };
        let plan = string_arg(CONTEXT_TOOL, arguments, "plan_name")?;
        if !plans.contains(&plan) {
            return Err(AgentError::ToolFailed {
                tool: CONTEXT_TOOL.to_string(),
                message: format!(
                    "unknown plan '{}'. Available plans: {}",
                    plan,
                    plans.join(", ")
                ),
            });
        }
        Ok(Some(SearchFilter::plan(plan)))
    }
}

#[async_trait]
impl Tool for ContextTool {
    fn descriptor(&self) -> ToolDescriptor {
        let question = json!({
            "type": "string",
            "description": "The question to find relevant passages for",
        });
        let parameters = match &self.plans {
            None => json!({
                "type": "object",
                "properties": { "question": question },
                "required": ["question"],
            }),
            Some(plans) => {
                let plan = json!({
                    "type": "string",
                    "description": "The plan (document collection) to search",
                    "enum": plans,
                });
                json!({
                    "type": "object",
                    "properties": { "question": question, "plan_name": plan },
                    "required": ["question", "plan_name"],
                })
            }
        };
        ToolDescriptor::new(
            CONTEXT_TOOL,
            "Retrieve passages from the knowledge base that are relevant to a question",
            parameters,
        )
    }

    async fn call(&self, arguments: serde_json::Value) -> AgentResult<String> {
        let question = string_arg(CONTEXT_TOOL, &arguments, "question")?;
        let filter = self.plan_filter(&arguments)?;

        let hits = self
            .store
            .search(&question, self.top_k, filter.as_ref())
            .await
            .map_err(|e| AgentError::ToolFailed {
                tool: CONTEXT_TOOL.to_string(),
                message: e.to_string(),
            })?;
        debug!("get_context returned {} hits for {:?}", hits.len(), question);

        // No hits formats to an empty string.
        Ok(format_context(&hits))
    }
}

/// `ask_assistant`: run another agent's full loop and return its answer.
pub struct DelegateTool {
    assistant: Arc<dyn Agent>,
}

impl DelegateTool {
    pub fn new(assistant: Arc<dyn Agent>) -> Self {
        Self { assistant }
    }
}

#[async_trait]
impl Tool for DelegateTool {
    fn descriptor(&self) -> ToolDescriptor {
        ToolDescriptor::new(
            DELEGATE_TOOL,
            "Ask the assistant agent a focused sub-question and get its answer",
            json!({
                "type": "object",
                "properties": {
                    "question": {
                        "type": "string",
                        "description": "A self-contained question for the assistant",
                    },
                },
                "required": ["question"],
            }),
        )
    }

    async fn call(&self, arguments: serde_json::Value) -> AgentResult<String> {
        let question = string_arg(DELEGATE_TOOL, &arguments, "question")?;
        debug!("Delegating to {}: {:?}", self.assistant.name(), question);
        self.assistant
            .process_query(&question, None)
            .await
            .map_err(|e| AgentError::ToolFailed {
                tool: DELEGATE_TOOL.to_string(),
                message: e.to_string(),
            })
    }
}
