//! The two agent roles and their parameters.

use ragline_config::OllamaConfig;
use ragline_core::{CoreError, CoreResult};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Which part an agent plays in a query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AgentRole {
    /// Plan-aware retrieval plus delegation to the assistant.
    Manager,
    /// Plain retrieval.
    Assistant,
}

impl AgentRole {
    /// The implementation name registered for this role.
    pub fn class_name(&self) -> &'static str {
        match self {
            AgentRole::Manager => "ManagerAgent",
            AgentRole::Assistant => "AssistantAgent",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AgentRole::Manager => "manager",
            AgentRole::Assistant => "assistant",
        }
    }

    fn default_prompt(&self, params: &AgentParams) -> String {
        match self {
            AgentRole::Manager => {
                let mut prompt = String::from(
                    "You are a research manager answering questions from a document knowledge base.\n\
                     Use get_context to retrieve passages from the relevant plan and ask_assistant \
                     to hand off focused sub-questions. Base your answer on the retrieved context \
                     and say so when it does not contain the answer.",
                );
                if !params.plans.is_empty() {
                    prompt.push_str("\n\nAvailable plans: ");
                    prompt.push_str(&params.plans.join(", "));
                }
                prompt
            }
            AgentRole::Assistant => {
                let specialization = params.specialization.as_deref().unwrap_or("general");
                format!(
                    "You are an assistant specialized in {} questions.\n\
                     Use get_context to retrieve passages before answering. Be concise and \
                     do not make up information that is not in the context.",
                    specialization
                )
            }
        }
    }
}

impl std::fmt::Display for AgentRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Parameter bag shared by both roles.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentParams {
    /// `host`, `model` and `timeout_seconds` of the chat model.
    #[serde(flatten)]
    pub ollama: OllamaConfig,
    /// Reasoning calls allowed per query.
    pub max_iterations: usize,
    /// Hits returned by `get_context`.
    pub top_k: usize,
    /// Closed set of plan names the manager may search. Required for the manager.
    pub plans: Vec<String>,
    pub system_prompt: Option<String>,
    pub system_prompt_file: Option<PathBuf>,
    pub specialization: Option<String>,
    pub temperature: Option<f32>,
}

impl Default for AgentParams {
    fn default() -> Self {
        Self {
            ollama: OllamaConfig::default(),
            max_iterations: 8,
            top_k: 5,
            plans: Vec::new(),
            system_prompt: None,
            system_prompt_file: None,
            specialization: None,
            temperature: None,
        }
    }
}

impl AgentParams {
    /// Inline prompt, else the prompt file, else the role default.
    pub fn system_prompt_for(&self, role: AgentRole) -> CoreResult<String> {
        if let Some(prompt) = &self.system_prompt {
            return Ok(prompt.clone());
        }
        if let Some(path) = &self.system_prompt_file {
            return std::fs::read_to_string(path)
                .map(|s| s.trim().to_string())
                .map_err(|e| CoreError::InvalidParams {
                    component: role.class_name().to_string(),
                    message: format!("cannot read system_prompt_file {:?}: {}", path, e),
                });
        }
        Ok(role.default_prompt(self))
    }
}
