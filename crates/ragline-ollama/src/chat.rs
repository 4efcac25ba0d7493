//! Tool-calling chat as a reasoning collaborator.

use crate::client::OllamaClient;
use crate::types::{
    ChatOptions, ChatRequest, ChatResponse, FunctionSpec, ToolSpec, WireFunctionCall,
    WireMessage, WireToolCall,
};
use async_trait::async_trait;
use ragline_core::{
    ChatMessage, CoreError, CoreResult, ReasoningModel, ReasoningStep, Role, ToolCall,
    ToolDescriptor,
};
use tracing::debug;

/// Drives an Ollama chat model through `/api/chat` with tool definitions.
pub struct OllamaChat {
    client: OllamaClient,
    model: String,
    options: Option<ChatOptions>,
}

impl OllamaChat {
    pub fn new(client: OllamaClient, model: impl Into<String>) -> Self {
        Self {
            client,
            model: model.into(),
            options: None,
        }
    }

    pub fn with_options(mut self, options: ChatOptions) -> Self {
        self.options = Some(options);
        self
    }

    /// Build the request body for one turn.
    pub fn request(&self, conversation: &[ChatMessage], tools: &[ToolDescriptor]) -> ChatRequest {
        ChatRequest {
            model: self.model.clone(),
            messages: conversation.iter().map(to_wire).collect(),
            tools: tools
                .iter()
                .map(|t| ToolSpec {
                    kind: "function",
                    function: FunctionSpec {
                        name: t.name.clone(),
                        description: t.description.clone(),
                        parameters: t.parameters.clone(),
                    },
                })
                .collect(),
            stream: false,
            options: self.options.clone(),
        }
    }
}

fn to_wire(message: &ChatMessage) -> WireMessage {
    let role = match message.role {
        Role::System => "system",
        Role::User => "user",
        Role::Assistant => "assistant",
        Role::Tool => "tool",
    };
    WireMessage {
        role: role.to_string(),
        content: message.content.clone(),
        tool_calls: message
            .tool_calls
            .iter()
            .map(|call| WireToolCall {
                function: WireFunctionCall {
                    name: call.name.clone(),
                    arguments: call.arguments.clone(),
                },
            })
            .collect(),
        tool_name: message.tool_name.clone(),
    }
}

/// Interpret a chat response as the next step of the loop.
pub(crate) fn to_step(response: ChatResponse) -> ReasoningStep {
    let message = response.message;
    if message.tool_calls.is_empty() {
        return ReasoningStep::Final(message.content);
    }

    let calls = message
        .tool_calls
        .into_iter()
        .map(|call| {
            let arguments = match call.function.arguments {
                serde_json::Value::String(raw) => {
                    serde_json::from_str(&raw).unwrap_or(serde_json::Value::String(raw))
                }
                serde_json::Value::Null => serde_json::json!({}),
                other => other,
            };
            ToolCall::new(call.function.name, arguments)
        })
        .collect();

    ReasoningStep::ToolCalls {
        text: message.content,
        calls,
    }
}

#[async_trait]
impl ReasoningModel for OllamaChat {
    async fn respond(
        &self,
        conversation: &[ChatMessage],
        tools: &[ToolDescriptor],
    ) -> CoreResult<ReasoningStep> {
        let response = self
            .client
            .chat(self.request(conversation, tools))
            .await
            .map_err(|e| CoreError::Reasoning(e.to_string()))?;
        let step = to_step(response);
        if let ReasoningStep::ToolCalls { calls, .. } = &step {
            debug!("Model {} requested {} tool call(s)", self.model, calls.len());
        }
        Ok(step)
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}
