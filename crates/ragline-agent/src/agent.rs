//! The agent contract and the tool-calling loop behind both roles.

use crate::error::{AgentError, AgentResult};
use crate::roles::{AgentParams, AgentRole};
use crate::tool::{Tool, ToolSet};
use crate::tools::{ContextTool, DelegateTool};
use async_trait::async_trait;
use ragline_core::{
    decode_params, ChatMessage, CoreError, CoreResult, ReasoningModel, ReasoningStep, ToolCall, VectorStore,
};
use ragline_ollama::context::truncate_content;
use ragline_ollama::{ChatOptions, OllamaChat, OllamaClient};
use std::sync::Arc;
use tracing::{debug, info, warn};

#[async_trait]
pub trait Agent: Send + Sync {
    /// The implementation name this agent was registered under.
    fn name(&self) -> &str;

    /// Answer a query, optionally with pre-fetched context text.
    async fn process_query(&self, query: &str, context: Option<&str>) -> AgentResult<String>;

    /// Bind a tool. Returns true if a tool with the same name was replaced.
    fn register_tool(&self, tool: Arc<dyn Tool>) -> bool;

    /// Names of the bound tools, sorted.
    fn tool_names(&self) -> Vec<String>;

    fn as_retrieval(&self) -> Option<&dyn RetrievalAgent> {
        None
    }

    fn as_delegating(&self) -> Option<&dyn DelegatingAgent> {
        None
    }
}

/// An agent whose retrieval tool is backed by a store.
pub trait RetrievalAgent: Send + Sync {
    /// (Re)bind `get_context` to `store`, dropping any previous binding.
    fn attach_store(&self, store: Arc<dyn VectorStore>);
}

/// An agent that can hand sub-questions to another agent.
pub trait DelegatingAgent: Send + Sync {
    /// (Re)bind `ask_assistant` to `assistant`.
    fn attach_assistant(&self, assistant: Arc<dyn Agent>);
}

/// A reasoning model in a loop with a set of tools.
pub struct ToolAgent {
    role: AgentRole,
    system_prompt: String,
    model: Arc<dyn ReasoningModel>,
    tools: ToolSet,
    max_iterations: usize,
    top_k: usize,
    plans: Vec<String>,
}

impl ToolAgent {
    /// A manager must name at least one plan; its `get_context` only searches those.
    pub fn new(role: AgentRole, model: Arc<dyn ReasoningModel>, params: &AgentParams) -> CoreResult<Self> {
        if role == AgentRole::Manager && params.plans.is_empty() {
            return Err(CoreError::InvalidParams {
                component: role.class_name().to_string(),
                message: "plans must list at least one plan name".to_string(),
            });
        }
        Ok(Self {
            role,
            system_prompt: params.system_prompt_for(role)?,
            model,
            tools: ToolSet::new(),
            max_iterations: params.max_iterations.max(1),
            top_k: params.top_k,
            plans: params.plans.clone(),
        })
    }

    /// Build an agent talking to Ollama from a parameter bag.
    pub fn from_params(role: AgentRole, params: &serde_json::Value) -> CoreResult<Self> {
        let params: AgentParams = decode_params(role.class_name(), params)?;
        let client =
            OllamaClient::from_config(&params.ollama).map_err(|e| CoreError::InvalidParams {
                component: role.class_name().to_string(),
                message: e.to_string(),
            })?;
        let mut chat = OllamaChat::new(client, &params.ollama.model);
        if let Some(temperature) = params.temperature {
            chat = chat.with_options(ChatOptions {
                temperature: Some(temperature),
                ..ChatOptions::default()
            });
        }
        Self::new(role, Arc::new(chat), &params)
    }

    pub fn role(&self) -> AgentRole {
        self.role
    }

    pub fn system_prompt(&self) -> &str {
        &self.system_prompt
    }

    pub fn max_iterations(&self) -> usize {
        self.max_iterations
    }

    fn compose(&self, query: &str, context: Option<&str>) -> Vec<ChatMessage> {
        let mut user = format!("Query: {}", query);
        if let Some(context) = context.filter(|c| !c.trim().is_empty()) {
            user.push_str("\n\nContext:\n");
            user.push_str(context);
        }
        vec![ChatMessage::system(&self.system_prompt), ChatMessage::user(user)]
    }

    async fn run_tool(&self, call: &ToolCall) -> String {
        let Some(tool) = self.tools.get(&call.name) else {
            let err = AgentError::ToolNotFound(call.name.clone());
            warn!("{}: {}", self.name(), err);
            return format!("Error: {}", err);
        };
        match tool.call(call.arguments.clone()).await {
            Ok(output) => {
                debug!("{} -> {}", call.name, truncate_content(&output, 120));
                output
            }
            Err(err) => {
                warn!("{}: {}", self.name(), err);
                format!("Error: {}", err)
            }
        }
    }
}

#[async_trait]
impl Agent for ToolAgent {
    fn name(&self) -> &str {
        self.role.class_name()
    }

    async fn process_query(&self, query: &str, context: Option<&str>) -> AgentResult<String> {
        info!("{} processing query: {}", self.name(), query);
        let mut conversation = self.compose(query, context);

        for iteration in 1..=self.max_iterations {
            let step = self
                .model
                .respond(&conversation, &self.tools.descriptors())
                .await
                .map_err(|e| AgentError::Reasoning(e.to_string()))?;

            let (text, calls) = match step {
                ReasoningStep::Final(answer) => {
                    debug!("{} answered after {} iteration(s)", self.name(), iteration);
                    return Ok(answer);
                }
                ReasoningStep::ToolCalls { text, calls } => (text, calls),
            };

            debug!(
                "{} iteration {}: {} tool call(s)",
                self.name(),
                iteration,
                calls.len()
            );
            conversation.push(ChatMessage::assistant(text, calls.clone()));
            for call in &calls {
                let output = self.run_tool(call).await;
                conversation.push(ChatMessage::tool_result(&call.name, output));
            }
        }

        Err(AgentError::ToolLoopExceeded {
            limit: self.max_iterations,
        })
    }

    fn register_tool(&self, tool: Arc<dyn Tool>) -> bool {
        self.tools.register(tool)
    }

    fn tool_names(&self) -> Vec<String> {
        self.tools.names()
    }

    fn as_retrieval(&self) -> Option<&dyn RetrievalAgent> {
        Some(self)
    }

    fn as_delegating(&self) -> Option<&dyn DelegatingAgent> {
        match self.role {
            AgentRole::Manager => Some(self),
            AgentRole::Assistant => None,
        }
    }
}

impl RetrievalAgent for ToolAgent {
    fn attach_store(&self, store: Arc<dyn VectorStore>) {
        let tool = match self.role {
            AgentRole::Manager => ContextTool::with_plans(store, self.top_k, self.plans.clone()),
            AgentRole::Assistant => ContextTool::new(store, self.top_k),
        };
        self.tools.register(Arc::new(tool));
    }
}

impl DelegatingAgent for ToolAgent {
    fn attach_assistant(&self, assistant: Arc<dyn Agent>) {
        self.tools.register(Arc::new(DelegateTool::new(assistant)));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ragline_core::{Chunk, ToolDescriptor};
    use ragline_store::{HashingEmbedder, MemoryStore};
    use serde_json::json;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Replays scripted steps and records every conversation it is shown.
    struct ScriptedModel {
        steps: Mutex<VecDeque<ReasoningStep>>,
        seen: Mutex<Vec<(Vec<ChatMessage>, Vec<String>)>>,
    }

    impl ScriptedModel {
        fn new(steps: Vec<ReasoningStep>) -> Arc<Self> {
            Arc::new(Self {
                steps: Mutex::new(steps.into()),
                seen: Mutex::new(Vec::new()),
            })
        }

        fn calls(&self) -> usize {
            self.seen.lock().unwrap().len()
        }

        fn conversation(&self, n: usize) -> Vec<ChatMessage> {
            self.seen.lock().unwrap()[n].0.clone()
        }

        fn tools_offered(&self, n: usize) -> Vec<String> {
            self.seen.lock().unwrap()[n].1.clone()
        }
    }

    #[async_trait]
    impl ReasoningModel for ScriptedModel {
        async fn respond(
            &self,
            conversation: &[ChatMessage],
            tools: &[ToolDescriptor],
        ) -> CoreResult<ReasoningStep> {
            self.seen.lock().unwrap().push((
                conversation.to_vec(),
                tools.iter().map(|t| t.name.clone()).collect(),
            ));
            Ok(self
                .steps
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| ReasoningStep::Final("done".to_string())))
        }

        fn model_name(&self) -> &str {
            "scripted"
        }
    }

    /// Asks for the same tool forever.
    struct LoopingModel;

    #[async_trait]
    impl ReasoningModel for LoopingModel {
        async fn respond(&self, _: &[ChatMessage], _: &[ToolDescriptor]) -> CoreResult<ReasoningStep> {
            Ok(ReasoningStep::tool_calls(vec![ToolCall::new(
                "get_context",
                json!({"question": "again"}),
            )]))
        }

        fn model_name(&self) -> &str {
            "looping"
        }
    }

    struct FailingModel;

    #[async_trait]
    impl ReasoningModel for FailingModel {
        async fn respond(&self, _: &[ChatMessage], _: &[ToolDescriptor]) -> CoreResult<ReasoningStep> {
            Err(CoreError::Reasoning("model offline".to_string()))
        }

        fn model_name(&self) -> &str {
            "failing"
        }
    }

    fn call(name: &str, args: serde_json::Value) -> ReasoningStep {
        ReasoningStep::tool_calls(vec![ToolCall::new(name, args)])
    }

    fn agent(role: AgentRole, model: Arc<dyn ReasoningModel>, params: AgentParams) -> Arc<ToolAgent> {
        Arc::new(ToolAgent::new(role, model, &params).unwrap())
    }

    fn manager_params() -> AgentParams {
        AgentParams {
            plans: vec!["planA".to_string(), "planB".to_string()],
            ..AgentParams::default()
        }
    }

    async fn planned_store() -> Arc<dyn VectorStore> {
        let store = MemoryStore::new("test", Arc::new(HashingEmbedder::new(64)));
        store
            .add(vec![
                Chunk::new("planA covers rust ownership", json!({"plan_name": "planA"})),
                Chunk::new("planB covers rust lifetimes", json!({"plan_name": "planB"})),
            ])
            .await
            .unwrap();
        Arc::new(store)
    }

    #[tokio::test]
    async fn test_final_answer_without_tools() {
        let model = ScriptedModel::new(vec![ReasoningStep::Final("42".to_string())]);
        let assistant = agent(AgentRole::Assistant, model.clone(), AgentParams::default());

        let answer = assistant.process_query("meaning?", None).await.unwrap();

        assert_eq!(answer, "42");
        let conversation = model.conversation(0);
        assert_eq!(conversation.len(), 2);
        assert_eq!(conversation[1].content, "Query: meaning?");
    }

    #[tokio::test]
    async fn test_context_appended_only_when_present() {
        let model = ScriptedModel::new(vec![]);
        let assistant = agent(AgentRole::Assistant, model.clone(), AgentParams::default());

        assistant.process_query("q", Some("fact")).await.unwrap();
        assistant.process_query("q", Some("  ")).await.unwrap();

        assert_eq!(model.conversation(0)[1].content, "Query: q\n\nContext:\nfact");
        assert_eq!(model.conversation(1)[1].content, "Query: q");
    }

    #[tokio::test]
    async fn test_unknown_tool_is_reported_as_text() {
        let model = ScriptedModel::new(vec![call("web_search", json!({}))]);
        let assistant = agent(AgentRole::Assistant, model.clone(), AgentParams::default());

        let answer = assistant.process_query("q", None).await.unwrap();

        assert_eq!(answer, "done");
        let conversation = model.conversation(1);
        let last = conversation.last().unwrap();
        assert_eq!(last.tool_name.as_deref(), Some("web_search"));
        assert_eq!(last.content, "Error: tool 'web_search' not found");
    }

    #[tokio::test]
    async fn test_loop_stops_at_cap() {
        let params = AgentParams {
            max_iterations: 3,
            ..AgentParams::default()
        };
        let assistant = agent(AgentRole::Assistant, Arc::new(LoopingModel), params);
        assistant.attach_store(planned_store().await);

        let err = assistant.process_query("q", None).await.unwrap_err();
        assert!(matches!(err, AgentError::ToolLoopExceeded { limit: 3 }));
    }

    #[tokio::test]
    async fn test_reasoning_failure_propagates() {
        let assistant = agent(AgentRole::Assistant, Arc::new(FailingModel), AgentParams::default());
        let err = assistant.process_query("q", None).await.unwrap_err();
        assert!(matches!(err, AgentError::Reasoning(_)));
    }

    #[tokio::test]
    async fn test_assistant_retrieves_context() {
        let model = ScriptedModel::new(vec![call("get_context", json!({"question": "rust ownership"}))]);
        let assistant = agent(AgentRole::Assistant, model.clone(), AgentParams::default());
        assistant.attach_store(planned_store().await);

        assistant.process_query("q", None).await.unwrap();

        assert_eq!(model.tools_offered(0), vec!["get_context"]);
        let result = model.conversation(1).last().unwrap().content.clone();
        assert!(result.starts_with("Context 1 (score "));
        assert!(result.contains("planA covers rust ownership"));
        assert!(result.contains("planB covers rust lifetimes"));
    }

    #[tokio::test]
    async fn test_empty_store_yields_empty_context() {
        let model = ScriptedModel::new(vec![call("get_context", json!({"question": "anything"}))]);
        let assistant = agent(AgentRole::Assistant, model.clone(), AgentParams::default());
        let store = MemoryStore::new("empty", Arc::new(HashingEmbedder::new(64)));
        assistant.attach_store(Arc::new(store));

        assistant.process_query("q", None).await.unwrap();

        let result = model.conversation(1).last().unwrap().clone();
        assert_eq!(result.tool_name.as_deref(), Some("get_context"));
        assert_eq!(result.content, "");
    }

    #[test]
    fn test_manager_requires_plans() {
        let err = ToolAgent::new(
            AgentRole::Manager,
            ScriptedModel::new(vec![]),
            &AgentParams::default(),
        )
        .err()
        .unwrap();
        match err {
            CoreError::InvalidParams { component, message } => {
                assert_eq!(component, "ManagerAgent");
                assert!(message.contains("plans"));
            }
            other => panic!("unexpected error: {other:?}"),
        }

        // The assistant searches without a plan filter.
        assert!(ToolAgent::new(
            AgentRole::Assistant,
            ScriptedModel::new(vec![]),
            &AgentParams::default()
        )
        .is_ok());
    }

    #[tokio::test]
    async fn test_manager_plan_isolation() {
        let model = ScriptedModel::new(vec![
            call("get_context", json!({"question": "rust", "plan_name": "planA"})),
            call("get_context", json!({"question": "rust", "plan_name": "planZ"})),
        ]);
        let manager = agent(AgentRole::Manager, model.clone(), manager_params());
        manager.attach_store(planned_store().await);

        manager.process_query("q", None).await.unwrap();

        let isolated = model.conversation(1).last().unwrap().content.clone();
        assert!(isolated.contains("planA covers rust ownership"));
        assert!(!isolated.contains("planB"));

        let rejected = model.conversation(2).last().unwrap().content.clone();
        assert!(rejected.starts_with("Error: "));
        assert!(rejected.contains("unknown plan 'planZ'"));
    }

    #[tokio::test]
    async fn test_manager_schema_lists_plans() {
        let manager = agent(AgentRole::Manager, ScriptedModel::new(vec![]), manager_params());
        manager.attach_store(planned_store().await);

        let descriptor = manager.tools.get("get_context").unwrap().descriptor();
        assert_eq!(
            descriptor.parameters["properties"]["plan_name"]["enum"],
            json!(["planA", "planB"])
        );
        assert_eq!(descriptor.parameters["required"], json!(["question", "plan_name"]));
    }

    #[tokio::test]
    async fn test_manager_delegates_to_assistant() {
        let assistant_model = ScriptedModel::new(vec![ReasoningStep::Final("assistant says hi".into())]);
        let assistant = agent(AgentRole::Assistant, assistant_model.clone(), AgentParams::default());

        let manager_model = ScriptedModel::new(vec![
            call("ask_assistant", json!({"question": "sub-question"})),
            ReasoningStep::Final("manager final".into()),
        ]);
        let manager = agent(AgentRole::Manager, manager_model.clone(), manager_params());
        manager
            .as_delegating()
            .unwrap()
            .attach_assistant(assistant.clone());

        let answer = manager.process_query("top-level", None).await.unwrap();

        assert_eq!(answer, "manager final");
        assert_eq!(assistant_model.calls(), 1);
        assert_eq!(assistant_model.conversation(0)[1].content, "Query: sub-question");
        assert_eq!(
            manager_model.conversation(1).last().unwrap().content,
            "assistant says hi"
        );
    }

    #[test]
    fn test_assistant_cannot_delegate() {
        let assistant = agent(AgentRole::Assistant, ScriptedModel::new(vec![]), AgentParams::default());
        assert!(assistant.as_delegating().is_none());
        assert!(assistant.as_retrieval().is_some());
        assert_eq!(assistant.name(), "AssistantAgent");
    }

    #[tokio::test]
    async fn test_reattaching_store_replaces_binding() {
        let assistant = agent(AgentRole::Assistant, ScriptedModel::new(vec![]), AgentParams::default());
        let first = planned_store().await;
        assistant.attach_store(first.clone());
        assert_eq!(Arc::strong_count(&first), 2);

        assistant.attach_store(planned_store().await);
        assert_eq!(Arc::strong_count(&first), 1);
        assert_eq!(assistant.tool_names(), vec!["get_context"]);
    }

    #[test]
    fn test_from_params_builds_ollama_agent() {
        let agent = ToolAgent::from_params(
            AgentRole::Manager,
            &json!({
                "model": "llama3.1",
                "max_iterations": 2,
                "plans": ["planA"],
                "system_prompt": "Be terse.",
            }),
        )
        .unwrap();
        assert_eq!(agent.name(), "ManagerAgent");
        assert_eq!(agent.max_iterations(), 2);
        assert_eq!(agent.system_prompt(), "Be terse.");
    }
}
