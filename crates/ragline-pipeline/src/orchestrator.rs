//! Pipeline orchestrator.
//!
//! Owns one live parser, chunker, store and the two agents. Ingestion runs
//! parse, chunk and store in sequence. Queries go to one agent, which does
//! its own retrieval through tools bound to the live store.

use crate::error::{PipelineError, PipelineResult};
use crate::factory::Factory;
use crate::registry::Registry;
use ragline_agent::{Agent, AgentRole};
use ragline_config::Config;
use ragline_core::{ChunkId, Chunker, ComponentFamily, Parser, SourceRef, VectorStore};
use serde::Serialize;
use std::collections::BTreeMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, info_span, warn, Instrument};

/// Live components built from one configuration.
struct Components {
    parser: Box<dyn Parser>,
    chunker: Box<dyn Chunker>,
    store: Arc<dyn VectorStore>,
    manager: Arc<dyn Agent>,
    assistant: Arc<dyn Agent>,
}

impl Components {
    fn build(config: &Config, registry: &Registry) -> PipelineResult<Self> {
        let factory = Factory::new(registry);
        let parser = factory.parser(&config.parsers, None)?;
        let chunker = factory.chunker(&config.chunkers, None)?;
        let store = factory.store(&config.vector_stores, None)?;
        let manager = factory.create_agent(&config.agents, AgentRole::Manager)?;
        let assistant = factory.create_agent(&config.agents, AgentRole::Assistant)?;

        attach_store(&[&manager, &assistant], &store);
        match manager.as_delegating() {
            Some(delegating) => delegating.attach_assistant(assistant.clone()),
            None => warn!("{} cannot delegate; ask_assistant not bound", manager.name()),
        }

        Ok(Self {
            parser,
            chunker,
            store,
            manager,
            assistant,
        })
    }
}

/// Bind each agent's retrieval tool to `store`, replacing earlier bindings.
fn attach_store(agents: &[&Arc<dyn Agent>], store: &Arc<dyn VectorStore>) {
    for agent in agents {
        match agent.as_retrieval() {
            Some(retrieval) => retrieval.attach_store(store.clone()),
            None => warn!("{} has no retrieval tool; store not bound", agent.name()),
        }
    }
}

/// A declared configuration entry.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeclaredComponent {
    pub name: String,
    pub class: String,
}

/// What the configuration says is active.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeclaredComponents {
    pub parser: DeclaredComponent,
    pub chunker: DeclaredComponent,
    pub vector_store: DeclaredComponent,
    pub manager: String,
    pub assistant: String,
}

/// The `available` entry live in each family. Starts at the declared defaults
/// and moves with every switch; the configuration itself is never edited.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Selection {
    pub parser: String,
    pub chunker: String,
    pub vector_store: String,
}

impl Selection {
    fn from_config(config: &Config) -> Self {
        Self {
            parser: config.parsers.default.clone(),
            chunker: config.chunkers.default.clone(),
            vector_store: config.vector_stores.default.clone(),
        }
    }
}

/// What the live components report about themselves.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LiveComponents {
    pub selection: Selection,
    pub parser: String,
    pub supported_formats: Vec<String>,
    pub chunker: String,
    pub chunker_config: serde_json::Value,
    pub store: String,
    pub manager: String,
    pub manager_tools: Vec<String>,
    pub assistant: String,
    pub assistant_tools: Vec<String>,
}

/// Snapshot returned by [`Orchestrator::system_info`].
#[derive(Debug, Clone, Serialize)]
pub struct SystemInfo {
    pub name: String,
    pub version: String,
    pub declared: DeclaredComponents,
    pub live: LiveComponents,
    /// Registered implementation names per family.
    pub registered: BTreeMap<String, Vec<String>>,
    pub collection: serde_json::Value,
}

impl SystemInfo {
    /// Families whose live selection differs from the declared default, or
    /// whose live implementation does not report the declared class.
    ///
    /// Chunkers report a strategy rather than a class, so only their
    /// selection is compared.
    pub fn drift(&self) -> Vec<ComponentFamily> {
        let declared = &self.declared;
        let live = &self.live;
        let mut drifted = Vec::new();
        if declared.parser.name != live.selection.parser || declared.parser.class != live.parser {
            drifted.push(ComponentFamily::Parser);
        }
        if declared.chunker.name != live.selection.chunker {
            drifted.push(ComponentFamily::Chunker);
        }
        if declared.vector_store.name != live.selection.vector_store
            || declared.vector_store.class != live.store
        {
            drifted.push(ComponentFamily::Store);
        }
        if declared.manager != live.manager || declared.assistant != live.assistant {
            drifted.push(ComponentFamily::Agent);
        }
        drifted
    }
}

/// Drives ingestion and queries over the configured components.
pub struct Orchestrator {
    config: Config,
    registry: Registry,
    selection: Selection,
    parser: Box<dyn Parser>,
    chunker: Box<dyn Chunker>,
    store: Arc<dyn VectorStore>,
    manager: Arc<dyn Agent>,
    assistant: Arc<dyn Agent>,
}

impl Orchestrator {
    /// Build every component the configuration selects and wire the agents.
    pub fn new(config: Config, registry: Registry) -> PipelineResult<Self> {
        config.validate()?;
        let components = Components::build(&config, &registry)?;
        info!(
            "Pipeline ready: parser={} chunker={} store={}",
            components.parser.name(),
            components.chunker.strategy_name(),
            components.store.name()
        );
        Ok(Self {
            selection: Selection::from_config(&config),
            config,
            registry,
            parser: components.parser,
            chunker: components.chunker,
            store: components.store,
            manager: components.manager,
            assistant: components.assistant,
        })
    }

    /// The configuration as loaded. Switches leave it untouched.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// The `available` entries currently live.
    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn parser(&self) -> &dyn Parser {
        self.parser.as_ref()
    }

    pub fn chunker(&self) -> &dyn Chunker {
        self.chunker.as_ref()
    }

    pub fn store(&self) -> &Arc<dyn VectorStore> {
        &self.store
    }

    pub fn manager(&self) -> &Arc<dyn Agent> {
        &self.manager
    }

    pub fn assistant(&self) -> &Arc<dyn Agent> {
        &self.assistant
    }

    /// Parse, chunk and store one source. Returns the stored chunk IDs.
    ///
    /// Nothing reaches the store unless parsing and chunking both succeed.
    pub async fn ingest(&self, source: &SourceRef) -> PipelineResult<Vec<ChunkId>> {
        let span = info_span!("ingest", source = %source);
        match self
            .with_deadline("ingest", self.ingest_steps(source))
            .instrument(span)
            .await
        {
            Ok(result) => result,
            Err(timeout) => Err(ingestion_error(source, timeout)),
        }
    }

    async fn ingest_steps(&self, source: &SourceRef) -> PipelineResult<Vec<ChunkId>> {
        let documents = self
            .parser
            .parse(source)
            .map_err(|e| ingestion_error(source, e))?;
        debug!("Parsed {} document(s) with {}", documents.len(), self.parser.name());

        let chunks = self
            .chunker
            .chunk(&documents)
            .await
            .map_err(|e| ingestion_error(source, e))?;
        debug!("Created {} chunk(s) with {}", chunks.len(), self.chunker.strategy_name());

        if chunks.is_empty() {
            warn!("No content extracted from {}", source);
            return Ok(Vec::new());
        }

        let ids = self
            .store
            .add(chunks)
            .await
            .map_err(|e| ingestion_error(source, e))?;
        info!("Ingested {} chunk(s) from {}", ids.len(), source);
        Ok(ids)
    }

    /// Ingest each source in order. Failures are logged and skipped.
    pub async fn ingest_batch(&self, sources: &[SourceRef]) -> Vec<PipelineResult<Vec<ChunkId>>> {
        let mut results = Vec::with_capacity(sources.len());
        let mut failed = 0;
        for source in sources {
            let result = self.ingest(source).await;
            if let Err(e) = &result {
                warn!("Skipping source: {}", e);
                failed += 1;
            }
            results.push(result);
        }
        info!(
            "Batch complete: {} ingested, {} failed",
            sources.len() - failed,
            failed
        );
        results
    }

    /// Answer a question with the manager (`use_manager`) or the assistant.
    pub async fn query(&self, question: &str, use_manager: bool) -> PipelineResult<String> {
        let agent = if use_manager {
            &self.manager
        } else {
            &self.assistant
        };
        let span = info_span!("query", agent = agent.name());
        let outcome = self
            .with_deadline("query", agent.process_query(question, None))
            .instrument(span)
            .await;

        let query_error = |reason: String| PipelineError::Query {
            question: question.to_string(),
            reason,
        };
        match outcome {
            Ok(Ok(answer)) => Ok(answer),
            Ok(Err(e)) => Err(query_error(e.to_string())),
            Err(timeout) => Err(query_error(timeout.to_string())),
        }
    }

    /// Make the available parser `name` live.
    ///
    /// Fails with `UnknownComponent` unless `name` is in `parsers.available`.
    /// On failure the previous parser stays live.
    pub fn switch_parser(&mut self, name: &str) -> PipelineResult<()> {
        let parser = Factory::new(&self.registry).parser(&self.config.parsers, Some(name))?;
        info!("Switched parser to '{}' ({})", name, parser.name());
        self.parser = parser;
        self.selection.parser = name.to_string();
        Ok(())
    }

    /// Make the available chunker `name` live.
    pub fn switch_chunker(&mut self, name: &str) -> PipelineResult<()> {
        let chunker = Factory::new(&self.registry).chunker(&self.config.chunkers, Some(name))?;
        info!("Switched chunker to '{}' ({})", name, chunker.strategy_name());
        self.chunker = chunker;
        self.selection.chunker = name.to_string();
        Ok(())
    }

    /// Make the available store `name` live and rebind both agents to it.
    ///
    /// Afterwards no tool holds the previous store.
    pub fn switch_store(&mut self, name: &str) -> PipelineResult<()> {
        let store = Factory::new(&self.registry).store(&self.config.vector_stores, Some(name))?;
        attach_store(&[&self.manager, &self.assistant], &store);
        info!("Switched vector store to '{}' ({})", name, store.name());
        self.store = store;
        self.selection.vector_store = name.to_string();
        Ok(())
    }

    /// Rebuild every component from `config`. On failure nothing changes.
    pub fn reload(&mut self, config: Config) -> PipelineResult<()> {
        config.validate()?;
        let components = Components::build(&config, &self.registry)?;
        self.parser = components.parser;
        self.chunker = components.chunker;
        self.store = components.store;
        self.manager = components.manager;
        self.assistant = components.assistant;
        self.selection = Selection::from_config(&config);
        self.config = config;
        info!("Pipeline reloaded");
        Ok(())
    }

    /// Declared selections next to what the live components report.
    pub async fn system_info(&self) -> SystemInfo {
        let declared_entry = |section: &ragline_config::FamilyConfig| DeclaredComponent {
            name: section.default.clone(),
            class: section
                .descriptor(&section.default)
                .map(|d| d.class.clone())
                .unwrap_or_default(),
        };

        let collection = match self.store.collection_info().await {
            Ok(info) => info,
            Err(e) => {
                warn!("Failed to read collection info: {}", e);
                serde_json::json!({ "error": e.to_string() })
            }
        };

        let registered = [
            ComponentFamily::Parser,
            ComponentFamily::Chunker,
            ComponentFamily::Store,
            ComponentFamily::Agent,
        ]
        .into_iter()
        .map(|family| (family.as_str().to_string(), self.registry.names(family)))
        .collect();

        SystemInfo {
            name: self.config.system.name.clone(),
            version: self.config.system.version.clone(),
            declared: DeclaredComponents {
                parser: declared_entry(&self.config.parsers),
                chunker: declared_entry(&self.config.chunkers),
                vector_store: declared_entry(&self.config.vector_stores),
                manager: self.config.agents.manager.class.clone(),
                assistant: self.config.agents.assistant.class.clone(),
            },
            live: LiveComponents {
                selection: self.selection.clone(),
                parser: self.parser.name().to_string(),
                supported_formats: self.parser.supported_formats(),
                chunker: self.chunker.strategy_name().to_string(),
                chunker_config: self.chunker.config(),
                store: self.store.name().to_string(),
                manager: self.manager.name().to_string(),
                manager_tools: self.manager.tool_names(),
                assistant: self.assistant.name().to_string(),
                assistant_tools: self.assistant.tool_names(),
            },
            registered,
            collection,
        }
    }

    /// Run `fut` under `system.timeout_seconds`, if set.
    async fn with_deadline<F: Future>(
        &self,
        operation: &str,
        fut: F,
    ) -> PipelineResult<F::Output> {
        match self.config.system.timeout_seconds {
            Some(seconds) => tokio::time::timeout(Duration::from_secs(seconds), fut)
                .await
                .map_err(|_| PipelineError::Timeout {
                    operation: operation.to_string(),
                    seconds,
                }),
            None => Ok(fut.await),
        }
    }
}

fn ingestion_error(source: &SourceRef, reason: impl std::fmt::Display) -> PipelineError {
    PipelineError::Ingestion {
        document: source.to_string(),
        reason: reason.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use ragline_agent::{AgentParams, ToolAgent};
    use ragline_config::ComponentDescriptor;
    use ragline_core::{
        decode_params, ChatMessage, Chunk, CoreError, CoreResult, ParsedDocument, ReasoningModel,
        ReasoningStep, Role, ToolCall, ToolDescriptor,
    };
    use ragline_ingest::{ContentCache, ParserOptions, TextParser};
    use serde_json::json;
    use std::path::{Path, PathBuf};
    use std::time::SystemTime;
    use tempfile::TempDir;

    /// Retrieves once for the query, then answers with the retrieved text.
    struct EchoModel {
        plan: Option<String>,
    }

    #[async_trait]
    impl ReasoningModel for EchoModel {
        async fn respond(
            &self,
            conversation: &[ChatMessage],
            _tools: &[ToolDescriptor],
        ) -> CoreResult<ReasoningStep> {
            if let Some(last) = conversation.last().filter(|m| m.role == Role::Tool) {
                return Ok(ReasoningStep::Final(last.content.clone()));
            }
            let query = conversation
                .iter()
                .find(|m| m.role == Role::User)
                .and_then(|m| m.content.strip_prefix("Query: "))
                .unwrap_or_default();
            let mut arguments = json!({ "question": query });
            if let Some(plan) = &self.plan {
                arguments["plan_name"] = json!(plan);
            }
            Ok(ReasoningStep::tool_calls(vec![ToolCall::new("get_context", arguments)]))
        }

        fn model_name(&self) -> &str {
            "echo"
        }
    }

    struct SlowModel;

    #[async_trait]
    impl ReasoningModel for SlowModel {
        async fn respond(&self, _: &[ChatMessage], _: &[ToolDescriptor]) -> CoreResult<ReasoningStep> {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(ReasoningStep::Final("too late".to_string()))
        }

        fn model_name(&self) -> &str {
            "slow"
        }
    }

    struct FailingChunker;

    #[async_trait]
    impl Chunker for FailingChunker {
        async fn chunk(&self, _documents: &[ParsedDocument]) -> CoreResult<Vec<Chunk>> {
            Err(CoreError::Chunking("boom".to_string()))
        }

        fn strategy_name(&self) -> &str {
            "failing"
        }

        fn config(&self) -> serde_json::Value {
            json!({})
        }
    }

    /// Builtins with both agents driven by [`EchoModel`].
    fn registry() -> Registry {
        let mut registry = Registry::with_builtins();
        for role in [AgentRole::Manager, AgentRole::Assistant] {
            registry.register_agent(role.class_name(), move |p| {
                let params: AgentParams = decode_params(role.class_name(), p)?;
                let plan = match role {
                    AgentRole::Manager => params.plans.first().cloned(),
                    AgentRole::Assistant => None,
                };
                let model = Arc::new(EchoModel { plan });
                Ok(Arc::new(ToolAgent::new(role, model, &params)?))
            });
        }
        registry.register_chunker("FailingChunker", |_| Ok(Box::new(FailingChunker)));
        registry
    }

    fn config(cache_dir: &Path, plans: &[&str]) -> Config {
        let mut config = Config::bootstrap();
        let parsers = &mut config.parsers.available;
        parsers.get_mut("markdown").unwrap().config =
            json!({ "enable_cache": true, "cache_dir": cache_dir });
        for name in ["text", "pdf"] {
            parsers.get_mut(name).unwrap().config = json!({ "enable_cache": false });
        }
        parsers.insert(
            "legacy".to_string(),
            ComponentDescriptor::new("LegacyParser", json!({})),
        );

        config.chunkers.available.insert(
            "failing".to_string(),
            ComponentDescriptor::new("FailingChunker", json!({})),
        );

        let hashing = json!({ "kind": "hashing", "dimensions": 64 });
        config.vector_stores.available.insert(
            "memory".to_string(),
            ComponentDescriptor::new("MemoryStore", json!({ "embedder": hashing })),
        );
        config.vector_stores.available.insert(
            "scratch".to_string(),
            ComponentDescriptor::new(
                "MemoryStore",
                json!({ "collection": "scratch", "embedder": hashing }),
            ),
        );
        config.vector_stores.default = "memory".to_string();

        config.agents.manager.config = json!({ "max_iterations": 4, "plans": plans });
        config.agents.assistant.config = json!({ "max_iterations": 4 });
        config
    }

    struct Fixture {
        dir: TempDir,
        orchestrator: Orchestrator,
    }

    impl Fixture {
        fn new(plans: &[&str]) -> Self {
            let dir = tempfile::tempdir().unwrap();
            let config = config(&dir.path().join("cache"), plans);
            let orchestrator = Orchestrator::new(config, registry()).unwrap();
            Self { dir, orchestrator }
        }

        fn write(&self, name: &str, contents: &str) -> PathBuf {
            let path = self.dir.path().join(name);
            std::fs::write(&path, contents).unwrap();
            path
        }

        fn cache(&self) -> ContentCache {
            ContentCache::open(self.dir.path().join("cache")).unwrap()
        }
    }

    async fn stored(orchestrator: &Orchestrator) -> u64 {
        orchestrator.store().collection_info().await.unwrap()["count"]
            .as_u64()
            .unwrap()
    }

    #[test]
    fn test_new_wires_agent_tools() {
        let fixture = Fixture::new(&["planA"]);
        let orchestrator = &fixture.orchestrator;
        assert_eq!(orchestrator.manager().tool_names(), vec!["ask_assistant", "get_context"]);
        assert_eq!(orchestrator.assistant().tool_names(), vec!["get_context"]);
    }

    #[test]
    fn test_init_failure_names_family() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = config(dir.path(), &["planA"]);
        config.chunkers.available.get_mut("paragraph").unwrap().config =
            json!({ "chunk_size": 10, "chunk_overlap": 50 });

        let err = Orchestrator::new(config, registry()).err().unwrap();
        assert!(matches!(err, PipelineError::Init { family: ComponentFamily::Chunker, .. }));
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = config(dir.path(), &["planA"]);
        config.vector_stores.default = "chroma".to_string();

        let err = Orchestrator::new(config, registry()).err().unwrap();
        assert!(matches!(err, PipelineError::Config(_)));
    }

    #[tokio::test]
    async fn test_ingest_then_query() {
        let fixture = Fixture::new(&["planA"]);
        let path = fixture.write("rust.md", "# Ownership\n\nEvery value in Rust has a single owner.");

        let ids = fixture
            .orchestrator
            .ingest(&SourceRef::new(&path, "planA"))
            .await
            .unwrap();
        assert_eq!(ids.len(), 1);

        let answer = fixture
            .orchestrator
            .query("who owns a value?", false)
            .await
            .unwrap();
        assert!(answer.starts_with("Context 1 (score "));
        assert!(answer.contains("single owner"));
    }

    #[tokio::test]
    async fn test_manager_only_sees_selected_plan() {
        let fixture = Fixture::new(&["planA", "planB"]);
        let a = fixture.write("a.md", "Borrowing rules keep references valid.");
        let b = fixture.write("b.md", "Garbage collection reclaims memory.");
        let results = fixture
            .orchestrator
            .ingest_batch(&[SourceRef::new(&a, "planA"), SourceRef::new(&b, "planB")])
            .await;
        assert!(results.iter().all(|r| r.is_ok()));

        let answer = fixture.orchestrator.query("memory", true).await.unwrap();
        assert!(answer.contains("Borrowing rules"));
        assert!(!answer.contains("Garbage collection"));
    }

    #[tokio::test]
    async fn test_unchanged_source_is_parsed_once() {
        let fixture = Fixture::new(&["planA"]);
        let path = fixture.write("notes.md", "Cached paragraph of text.");
        let source = SourceRef::new(&path, "notes");

        fixture.orchestrator.ingest(&source).await.unwrap();
        let first = fixture.cache().info().unwrap().entries;
        fixture.orchestrator.ingest(&source).await.unwrap();
        let second = fixture.cache().info().unwrap().entries;

        assert_eq!(first.len(), 1);
        assert_eq!(second.len(), 1);
        assert_eq!(first[0].key, second[0].key);
        assert_eq!(first[0].cached_at, second[0].cached_at);

        let file = std::fs::File::options().write(true).open(&path).unwrap();
        file.set_modified(SystemTime::UNIX_EPOCH + Duration::from_secs(1_000_000))
            .unwrap();
        fixture.orchestrator.ingest(&source).await.unwrap();
        assert_eq!(fixture.cache().info().unwrap().entries.len(), 2);
    }

    #[tokio::test]
    async fn test_failed_parse_stores_nothing() {
        let fixture = Fixture::new(&["planA"]);
        let missing = fixture.dir.path().join("missing.md");

        let err = fixture
            .orchestrator
            .ingest(&SourceRef::new(&missing, "planA"))
            .await
            .unwrap_err();
        match err {
            PipelineError::Ingestion { document, .. } => assert!(document.contains("missing.md")),
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(stored(&fixture.orchestrator).await, 0);
    }

    #[tokio::test]
    async fn test_failed_chunking_stores_nothing() {
        let mut fixture = Fixture::new(&["planA"]);
        fixture.orchestrator.switch_chunker("failing").unwrap();
        let path = fixture.write("doc.md", "Some text.");

        let err = fixture
            .orchestrator
            .ingest(&SourceRef::new(&path, "planA"))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("boom"));
        assert_eq!(stored(&fixture.orchestrator).await, 0);
    }

    #[tokio::test]
    async fn test_batch_continues_after_failure() {
        let fixture = Fixture::new(&["planA"]);
        let good = fixture.write("good.md", "Good content.");
        let sources = [
            SourceRef::new(fixture.dir.path().join("absent.md"), "planA"),
            SourceRef::new(&good, "planA"),
        ];

        let results = fixture.orchestrator.ingest_batch(&sources).await;
        assert!(results[0].is_err());
        assert_eq!(results[1].as_ref().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_store_switch_drops_old_store() {
        let mut fixture = Fixture::new(&["planA"]);
        let path = fixture.write("old.md", "Pre-switch knowledge about lifetimes.");
        fixture
            .orchestrator
            .ingest(&SourceRef::new(&path, "planA"))
            .await
            .unwrap();

        let old = fixture.orchestrator.store().clone();
        fixture.orchestrator.switch_store("scratch").unwrap();

        assert_eq!(Arc::strong_count(&old), 1);
        assert_eq!(fixture.orchestrator.config().vector_stores.default, "memory");
        assert_eq!(fixture.orchestrator.selection().vector_store, "scratch");
        for use_manager in [false, true] {
            let answer = fixture.orchestrator.query("lifetimes", use_manager).await.unwrap();
            assert!(!answer.contains("Pre-switch"));
        }
    }

    #[test]
    fn test_switch_to_unknown_keeps_selection() {
        let mut fixture = Fixture::new(&["planA"]);
        let err = fixture.orchestrator.switch_chunker("layout").unwrap_err();

        assert!(matches!(err, PipelineError::UnknownComponent { family: ComponentFamily::Chunker, .. }));
        assert_eq!(fixture.orchestrator.selection().chunker, "paragraph");
        assert_eq!(fixture.orchestrator.chunker().strategy_name(), "paragraph");
    }

    #[test]
    fn test_switch_parser_and_chunker() {
        let mut fixture = Fixture::new(&["planA"]);
        fixture.orchestrator.switch_parser("text").unwrap();
        fixture.orchestrator.switch_chunker("hierarchical").unwrap();

        assert_eq!(fixture.orchestrator.parser().name(), "TextParser");
        assert_eq!(fixture.orchestrator.chunker().strategy_name(), "hierarchical");
        assert_eq!(fixture.orchestrator.selection().parser, "text");
        assert_eq!(fixture.orchestrator.selection().chunker, "hierarchical");
        assert_eq!(fixture.orchestrator.config().parsers.default, "markdown");
        assert_eq!(fixture.orchestrator.config().chunkers.default, "paragraph");
    }

    #[tokio::test]
    async fn test_switch_parser_is_reported_as_drift() {
        let mut fixture = Fixture::new(&["planA"]);
        fixture.orchestrator.switch_parser("text").unwrap();

        let info = fixture.orchestrator.system_info().await;
        assert_eq!(info.declared.parser.name, "markdown");
        assert_eq!(info.live.selection.parser, "text");
        assert_eq!(info.live.parser, "TextParser");
        assert_eq!(info.drift(), vec![ComponentFamily::Parser]);

        fixture.orchestrator.switch_parser("markdown").unwrap();
        assert!(fixture.orchestrator.system_info().await.drift().is_empty());
    }

    #[tokio::test]
    async fn test_store_and_chunker_switches_are_reported_as_drift() {
        let mut fixture = Fixture::new(&["planA"]);
        fixture.orchestrator.switch_chunker("hierarchical").unwrap();
        fixture.orchestrator.switch_store("scratch").unwrap();

        let info = fixture.orchestrator.system_info().await;
        assert_eq!(info.declared.vector_store.name, "memory");
        assert_eq!(info.live.selection.vector_store, "scratch");
        assert_eq!(info.drift(), vec![ComponentFamily::Chunker, ComponentFamily::Store]);

        let config = fixture.orchestrator.config().clone();
        fixture.orchestrator.reload(config).unwrap();
        assert!(fixture.orchestrator.system_info().await.drift().is_empty());
    }

    #[tokio::test]
    async fn test_system_info_surfaces_drift() {
        let mut fixture = Fixture::new(&["planA"]);
        let info = fixture.orchestrator.system_info().await;
        assert!(info.drift().is_empty());
        assert_eq!(info.live.chunker, "paragraph");
        assert_eq!(info.collection["count"], 0);

        // A class registered under one name that builds another implementation.
        let mut registry = registry();
        registry.register_parser("LegacyParser", |_| {
            Ok(Box::new(TextParser::new(ParserOptions::uncached())?))
        });
        let mut config = fixture.orchestrator.config().clone();
        config.parsers.default = "legacy".to_string();
        fixture.orchestrator = Orchestrator::new(config, registry).unwrap();

        let info = fixture.orchestrator.system_info().await;
        assert_eq!(info.declared.parser.name, "legacy");
        assert_eq!(info.declared.parser.class, "LegacyParser");
        assert_eq!(info.live.selection.parser, "legacy");
        assert_eq!(info.live.parser, "TextParser");
        assert_eq!(info.drift(), vec![ComponentFamily::Parser]);
    }

    #[tokio::test]
    async fn test_reload_rebuilds_everything() {
        let mut fixture = Fixture::new(&["planA"]);
        let path = fixture.write("doc.md", "Content before reload.");
        fixture
            .orchestrator
            .ingest(&SourceRef::new(&path, "planA"))
            .await
            .unwrap();

        let mut config = fixture.orchestrator.config().clone();
        config.chunkers.default = "hierarchical".to_string();
        fixture.orchestrator.reload(config).unwrap();

        assert_eq!(fixture.orchestrator.chunker().strategy_name(), "hierarchical");
        assert_eq!(stored(&fixture.orchestrator).await, 0);
        assert_eq!(fixture.orchestrator.assistant().tool_names(), vec!["get_context"]);
    }

    #[tokio::test]
    async fn test_query_deadline() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = config(dir.path(), &["planA"]);
        config.system.timeout_seconds = Some(1);

        let mut registry = registry();
        registry.register_agent("AssistantAgent", |p| {
            let params: AgentParams = decode_params("AssistantAgent", p)?;
            Ok(Arc::new(ToolAgent::new(AgentRole::Assistant, Arc::new(SlowModel), &params)?))
        });
        let orchestrator = Orchestrator::new(config, registry).unwrap();

        let err = orchestrator.query("anything", false).await.unwrap_err();
        match err {
            PipelineError::Query { question, reason } => {
                assert_eq!(question, "anything");
                assert!(reason.contains("timed out after 1s"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
