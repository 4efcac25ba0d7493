//! Builds live components from configuration sections.

use crate::error::{PipelineError, PipelineResult};
use crate::registry::Registry;
use ragline_agent::{Agent, AgentRole};
use ragline_config::{AgentsConfig, ComponentDescriptor, FamilyConfig};
use ragline_core::{Chunker, ComponentFamily, Parser, VectorStore};
use std::sync::Arc;
use tracing::debug;

/// A freshly built component of any family.
pub enum Component {
    Parser(Box<dyn Parser>),
    Chunker(Box<dyn Chunker>),
    Store(Arc<dyn VectorStore>),
    Agent(Arc<dyn Agent>),
}

impl Component {
    pub fn family(&self) -> ComponentFamily {
        match self {
            Component::Parser(_) => ComponentFamily::Parser,
            Component::Chunker(_) => ComponentFamily::Chunker,
            Component::Store(_) => ComponentFamily::Store,
            Component::Agent(_) => ComponentFamily::Agent,
        }
    }

    /// The implementation's self-reported name.
    pub fn name(&self) -> &str {
        match self {
            Component::Parser(p) => p.name(),
            Component::Chunker(c) => c.strategy_name(),
            Component::Store(s) => s.name(),
            Component::Agent(a) => a.name(),
        }
    }
}

/// Resolves configuration entries against a [`Registry`].
pub struct Factory<'a> {
    registry: &'a Registry,
}

impl<'a> Factory<'a> {
    pub fn new(registry: &'a Registry) -> Self {
        Self { registry }
    }

    /// Build the entry named by `selection`, or the section's default.
    ///
    /// A name missing from `available`, or a class missing from the registry,
    /// is an `UnknownComponent` error. Nothing is substituted.
    pub fn create_from_config(
        &self,
        section: &FamilyConfig,
        family: ComponentFamily,
        selection: Option<&str>,
    ) -> PipelineResult<Component> {
        let name = selection.unwrap_or(&section.default);
        let descriptor = section
            .descriptor(name)
            .ok_or_else(|| PipelineError::UnknownComponent {
                family,
                name: name.to_string(),
            })?;
        debug!("Building {} '{}' ({})", family, name, descriptor.class);
        self.create(family, descriptor)
    }

    /// Build one of the two configured agents.
    pub fn create_agent(
        &self,
        agents: &AgentsConfig,
        role: AgentRole,
    ) -> PipelineResult<Arc<dyn Agent>> {
        let descriptor = match role {
            AgentRole::Manager => &agents.manager,
            AgentRole::Assistant => &agents.assistant,
        };
        debug!("Building {} agent ({})", role, descriptor.class);
        self.registry
            .create_agent(&descriptor.class, &descriptor.config)
            .map_err(|e| PipelineError::from_build(ComponentFamily::Agent, e))
    }

    pub fn create(
        &self,
        family: ComponentFamily,
        descriptor: &ComponentDescriptor,
    ) -> PipelineResult<Component> {
        let (class, params) = (descriptor.class.as_str(), &descriptor.config);
        let built = match family {
            ComponentFamily::Parser => self.registry.create_parser(class, params).map(Component::Parser),
            ComponentFamily::Chunker => {
                self.registry.create_chunker(class, params).map(Component::Chunker)
            }
            ComponentFamily::Store => self
                .registry
                .create_store(class, params)
                .map(|s| Component::Store(Arc::from(s))),
            ComponentFamily::Agent => self.registry.create_agent(class, params).map(Component::Agent),
        };
        built.map_err(|e| PipelineError::from_build(family, e))
    }

    pub fn parser(&self, section: &FamilyConfig, selection: Option<&str>) -> PipelineResult<Box<dyn Parser>> {
        match self.create_from_config(section, ComponentFamily::Parser, selection)? {
            Component::Parser(parser) => Ok(parser),
            other => Err(mismatch(ComponentFamily::Parser, &other)),
        }
    }

    pub fn chunker(
        &self,
        section: &FamilyConfig,
        selection: Option<&str>,
    ) -> PipelineResult<Box<dyn Chunker>> {
        match self.create_from_config(section, ComponentFamily::Chunker, selection)? {
            Component::Chunker(chunker) => Ok(chunker),
            other => Err(mismatch(ComponentFamily::Chunker, &other)),
        }
    }

    pub fn store(
        &self,
        section: &FamilyConfig,
        selection: Option<&str>,
    ) -> PipelineResult<Arc<dyn VectorStore>> {
        match self.create_from_config(section, ComponentFamily::Store, selection)? {
            Component::Store(store) => Ok(store),
            other => Err(mismatch(ComponentFamily::Store, &other)),
        }
    }
}

fn mismatch(family: ComponentFamily, built: &Component) -> PipelineError {
    PipelineError::Init {
        family,
        reason: format!("constructor returned a {} component", built.family()),
    }
}
