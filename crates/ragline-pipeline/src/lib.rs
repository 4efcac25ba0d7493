//! Ragline Pipeline - Component registry, factory and orchestrator.
//!
//! The [`Registry`] maps implementation names to constructors per capability
//! family. The [`Factory`] resolves a configuration section to a registered
//! constructor. The [`Orchestrator`] owns the live components and drives
//! ingestion and queries.

mod builtins;
mod error;
mod factory;
mod orchestrator;
mod registry;

pub use error::{PipelineError, PipelineResult};
pub use ragline_agent::{Agent, AgentRole};
pub use factory::{Component, Factory};
pub use orchestrator::{
    DeclaredComponent, DeclaredComponents, LiveComponents, Orchestrator, Selection, SystemInfo,
};
pub use registry::{AgentCtor, ChunkerCtor, ParserCtor, Registry, StoreCtor};
