//! Module framework: declarations, module types, phases and build edges.
//!
//! # Architecture
//!
//! ```text
//! Blueprints.json ─▶ Declaration ─▶ ModuleTypeRegistry ─▶ Module + load hooks
//!                                                              │
//!              ┌──────────── Context (load / resolve / actions) ┘
//!              ▼
//!          BuildGraph ─▶ ninja::write_ninja   (manifest)
//!                     └▶ executor::execute    (hash-based incremental run)
//! ```
//!
//! Module types only see the phase traits in [`context`]; everything else
//! here is the machinery driving them.

pub mod blueprint;
pub mod context;
pub mod error;
pub mod executor;
pub mod graph;
pub mod module;
pub mod ninja;
pub mod properties;
pub mod registry;
pub mod rule;

pub use blueprint::Declaration;
pub use context::{
    existent_path_for_source, path_for_module_out, path_for_module_src, BottomUpMutatorContext,
    LoadHookContext, ModuleContext,
};
pub use error::{BuildError, LoadError, ModuleError};
pub use graph::{BuildGraph, Context};
pub use module::{
    Dependency, DependencyTag, Module, ModuleFactory, ModuleHandle, ModuleInfo, SourceFileProducer,
};
pub use properties::Properties;
pub use registry::{default_registry, ModuleTypeRegistry};
pub use rule::{BuildEdge, BuildParams, StaticRule, CP};
