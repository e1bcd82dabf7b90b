//! Module trait, factories and load hooks.

use std::any::Any;
use std::fmt;
use std::path::PathBuf;

use anyhow::Result;

use super::context::{BottomUpMutatorContext, LoadHookContext, ModuleContext};
use super::error::BuildError;
use super::properties::Properties;

/// A load hook runs once, after the module is constructed and before its
/// name is registered.
pub type LoadHook = Box<dyn FnOnce(&mut dyn LoadHookContext) -> Result<()> + Send>;

/// Build a module from its declared properties (`name` already removed).
pub type ModuleFactory = fn(Properties) -> Result<ModuleHandle>;

/// A module instance.
///
/// Implementations are driven through three phases: load (properties may be
/// appended), dependency resolution, then build action generation.
pub trait Module: Send {
    /// Extend this module's properties. Only called from load hooks.
    fn append_properties(&mut self, _props: Properties) -> Result<()> {
        Err(BuildError::InvalidProperty {
            property: "<module>".to_string(),
            reason: "module type does not accept appended properties".to_string(),
        }
        .into())
    }

    /// Declare dependencies on other modules.
    fn deps_mutator(&self, _ctx: &mut dyn BottomUpMutatorContext) {}

    /// Declare the build edges producing this module's outputs.
    fn generate_build_actions(&mut self, ctx: &mut dyn ModuleContext) -> Result<()>;

    /// Modules whose outputs can be referenced as `:name` return themselves.
    fn as_source_file_producer(&self) -> Option<&dyn SourceFileProducer> {
        None
    }

    fn as_any(&self) -> &dyn Any;
}

impl dyn Module {
    pub fn downcast_ref<T: Module + 'static>(&self) -> Option<&T> {
        self.as_any().downcast_ref::<T>()
    }
}

/// A module whose outputs other modules may consume as source files.
pub trait SourceFileProducer {
    fn srcs(&self) -> Vec<PathBuf>;
}

/// A freshly constructed module together with its pending load hooks.
pub struct ModuleHandle {
    pub module: Box<dyn Module>,
    pub load_hooks: Vec<LoadHook>,
}

impl ModuleHandle {
    pub fn new(module: impl Module + 'static) -> Self {
        Self {
            module: Box::new(module),
            load_hooks: Vec::new(),
        }
    }

    pub fn add_load_hook(
        &mut self,
        hook: impl FnOnce(&mut dyn LoadHookContext) -> Result<()> + Send + 'static,
    ) {
        self.load_hooks.push(Box::new(hook));
    }
}

impl fmt::Debug for ModuleHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModuleHandle")
            .field("load_hooks", &self.load_hooks.len())
            .finish_non_exhaustive()
    }
}

/// Why one module depends on another.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DependencyTag {
    /// A library linked into the module.
    Lib,
    /// A `:module` reference consuming another module's source files.
    SourceFile,
}

/// A `(referrer, referent)` link, stored on the referrer.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Dependency {
    pub tag: DependencyTag,
    pub name: String,
}

/// Prefix marking a module reference inside a source list.
pub const MODULE_REFERENCE_SIGIL: char = ':';

/// The module name behind a `:name` source entry, if it is one.
pub fn src_module_reference(src: &str) -> Option<&str> {
    src.strip_prefix(MODULE_REFERENCE_SIGIL)
        .filter(|name| !name.is_empty())
}

/// Bookkeeping the framework keeps per module.
pub struct ModuleInfo {
    pub name: String,
    /// Declared module type; `None` for modules created by load hooks.
    pub type_name: Option<String>,
    /// Directory of the declaring file, relative to the source root.
    pub dir: PathBuf,
    /// Module whose load hook created this one.
    pub created_by: Option<String>,
    pub module: Box<dyn Module>,
    pub deps: Vec<Dependency>,
}

impl fmt::Debug for ModuleInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModuleInfo")
            .field("name", &self.name)
            .field("type_name", &self.type_name)
            .field("dir", &self.dir)
            .field("created_by", &self.created_by)
            .field("deps", &self.deps)
            .finish_non_exhaustive()
    }
}
