//! Phase-specific contexts handed to modules, and the path API built on them.
//!
//! Each phase sees its own trait: load hooks can create modules and append
//! properties, mutators can add dependencies, and only the action phase can
//! declare build edges.

use std::path::{Path, PathBuf};

use anyhow::Result;

use super::module::{DependencyTag, ModuleFactory};
use super::properties::Properties;
use super::rule::BuildParams;
use crate::config::Config;

/// Load phase: runs while declarations are turned into modules.
pub trait LoadHookContext {
    fn module_name(&self) -> &str;
    /// Directory of the declaring file, relative to the source root.
    fn module_dir(&self) -> &Path;
    fn config(&self) -> &Config;
    /// Declare a sibling module. `props` must carry its `name`.
    fn create_module(&mut self, factory: ModuleFactory, props: Properties) -> Result<()>;
    /// Append to the properties of the module under construction.
    fn append_properties(&mut self, props: Properties) -> Result<()>;
}

/// Dependency phase: runs once every module has been loaded.
pub trait BottomUpMutatorContext {
    fn module_name(&self) -> &str;
    fn config(&self) -> &Config;
    fn add_dependency(&mut self, tag: DependencyTag, name: &str);
}

/// Action phase: runs once dependencies are resolved, dependencies first.
pub trait ModuleContext {
    fn module_name(&self) -> &str;
    /// Directory of the declaring file, relative to the source root.
    fn module_dir(&self) -> &Path;
    fn config(&self) -> &Config;
    /// Declare a build edge.
    fn build(&mut self, params: BuildParams) -> Result<()>;
    /// Whether `path` (relative to the source root) exists in the source tree.
    fn source_exists(&self, path: &Path) -> bool;
    /// Outputs of a source file producer this module depends on.
    fn srcs_for_module(&self, name: &str) -> Result<Vec<PathBuf>>;
}

/// Path of `rel` inside this module's output directory.
pub fn path_for_module_out<C>(ctx: &C, rel: impl AsRef<Path>) -> PathBuf
where
    C: ModuleContext + ?Sized,
{
    ctx.config()
        .out_dir
        .join(ctx.module_name())
        .join(rel.as_ref())
}

/// Path of `rel` inside this module's source directory.
pub fn path_for_module_src<C>(ctx: &C, rel: impl AsRef<Path>) -> PathBuf
where
    C: ModuleContext + ?Sized,
{
    ctx.config()
        .src_dir
        .join(ctx.module_dir())
        .join(rel.as_ref())
}

/// The source path `dir/name`, if that file exists.
pub fn existent_path_for_source<C>(ctx: &C, dir: &Path, name: &str) -> Option<PathBuf>
where
    C: ModuleContext + ?Sized,
{
    let rel = dir.join(name);
    if ctx.source_exists(&rel) {
        Some(ctx.config().src_dir.join(rel))
    } else {
        None
    }
}
