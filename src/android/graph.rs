//! The framework driver: turns declarations into modules and modules into a
//! build graph.
//!
//! ```text
//! declarations ──load──▶ modules ──resolve──▶ dependencies ──actions──▶ BuildGraph
//!                 │                                  │
//!            load hooks                      dependencies first
//!       (create / append props)             (srcs of producers ready)
//! ```
//!
//! Modules never point at each other. Links are `(referrer, referent)` name
//! pairs stored on the referrer and resolved here.

use std::cmp::Reverse;
use std::collections::{BTreeSet, BinaryHeap, HashMap};
use std::fmt;
use std::path::{Path, PathBuf};

use anyhow::Result;

use super::blueprint::Declaration;
use super::context::{BottomUpMutatorContext, LoadHookContext, ModuleContext};
use super::error::{BuildError, LoadError, ModuleError};
use super::module::{Dependency, DependencyTag, Module, ModuleFactory, ModuleHandle, ModuleInfo};
use super::properties::{self, Properties};
use super::registry::ModuleTypeRegistry;
use super::rule::{BuildEdge, BuildParams, StaticRule};
use crate::config::Config;

/// Every build edge declared by every module, in generation order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildGraph {
    pub edges: Vec<BuildEdge>,
}

impl BuildGraph {
    /// Rules used by at least one edge, sorted by name.
    pub fn rules(&self) -> Vec<&'static StaticRule> {
        let mut seen = BTreeSet::new();
        let mut rules = Vec::new();
        for edge in &self.edges {
            if seen.insert(edge.rule.name) {
                rules.push(edge.rule);
            }
        }
        rules.sort_by_key(|r| r.name);
        rules
    }

    /// The edge producing `path`, if any.
    pub fn producer_of(&self, path: &Path) -> Option<&BuildEdge> {
        self.edges.iter().find(|e| e.output == path)
    }

    pub fn edges_for_module<'a>(&'a self, module: &'a str) -> impl Iterator<Item = &'a BuildEdge> {
        self.edges.iter().filter(move |e| e.module == module)
    }
}

/// Holds every loaded module and drives the three phases.
pub struct Context {
    config: Config,
    modules: Vec<ModuleInfo>,
    index: HashMap<String, usize>,
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("config", &self.config)
            .field("modules", &self.modules)
            .finish_non_exhaustive()
    }
}

struct PendingModule {
    factory: ModuleFactory,
    props: Properties,
}

impl Context {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            modules: Vec::new(),
            index: HashMap::new(),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn module(&self, name: &str) -> Option<&ModuleInfo> {
        self.index.get(name).map(|&i| &self.modules[i])
    }

    pub fn modules(&self) -> impl Iterator<Item = &ModuleInfo> {
        self.modules.iter()
    }

    pub fn module_names(&self) -> impl Iterator<Item = &str> {
        self.modules.iter().map(|m| m.name.as_str())
    }

    /// Load phase: instantiate every declaration and run its load hooks.
    ///
    /// A failing declaration is abandoned; the rest still load. All
    /// failures are reported together.
    pub fn load(
        &mut self,
        registry: &ModuleTypeRegistry,
        declarations: Vec<Declaration>,
    ) -> Result<(), LoadError> {
        let mut errors = Vec::new();

        for decl in declarations {
            if let Err(e) = self.load_declaration(registry, decl) {
                errors.push(e);
            }
        }

        tracing::info!(modules = self.modules.len(), errors = errors.len(), "load phase finished");

        if errors.is_empty() {
            Ok(())
        } else {
            Err(LoadError { errors })
        }
    }

    fn load_declaration(
        &mut self,
        registry: &ModuleTypeRegistry,
        decl: Declaration,
    ) -> Result<(), ModuleError> {
        let Declaration {
            module_type,
            mut properties,
            dir,
        } = decl;

        let name = properties::take_required_string(&mut properties, "name")
            .map_err(|e| ModuleError::new(format!("<unnamed {}>", module_type), e))?;
        let factory = registry
            .factory(&module_type)
            .map_err(|e| ModuleError::new(&name, e))?;

        let mark = self.modules.len();
        let result = self.instantiate(name, Some(module_type), dir, factory, properties, None);
        if result.is_err() {
            self.rollback(mark);
        }
        result
    }

    /// Forget every module registered after the first `mark`, so a failed
    /// declaration leaves nothing behind.
    fn rollback(&mut self, mark: usize) {
        for info in self.modules.drain(mark..) {
            tracing::debug!(module = %info.name, "discarding module of failed declaration");
            self.index.remove(&info.name);
        }
    }

    fn instantiate(
        &mut self,
        name: String,
        type_name: Option<String>,
        dir: PathBuf,
        factory: ModuleFactory,
        props: Properties,
        created_by: Option<String>,
    ) -> Result<(), ModuleError> {
        let ModuleHandle {
            mut module,
            load_hooks,
        } = factory(props).map_err(|e| ModuleError::new(&name, e))?;

        let mut created = Vec::new();
        for hook in load_hooks {
            let mut ctx = LoadCtx {
                name: &name,
                dir: &dir,
                config: &self.config,
                module: module.as_mut(),
                created: &mut created,
            };
            hook(&mut ctx).map_err(|e| ModuleError::new(&name, e))?;
        }

        self.register(ModuleInfo {
            name: name.clone(),
            type_name,
            dir: dir.clone(),
            created_by,
            module,
            deps: Vec::new(),
        })?;

        for PendingModule { factory, mut props } in created {
            let child = properties::take_required_string(&mut props, "name")
                .map_err(|e| ModuleError::new(&name, e))?;
            if let Some(existing) = self.module(&child) {
                return Err(ModuleError::new(
                    &name,
                    BuildError::DuplicateModule {
                        name: child,
                        created_by: existing.created_by.clone(),
                    },
                ));
            }
            tracing::debug!(parent = %name, module = %child, "creating module from load hook");
            self.instantiate(child, None, dir.clone(), factory, props, Some(name.clone()))?;
        }

        Ok(())
    }

    fn register(&mut self, info: ModuleInfo) -> Result<(), ModuleError> {
        if let Some(existing) = self.module(&info.name) {
            return Err(ModuleError::new(
                &info.name,
                BuildError::DuplicateModule {
                    name: info.name.clone(),
                    created_by: existing.created_by.clone(),
                },
            ));
        }
        self.index.insert(info.name.clone(), self.modules.len());
        self.modules.push(info);
        Ok(())
    }

    /// Dependency phase: collect and check every module's dependencies.
    pub fn resolve_dependencies(&mut self) -> Result<(), LoadError> {
        for info in &mut self.modules {
            let mut ctx = MutatorCtx {
                name: &info.name,
                config: &self.config,
                deps: Vec::new(),
            };
            info.module.deps_mutator(&mut ctx);
            info.deps = ctx.deps;
        }

        let mut errors = Vec::new();
        for info in &self.modules {
            for dep in &info.deps {
                if self.index.contains_key(&dep.name) {
                    continue;
                }
                if dep.tag == DependencyTag::Lib && self.config.allow_missing_dependencies {
                    tracing::warn!(module = %info.name, dependency = %dep.name, "missing library dependency allowed");
                    continue;
                }
                errors.push(ModuleError::new(
                    &info.name,
                    BuildError::MissingDependency(dep.name.clone()),
                ));
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(LoadError { errors })
        }
    }

    /// Module indices with every dependency before its dependents.
    ///
    /// Ties keep declaration order.
    fn dependency_order(&self) -> Result<Vec<usize>, BuildError> {
        let n = self.modules.len();
        let mut pending = vec![0usize; n];
        let mut dependents: Vec<Vec<usize>> = vec![Vec::new(); n];

        for (i, info) in self.modules.iter().enumerate() {
            let targets: BTreeSet<usize> = info
                .deps
                .iter()
                .filter_map(|d| self.index.get(&d.name).copied())
                .collect();
            for t in targets {
                pending[i] += 1;
                dependents[t].push(i);
            }
        }

        let mut ready: BinaryHeap<Reverse<usize>> =
            (0..n).filter(|&i| pending[i] == 0).map(Reverse).collect();
        let mut order = Vec::with_capacity(n);

        while let Some(Reverse(i)) = ready.pop() {
            order.push(i);
            for &d in &dependents[i] {
                pending[d] -= 1;
                if pending[d] == 0 {
                    ready.push(Reverse(d));
                }
            }
        }

        if order.len() != n {
            let stuck = (0..n)
                .filter(|&i| pending[i] > 0)
                .map(|i| self.modules[i].name.clone())
                .collect();
            return Err(BuildError::DependencyCycle(stuck));
        }
        Ok(order)
    }

    /// Action phase: ask every module for its build edges.
    ///
    /// Running this again on the same context yields the same graph.
    pub fn generate_build_actions(&mut self) -> Result<BuildGraph> {
        let order = self.dependency_order()?;
        let mut produced: HashMap<String, Vec<PathBuf>> = HashMap::new();
        let mut owners: HashMap<PathBuf, String> = HashMap::new();
        let mut graph = BuildGraph::default();

        for i in order {
            let info = &mut self.modules[i];
            let mut ctx = ActionCtx {
                name: &info.name,
                dir: &info.dir,
                config: &self.config,
                deps: &info.deps,
                produced: &produced,
                edges: Vec::new(),
            };
            info.module
                .generate_build_actions(&mut ctx)
                .map_err(|e| ModuleError::new(&info.name, e))?;
            let edges = ctx.edges;

            for edge in &edges {
                if let Some(owner) = owners.insert(edge.output.clone(), edge.module.clone()) {
                    tracing::error!(output = %edge.output.display(), first = %owner, second = %edge.module, "output declared twice");
                    return Err(ModuleError::new(
                        &info.name,
                        BuildError::DuplicateOutput(edge.output.clone()),
                    )
                    .into());
                }
            }
            tracing::debug!(module = %info.name, edges = edges.len(), "generated build actions");
            graph.edges.extend(edges);

            if let Some(producer) = info.module.as_source_file_producer() {
                produced.insert(info.name.clone(), producer.srcs());
            }
        }

        tracing::info!(edges = graph.edges.len(), "action phase finished");
        Ok(graph)
    }
}

struct LoadCtx<'a> {
    name: &'a str,
    dir: &'a Path,
    config: &'a Config,
    module: &'a mut dyn Module,
    created: &'a mut Vec<PendingModule>,
}

impl LoadHookContext for LoadCtx<'_> {
    fn module_name(&self) -> &str {
        self.name
    }

    fn module_dir(&self) -> &Path {
        self.dir
    }

    fn config(&self) -> &Config {
        self.config
    }

    fn create_module(&mut self, factory: ModuleFactory, props: Properties) -> Result<()> {
        self.created.push(PendingModule { factory, props });
        Ok(())
    }

    fn append_properties(&mut self, props: Properties) -> Result<()> {
        self.module.append_properties(props)
    }
}

struct MutatorCtx<'a> {
    name: &'a str,
    config: &'a Config,
    deps: Vec<Dependency>,
}

impl BottomUpMutatorContext for MutatorCtx<'_> {
    fn module_name(&self) -> &str {
        self.name
    }

    fn config(&self) -> &Config {
        self.config
    }

    fn add_dependency(&mut self, tag: DependencyTag, name: &str) {
        let dep = Dependency {
            tag,
            name: name.to_string(),
        };
        if !self.deps.contains(&dep) {
            self.deps.push(dep);
        }
    }
}

struct ActionCtx<'a> {
    name: &'a str,
    dir: &'a Path,
    config: &'a Config,
    deps: &'a [Dependency],
    produced: &'a HashMap<String, Vec<PathBuf>>,
    edges: Vec<BuildEdge>,
}

impl ModuleContext for ActionCtx<'_> {
    fn module_name(&self) -> &str {
        self.name
    }

    fn module_dir(&self) -> &Path {
        self.dir
    }

    fn config(&self) -> &Config {
        self.config
    }

    fn build(&mut self, params: BuildParams) -> Result<()> {
        let edge = BuildEdge::from_params(self.name, params)?;
        self.edges.push(edge);
        Ok(())
    }

    fn source_exists(&self, path: &Path) -> bool {
        self.config.src_dir.join(path).is_file()
    }

    fn srcs_for_module(&self, name: &str) -> Result<Vec<PathBuf>> {
        let declared = self
            .deps
            .iter()
            .any(|d| d.tag == DependencyTag::SourceFile && d.name == name);
        if !declared {
            return Err(BuildError::MissingDependency(name.to_string()).into());
        }
        self.produced
            .get(name)
            .cloned()
            .ok_or_else(|| BuildError::NotASourceFileProducer(name.to_string()).into())
    }
}
