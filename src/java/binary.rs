//! `java_binary_host`: a host-side Java binary.
//!
//! Compilation and jar packaging live outside this crate. What remains here
//! is the dependency surface (`libs`) and resource staging: every entry of
//! `java_resources` is copied into `<out>/<name>/res/`, where the packager
//! picks it up. Entries written as `:module` pull in the source files of
//! another module.

use std::any::Any;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

use anyhow::{bail, Result};
use serde::Deserialize;

use crate::android::module::src_module_reference;
use crate::android::properties;
use crate::android::{
    path_for_module_out, path_for_module_src, BottomUpMutatorContext, BuildError, BuildParams,
    DependencyTag, Module, ModuleContext, ModuleHandle, Properties, CP,
};

/// Subdirectory of the module output holding staged resources.
pub const RESOURCE_DIR: &str = "res";

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BinaryHostProperties {
    /// Java sources, compiled by the packager.
    #[serde(default)]
    pub srcs: Vec<String>,
    #[serde(default)]
    pub main_class: Option<String>,
    /// Libraries the binary links against.
    #[serde(default)]
    pub libs: Vec<String>,
    /// Resource files, or `:module` references to source file producers.
    #[serde(default)]
    pub java_resources: Vec<String>,
}

#[derive(Debug)]
pub struct BinaryHost {
    raw: Properties,
    properties: BinaryHostProperties,
}

impl BinaryHost {
    pub fn new(props: Properties) -> Result<Self, BuildError> {
        let properties = properties::decode(&props)?;
        Ok(Self {
            raw: props,
            properties,
        })
    }

    pub fn properties(&self) -> &BinaryHostProperties {
        &self.properties
    }

    fn resolve_resources(&self, ctx: &dyn ModuleContext) -> Result<Vec<PathBuf>> {
        let mut resolved = Vec::new();
        for entry in &self.properties.java_resources {
            match src_module_reference(entry) {
                Some(module) => resolved.extend(ctx.srcs_for_module(module)?),
                None => {
                    let rel = ctx.module_dir().join(entry);
                    if !ctx.source_exists(&rel) {
                        bail!("java_resources: {} does not exist", rel.display());
                    }
                    resolved.push(path_for_module_src(ctx, entry));
                }
            }
        }
        Ok(resolved)
    }
}

pub fn binary_host_factory(props: Properties) -> Result<ModuleHandle> {
    Ok(ModuleHandle::new(BinaryHost::new(props)?))
}

impl Module for BinaryHost {
    fn append_properties(&mut self, props: Properties) -> Result<()> {
        properties::append(&mut self.raw, props)?;
        self.properties = properties::decode(&self.raw)?;
        Ok(())
    }

    fn deps_mutator(&self, ctx: &mut dyn BottomUpMutatorContext) {
        for lib in &self.properties.libs {
            ctx.add_dependency(DependencyTag::Lib, lib);
        }
        for entry in &self.properties.java_resources {
            if let Some(module) = src_module_reference(entry) {
                ctx.add_dependency(DependencyTag::SourceFile, module);
            }
        }
    }

    fn generate_build_actions(&mut self, ctx: &mut dyn ModuleContext) -> Result<()> {
        let sources = self.resolve_resources(&*ctx)?;

        let mut seen = HashSet::new();
        for src in sources {
            let Some(file_name) = src.file_name().map(|n| n.to_os_string()) else {
                bail!("java_resources: {} has no file name", src.display());
            };
            if !seen.insert(file_name.clone()) {
                bail!(
                    "java_resources: two resources named {}",
                    Path::new(&file_name).display()
                );
            }
            let dest = path_for_module_out(&*ctx, Path::new(RESOURCE_DIR).join(&file_name));
            ctx.build(BuildParams::new(&CP, &dest).input(src))?;
        }

        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
