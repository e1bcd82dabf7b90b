//! The `<name>-gen` module created by every `tradefed_binary_host`.
//!
//! It writes the suite-info properties file read by the harness at runtime
//! and, when the declaring directory has a `DynamicConfig.xml`, copies it
//! next to it as `<parent>.dynamic`. Both outputs are exposed as source
//! files so the launcher can reference them as `:<name>-gen`.

use std::any::Any;
use std::path::PathBuf;

use anyhow::Result;
use serde::Deserialize;
use serde_json::Value;

use super::binary::GEN_SUFFIX;
use crate::android::properties;
use crate::android::{
    existent_path_for_source, path_for_module_out, BuildParams, Module, ModuleContext,
    ModuleHandle, Properties, SourceFileProducer, StaticRule, CP,
};

/// File name of the generated properties file.
pub const SUITE_INFO_FILE: &str = "test-suite-info.properties";

/// Optional per-directory runtime configuration picked up by the generator.
pub const DYNAMIC_CONFIG_FILE: &str = "DynamicConfig.xml";

/// Writes the suite-info properties file.
///
/// The build number is read from its file when the command runs, not when
/// the graph is generated.
pub static TRADEFED_BINARY_GEN_RULE: StaticRule = StaticRule {
    name: "tradefedBinaryGenRule",
    command: concat!(
        "rm -f $out && touch $out && ",
        "echo \"# This file is auto generated. Do not modify.\" >> $out && ",
        "echo \"build_number = $$(cat ${buildNumberFile})\" >> $out && ",
        "echo \"target_arch = ${arch}\" >> $out && ",
        "echo \"name = ${name}\" >> $out && ",
        "echo \"fullname = ${fullname}\" >> $out && ",
        "echo \"version = ${version}\" >> $out",
    ),
    description: "suite info $out",
    args: &["buildNumberFile", "arch", "name", "fullname", "version"],
};

/// Properties the launcher hands to its generator.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TradefedBinaryGenProperties {
    pub short_name: String,
    pub full_name: String,
    /// Already prefixed with the platform version when requested.
    pub version: String,
}

impl TradefedBinaryGenProperties {
    /// Property bag declaring a generator named `name`.
    pub fn to_properties(&self, name: &str) -> Properties {
        let mut props = Properties::new();
        props.insert("name".to_string(), Value::from(name));
        props.insert("short_name".to_string(), Value::from(self.short_name.as_str()));
        props.insert("full_name".to_string(), Value::from(self.full_name.as_str()));
        props.insert("version".to_string(), Value::from(self.version.as_str()));
        props
    }
}

#[derive(Debug)]
pub struct TradefedBinaryGen {
    properties: TradefedBinaryGenProperties,
    outputs: Vec<PathBuf>,
}

impl TradefedBinaryGen {
    pub fn properties(&self) -> &TradefedBinaryGenProperties {
        &self.properties
    }
}

pub fn tradefed_binary_gen_factory(props: Properties) -> Result<ModuleHandle> {
    let properties = properties::decode(&props)?;
    Ok(ModuleHandle::new(TradefedBinaryGen {
        properties,
        outputs: Vec::new(),
    }))
}

impl Module for TradefedBinaryGen {
    fn generate_build_actions(&mut self, ctx: &mut dyn ModuleContext) -> Result<()> {
        self.outputs.clear();

        let build_number_file = ctx.config().build_number_file()?.to_path_buf();
        let arch = ctx.config().device_primary_arch()?;

        let suite_info = path_for_module_out(&*ctx, SUITE_INFO_FILE);
        ctx.build(
            BuildParams::new(&TRADEFED_BINARY_GEN_RULE, &suite_info)
                .order_only(&build_number_file)
                .arg("buildNumberFile", build_number_file.to_string_lossy())
                .arg("arch", arch.as_str())
                .arg("name", self.properties.short_name.as_str())
                .arg("fullname", self.properties.full_name.as_str())
                .arg("version", self.properties.version.as_str()),
        )?;
        self.outputs.push(suite_info);

        if let Some(dynamic_config) =
            existent_path_for_source(&*ctx, ctx.module_dir(), DYNAMIC_CONFIG_FILE)
        {
            let module_name = ctx.module_name();
            let parent = module_name.strip_suffix(GEN_SUFFIX).unwrap_or(module_name);
            let copy = path_for_module_out(&*ctx, format!("{}.dynamic", parent));
            ctx.build(BuildParams::new(&CP, &copy).input(dynamic_config))?;
            self.outputs.push(copy);
        }

        Ok(())
    }

    fn as_source_file_producer(&self) -> Option<&dyn SourceFileProducer> {
        Some(self)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl SourceFileProducer for TradefedBinaryGen {
    fn srcs(&self) -> Vec<PathBuf> {
        self.outputs.clone()
    }
}
