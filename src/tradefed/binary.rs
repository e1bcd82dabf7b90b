//! `tradefed_binary_host`: a `java_binary_host` launching a test suite.
//!
//! The declaration is expanded while loading. A sibling `<name>-gen` module
//! is created to write the suite-info properties file (and copy
//! `DynamicConfig.xml` when there is one), and the binary itself picks up the
//! tradefed libraries plus a `:<name>-gen` resource reference.

use anyhow::Result;
use serde_json::Value;

use super::gen::{tradefed_binary_gen_factory, TradefedBinaryGenProperties};
use crate::android::properties;
use crate::android::{BuildError, LoadHookContext, ModuleHandle, Properties};
use crate::java::binary_host_factory;

/// Suffix appended to the launcher name to name its generator.
pub const GEN_SUFFIX: &str = "-gen";

/// Libraries every launcher links against.
pub const REQUIRED_LIBS: &[&str] = &[
    "tradefed",
    "tradefed-test-framework",
    "loganalysis",
    "hosttestlib",
    "compatibility-host-util",
];

/// Characters the suite-info rule cannot carry inside its quoted `echo`s.
const UNSAFE_FIELD_CHARS: &[char] = &['"', '$', '`', '\\', '\n'];

/// Launcher fields of a `tradefed_binary_host` declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TradefedBinaryProperties {
    pub short_name: String,
    pub full_name: String,
    pub version: String,
    /// Prefix `version` with the platform version name.
    pub prepend_platform_version: bool,
}

impl TradefedBinaryProperties {
    /// Remove the launcher fields from `props`, leaving the host binary's.
    pub fn take_from(props: &mut Properties) -> Result<Self, BuildError> {
        let short_name = take_field(props, "short_name")?;
        let full_name = take_field(props, "full_name")?;
        let version = take_field(props, "version")?;
        let prepend = properties::take_bool(props, "prepend_platform_version")?;
        let prepend_alias = properties::take_bool(props, "prepend_platform_version_name")?;

        Ok(Self {
            short_name,
            full_name,
            version,
            prepend_platform_version: prepend || prepend_alias,
        })
    }

    pub fn effective_version(&self, platform_version_name: &str) -> String {
        if self.prepend_platform_version {
            format!("{}{}", platform_version_name, self.version)
        } else {
            self.version.clone()
        }
    }
}

/// A required launcher field that is safe to substitute into the rule command.
fn take_field(props: &mut Properties, key: &'static str) -> Result<String, BuildError> {
    let value = properties::take_required_string(props, key)?;
    if let Some(c) = value.chars().find(|c| UNSAFE_FIELD_CHARS.contains(c)) {
        return Err(BuildError::InvalidProperty {
            property: key.to_string(),
            reason: format!("{:?} is not allowed in {:?}", c, value),
        });
    }
    Ok(value)
}

/// Name of the generator created for launcher `name`.
pub fn gen_module_name(name: &str) -> String {
    format!("{}{}", name, GEN_SUFFIX)
}

/// Factory registered as `tradefed_binary_host`.
pub fn tradefed_binary_factory(mut props: Properties) -> Result<ModuleHandle> {
    let tfb = TradefedBinaryProperties::take_from(&mut props)?;
    let mut handle = binary_host_factory(props)?;
    handle.add_load_hook(move |ctx| tradefed_binary_load_hook(&tfb, ctx));
    Ok(handle)
}

/// Create the generator sibling and extend the binary's libs and resources.
pub fn tradefed_binary_load_hook(
    tfb: &TradefedBinaryProperties,
    ctx: &mut dyn LoadHookContext,
) -> Result<()> {
    let gen_name = gen_module_name(ctx.module_name());
    let version = tfb.effective_version(ctx.config().platform_version_name());

    tracing::debug!(module = %ctx.module_name(), gen = %gen_name, %version, "expanding tradefed binary");

    let gen = TradefedBinaryGenProperties {
        short_name: tfb.short_name.clone(),
        full_name: tfb.full_name.clone(),
        version,
    };
    ctx.create_module(tradefed_binary_gen_factory, gen.to_properties(&gen_name))?;

    let mut extra = Properties::new();
    extra.insert(
        "libs".to_string(),
        Value::Array(REQUIRED_LIBS.iter().map(|&l| Value::from(l)).collect()),
    );
    extra.insert(
        "java_resources".to_string(),
        Value::Array(vec![Value::String(format!(":{}", gen_name))]),
    );
    ctx.append_properties(extra)
}
