//! Trade Federation launcher module types.

pub mod binary;
pub mod gen;

pub use binary::{
    gen_module_name, tradefed_binary_factory, TradefedBinaryProperties, GEN_SUFFIX, REQUIRED_LIBS,
};
pub use gen::{
    TradefedBinaryGen, TradefedBinaryGenProperties, DYNAMIC_CONFIG_FILE, SUITE_INFO_FILE,
    TRADEFED_BINARY_GEN_RULE,
};

use crate::android::{BuildError, ModuleTypeRegistry};

pub const TRADEFED_BINARY_HOST: &str = "tradefed_binary_host";

/// Register `tradefed_binary_host`. The generator type is only reachable
/// through the launcher's load hook.
pub fn register(registry: &mut ModuleTypeRegistry) -> Result<(), BuildError> {
    registry.register(TRADEFED_BINARY_HOST, tradefed_binary_factory)
}
