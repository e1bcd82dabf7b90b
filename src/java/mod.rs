//! Java module types.

pub mod binary;

pub use binary::{binary_host_factory, BinaryHost, BinaryHostProperties};

use crate::android::{BuildError, ModuleTypeRegistry};

pub const JAVA_BINARY_HOST: &str = "java_binary_host";

pub fn register(registry: &mut ModuleTypeRegistry) -> Result<(), BuildError> {
    registry.register(JAVA_BINARY_HOST, binary_host_factory)
}
