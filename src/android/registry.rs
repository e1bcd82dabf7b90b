//! Module type registry.

use std::collections::BTreeMap;

use super::error::BuildError;
use super::module::ModuleFactory;

/// Maps module type names (as written in declarations) to factories.
#[derive(Debug, Default, Clone)]
pub struct ModuleTypeRegistry {
    types: BTreeMap<&'static str, ModuleFactory>,
}

impl ModuleTypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, name: &'static str, factory: ModuleFactory) -> Result<(), BuildError> {
        if self.types.contains_key(name) {
            return Err(BuildError::DuplicateModuleType(name.to_string()));
        }
        self.types.insert(name, factory);
        Ok(())
    }

    pub fn factory(&self, name: &str) -> Result<ModuleFactory, BuildError> {
        self.types
            .get(name)
            .copied()
            .ok_or_else(|| BuildError::UnknownModuleType(name.to_string()))
    }

    /// Registered type names, sorted.
    pub fn type_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.types.keys().copied()
    }
}

/// Registry with every module type this crate provides.
pub fn default_registry() -> Result<ModuleTypeRegistry, BuildError> {
    let mut registry = ModuleTypeRegistry::new();
    crate::java::register(&mut registry)?;
    crate::tradefed::register(&mut registry)?;
    Ok(registry)
}
