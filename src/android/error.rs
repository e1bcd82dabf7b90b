//! Error types surfaced by the module framework.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while loading, resolving or generating modules.
#[derive(Debug, Error)]
pub enum BuildError {
    /// A declaration names a module type nobody registered.
    #[error("unrecognized module type \"{0}\"")]
    UnknownModuleType(String),

    /// A module type was registered twice.
    #[error("module type \"{0}\" is already registered")]
    DuplicateModuleType(String),

    /// Two modules share a name.
    #[error("module \"{name}\" already defined{}", .created_by.as_ref().map(|p| format!(" (created by \"{p}\")")).unwrap_or_default())]
    DuplicateModule {
        /// The contested module name.
        name: String,
        /// Module whose load hook synthesized the first definition, if any.
        created_by: Option<String>,
    },

    /// A required property is absent or empty.
    #[error("missing required property \"{0}\"")]
    MissingProperty(&'static str),

    /// A property could not be decoded or merged.
    #[error("invalid property \"{property}\": {reason}")]
    InvalidProperty {
        /// Property name (dotted for nested objects).
        property: String,
        /// What went wrong.
        reason: String,
    },

    /// A global configuration value needed at action time is unset.
    #[error("{0} is not configured")]
    MissingConfig(&'static str),

    /// A dependency names a module that does not exist.
    #[error("depends on undefined module \"{0}\"")]
    MissingDependency(String),

    /// A `:module` reference points at a module that produces no source files.
    #[error("module \"{0}\" is not a source file producer")]
    NotASourceFileProducer(String),

    /// Modules depend on each other in a loop.
    #[error("dependency cycle: {}", .0.join(" -> "))]
    DependencyCycle(Vec<String>),

    /// Two build edges produce the same file.
    #[error("multiple rules generate {}", .0.display())]
    DuplicateOutput(PathBuf),

    /// Build parameters do not fit their rule.
    #[error("rule \"{rule}\": {reason}")]
    InvalidBuildParams {
        /// Rule name.
        rule: &'static str,
        /// What went wrong.
        reason: String,
    },
}

/// A failure attributed to a single module.
#[derive(Debug, Error)]
#[error("module \"{module}\": {error:#}")]
pub struct ModuleError {
    /// Name of the offending module (or the declaration's name, when known).
    pub module: String,
    /// The underlying failure.
    pub error: anyhow::Error,
}

impl ModuleError {
    pub fn new(module: impl Into<String>, error: impl Into<anyhow::Error>) -> Self {
        Self {
            module: module.into(),
            error: error.into(),
        }
    }

    /// The underlying framework error, when the failure is one.
    pub fn build_error(&self) -> Option<&BuildError> {
        self.error.downcast_ref::<BuildError>()
    }
}

/// Every error collected while processing declarations.
#[derive(Debug)]
pub struct LoadError {
    pub errors: Vec<ModuleError>,
}

impl fmt::Display for LoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} declaration error(s)", self.errors.len())?;
        for error in &self.errors {
            write!(f, "\n  {}", error)?;
        }
        Ok(())
    }
}

impl std::error::Error for LoadError {}
