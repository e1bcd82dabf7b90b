//! Declaration files.
//!
//! Modules are declared in `Blueprints.json` files anywhere under the source
//! root:
//!
//! ```text
//! {
//!   "modules": [
//!     { "type": "tradefed_binary_host", "name": "cts-tradefed", "short_name": "cts", ... }
//!   ]
//! }
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;
use walkdir::WalkDir;

use super::properties::Properties;

/// File name the source tree is scanned for.
pub const BLUEPRINT_FILE_NAME: &str = "Blueprints.json";

/// One module declaration.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Declaration {
    #[serde(rename = "type")]
    pub module_type: String,
    /// Every property other than `type`, including `name`.
    #[serde(flatten)]
    pub properties: Properties,
    /// Directory of the declaring file, relative to the source root.
    #[serde(skip)]
    pub dir: PathBuf,
}

impl Declaration {
    pub fn new(module_type: &str, dir: impl Into<PathBuf>, properties: Properties) -> Self {
        Self {
            module_type: module_type.to_string(),
            properties,
            dir: dir.into(),
        }
    }

    /// The declared `name`, if it is a string.
    pub fn name(&self) -> Option<&str> {
        self.properties.get("name").and_then(|v| v.as_str())
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct BlueprintFile {
    #[serde(default)]
    modules: Vec<Declaration>,
}

/// Parse one declaration file whose directory is `dir` (relative to the source root).
pub fn parse(content: &str, dir: &Path) -> Result<Vec<Declaration>> {
    let file: BlueprintFile = serde_json::from_str(content)?;
    Ok(file
        .modules
        .into_iter()
        .map(|mut decl| {
            decl.dir = dir.to_path_buf();
            decl
        })
        .collect())
}

/// Find and parse every declaration file under `src_dir`.
///
/// Files are visited in sorted path order so the declaration order is stable.
pub fn discover(src_dir: &Path) -> Result<Vec<Declaration>> {
    let mut declarations = Vec::new();

    let walker = WalkDir::new(src_dir)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !is_hidden(e.file_name()));

    for entry in walker {
        let entry = entry.with_context(|| format!("walking {}", src_dir.display()))?;
        if !entry.file_type().is_file() || entry.file_name() != BLUEPRINT_FILE_NAME {
            continue;
        }

        let path = entry.path();
        let dir = path
            .parent()
            .and_then(|p| p.strip_prefix(src_dir).ok())
            .unwrap_or_else(|| Path::new(""));
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let parsed =
            parse(&content, dir).with_context(|| format!("Failed to parse {}", path.display()))?;

        tracing::debug!(file = %path.display(), modules = parsed.len(), "parsed declarations");
        declarations.extend(parsed);
    }

    Ok(declarations)
}

fn is_hidden(name: &std::ffi::OsStr) -> bool {
    name.to_str().is_some_and(|s| s.starts_with('.') && s.len() > 1)
}
