//! Global build configuration.
//!
//! Reads configuration from .env file and environment variables.
//! Environment variables take precedence over .env file.

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::Result;

use crate::android::BuildError;

/// Default output directory, relative to the base directory.
pub const DEFAULT_OUT_DIR: &str = "out";

/// Device CPU architecture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Arch {
    Arm,
    Arm64,
    X86,
    X86_64,
    Riscv64,
}

impl Arch {
    pub fn as_str(&self) -> &'static str {
        match self {
            Arch::Arm => "arm",
            Arch::Arm64 => "arm64",
            Arch::X86 => "x86",
            Arch::X86_64 => "x86_64",
            Arch::Riscv64 => "riscv64",
        }
    }
}

impl fmt::Display for Arch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Arch {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "arm" => Ok(Arch::Arm),
            "arm64" => Ok(Arch::Arm64),
            "x86" => Ok(Arch::X86),
            "x86_64" => Ok(Arch::X86_64),
            "riscv64" => Ok(Arch::Riscv64),
            other => anyhow::bail!(
                "unknown architecture '{}' (expected arm, arm64, x86, x86_64 or riscv64)",
                other
            ),
        }
    }
}

/// Build configuration shared by every module.
#[derive(Debug, Clone)]
pub struct Config {
    /// Platform version name prepended to suite versions on request (e.g. "12").
    pub platform_version_name: String,
    /// File holding the build number, read when rules execute.
    pub build_number_file: Option<PathBuf>,
    /// Primary device architecture.
    pub device_primary_arch: Option<Arch>,
    /// Root of the source tree (Blueprints.json files live under it).
    pub src_dir: PathBuf,
    /// Root of the output tree.
    pub out_dir: PathBuf,
    /// Downgrade unknown library dependencies to warnings.
    pub allow_missing_dependencies: bool,
}

impl Config {
    /// Load configuration from .env file and environment.
    ///
    /// Relative paths resolve against `base_dir`.
    pub fn load(base_dir: &Path) -> Result<Self> {
        let mut env_vars = HashMap::new();

        let env_path = base_dir.join(".env");
        if env_path.exists() {
            for item in dotenvy::from_path_iter(&env_path)? {
                let (key, value) = item?;
                env_vars.insert(key, value);
            }
        }

        // Environment variables override .env file
        for (key, value) in std::env::vars() {
            env_vars.insert(key, value);
        }

        let resolve = |value: &str| {
            let path = PathBuf::from(value);
            if path.is_absolute() {
                path
            } else {
                base_dir.join(path)
            }
        };

        let platform_version_name = env_vars
            .get("PLATFORM_VERSION_NAME")
            .cloned()
            .unwrap_or_default();

        let build_number_file = env_vars
            .get("BUILD_NUMBER_FILE")
            .filter(|s| !s.is_empty())
            .map(|s| resolve(s));

        let device_primary_arch = env_vars
            .get("TARGET_ARCH")
            .filter(|s| !s.is_empty())
            .map(|s| s.parse::<Arch>())
            .transpose()?;

        let src_dir = env_vars
            .get("SOURCE_DIR")
            .map(|s| resolve(s))
            .unwrap_or_else(|| base_dir.to_path_buf());

        let out_dir = resolve(
            env_vars
                .get("OUT_DIR")
                .map(String::as_str)
                .unwrap_or(DEFAULT_OUT_DIR),
        );

        let allow_missing_dependencies = env_vars
            .get("ALLOW_MISSING_DEPENDENCIES")
            .is_some_and(|v| v == "true" || v == "1");

        Ok(Self {
            platform_version_name,
            build_number_file,
            device_primary_arch,
            src_dir,
            out_dir,
            allow_missing_dependencies,
        })
    }

    /// Create a configuration rooted at `src_dir` with `out_dir` as output root.
    ///
    /// Build number file and architecture are left unset.
    pub fn new(src_dir: &Path, out_dir: &Path) -> Self {
        Self {
            platform_version_name: String::new(),
            build_number_file: None,
            device_primary_arch: None,
            src_dir: src_dir.to_path_buf(),
            out_dir: out_dir.to_path_buf(),
            allow_missing_dependencies: false,
        }
    }

    pub fn platform_version_name(&self) -> &str {
        &self.platform_version_name
    }

    /// Path of the build number file. Fails if it was never configured.
    pub fn build_number_file(&self) -> Result<&Path, BuildError> {
        self.build_number_file
            .as_deref()
            .ok_or(BuildError::MissingConfig("BUILD_NUMBER_FILE"))
    }

    /// Primary device architecture. Fails if it was never configured.
    pub fn device_primary_arch(&self) -> Result<Arch, BuildError> {
        self.device_primary_arch
            .ok_or(BuildError::MissingConfig("TARGET_ARCH"))
    }

    /// Print configuration for debugging.
    pub fn print(&self) {
        println!("Configuration:");
        println!("  PLATFORM_VERSION_NAME: {}", self.platform_version_name);
        match &self.build_number_file {
            Some(path) => println!("  BUILD_NUMBER_FILE: {}", path.display()),
            None => println!("  BUILD_NUMBER_FILE: NOT SET"),
        }
        match self.device_primary_arch {
            Some(arch) => println!("  TARGET_ARCH: {}", arch),
            None => println!("  TARGET_ARCH: NOT SET"),
        }
        println!("  SOURCE_DIR: {}", self.src_dir.display());
        println!("  OUT_DIR: {}", self.out_dir.display());
        println!(
            "  ALLOW_MISSING_DEPENDENCIES: {}",
            self.allow_missing_dependencies
        );
    }
}
