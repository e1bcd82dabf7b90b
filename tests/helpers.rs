//! Shared test utilities for suite-harness tests.

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use serde_json::Value;
use suite_harness::android::{BuildGraph, Context};
use suite_harness::config::{Arch, Config};
use tempfile::TempDir;

/// Build number every fresh environment starts with.
pub const BUILD_NUMBER: &str = "1234";

/// Test environment with a temporary source tree and output root.
pub struct TestEnv {
    /// Temporary directory (kept alive for lifetime of TestEnv)
    pub _temp_dir: TempDir,
    /// Source root holding `Blueprints.json` files
    pub src: PathBuf,
    /// Output root
    pub out: PathBuf,
    /// File the suite-info rule reads the build number from
    pub build_number_file: PathBuf,
}

impl TestEnv {
    /// Create a new test environment with temporary directories.
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let base = temp_dir.path();

        let src = base.join("src");
        let out = base.join("out");
        let build_number_file = base.join("build_number.txt");

        fs::create_dir_all(&src).expect("Failed to create src dir");
        fs::write(&build_number_file, format!("{}\n", BUILD_NUMBER))
            .expect("Failed to write build number");

        Self {
            _temp_dir: temp_dir,
            src,
            out,
            build_number_file,
        }
    }

    /// Fully configured build: arm64, platform version "12", and library
    /// dependencies outside the tree tolerated.
    pub fn config(&self) -> Config {
        let mut config = Config::new(&self.src, &self.out);
        config.platform_version_name = "12".to_string();
        config.build_number_file = Some(self.build_number_file.clone());
        config.device_primary_arch = Some(Arch::Arm64);
        config.allow_missing_dependencies = true;
        config
    }

    /// Write `src/<dir>/Blueprints.json` declaring `modules`.
    pub fn write_blueprint(&self, dir: &str, modules: Value) {
        let path = self.src.join(dir).join("Blueprints.json");
        fs::create_dir_all(path.parent().unwrap()).expect("Failed to create blueprint dir");
        let content = serde_json::json!({ "modules": modules });
        fs::write(&path, serde_json::to_string_pretty(&content).unwrap())
            .expect("Failed to write blueprint");
    }

    /// Write a source file relative to the source root.
    pub fn write_source(&self, rel: &str, content: &str) {
        let path = self.src.join(rel);
        fs::create_dir_all(path.parent().unwrap()).expect("Failed to create source dir");
        fs::write(&path, content).expect("Failed to write source file");
    }

    pub fn set_build_number(&self, number: &str) {
        fs::write(&self.build_number_file, format!("{}\n", number))
            .expect("Failed to write build number");
    }

    pub fn out_path(&self, rel: &str) -> PathBuf {
        self.out.join(rel)
    }
}

/// Load the tree with `config` and generate its build graph.
pub fn generate(config: Config) -> (Context, BuildGraph) {
    let mut ctx = suite_harness::load_context(config).expect("load failed");
    let graph = ctx
        .generate_build_actions()
        .expect("action generation failed");
    (ctx, graph)
}

/// A standard `cts-tradefed` launcher declaration.
pub fn cts_launcher() -> Value {
    serde_json::json!({
        "type": "tradefed_binary_host",
        "name": "cts-tradefed",
        "short_name": "cts",
        "full_name": "Compat Test Suite",
        "version": "11_r3",
    })
}

pub fn read(path: &Path) -> String {
    fs::read_to_string(path)
        .unwrap_or_else(|e| panic!("Failed to read {}: {}", path.display(), e))
}
