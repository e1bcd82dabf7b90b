//! CLI command handlers.
//!
//! Each submodule handles a specific CLI command:
//! - `gen` - Write the ninja manifest
//! - `build` - Run the build graph
//! - `show` - Display information

pub mod build;
pub mod gen;
pub mod show;

pub use build::cmd_build;
pub use gen::cmd_gen;
pub use show::cmd_show;

/// Name of the manifest written under the output root.
pub const NINJA_FILE: &str = "build.ninja";
