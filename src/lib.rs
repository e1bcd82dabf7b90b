//! suite-harness library exports.
//!
//! The binary drives these through `gen`, `build` and `show`; integration
//! tests use them directly.

pub mod android;
pub mod cache;
pub mod config;
pub mod java;
pub mod process;
pub mod tradefed;

use anyhow::Result;

use android::{blueprint, default_registry, Context};
use config::Config;

/// Load every declaration under the source root and resolve dependencies.
pub fn load_context(config: Config) -> Result<Context> {
    let registry = default_registry()?;
    let declarations = blueprint::discover(&config.src_dir)?;
    tracing::info!(
        declarations = declarations.len(),
        src = %config.src_dir.display(),
        "discovered declarations"
    );

    let mut ctx = Context::new(config);
    ctx.load(&registry, declarations)?;
    ctx.resolve_dependencies()?;
    Ok(ctx)
}
