//! Gen command - writes the ninja manifest.

use anyhow::Result;

use suite_harness::android::ninja;
use suite_harness::config::Config;

use super::NINJA_FILE;
use crate::timing::Timer;

/// Load the tree, generate build actions and write `<out>/build.ninja`.
pub fn cmd_gen(config: Config) -> Result<()> {
    let timer = Timer::start("generate");
    let manifest = config.out_dir.join(NINJA_FILE);

    let mut ctx = suite_harness::load_context(config)?;
    let graph = ctx.generate_build_actions()?;
    ninja::write_ninja_file(&graph, &manifest)?;

    tracing::info!(
        manifest = %manifest.display(),
        edges = graph.edges.len(),
        "wrote manifest"
    );
    timer.finish();
    Ok(())
}
