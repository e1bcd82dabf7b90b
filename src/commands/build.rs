//! Build command - runs every stale build edge.

use anyhow::Result;

use suite_harness::android::executor;
use suite_harness::config::Config;

use crate::timing::Timer;

/// Load the tree, generate build actions and execute them.
pub fn cmd_build(config: Config) -> Result<()> {
    let timer = Timer::start("build");

    let mut ctx = suite_harness::load_context(config)?;
    let graph = ctx.generate_build_actions()?;
    let report = executor::execute(&graph, ctx.config())?;

    for output in &report.ran {
        println!("  built {}", output.display());
    }
    println!(
        "{} built, {} up to date",
        report.ran.len(),
        report.up_to_date.len()
    );
    timer.finish();
    Ok(())
}
