//! Show command - displays information.

use anyhow::Result;

use suite_harness::android::ninja;
use suite_harness::config::Config;

/// Show target for the show command.
pub enum ShowTarget {
    /// Show configuration
    Config,
    /// List loaded modules
    Modules,
    /// Print the manifest that `gen` would write
    Graph,
}

/// Execute the show command.
pub fn cmd_show(target: ShowTarget, config: Config) -> Result<()> {
    match target {
        ShowTarget::Config => config.print(),
        ShowTarget::Modules => {
            let ctx = suite_harness::load_context(config)?;
            for info in ctx.modules() {
                let kind = match (&info.type_name, &info.created_by) {
                    (Some(t), _) => t.clone(),
                    (None, Some(parent)) => format!("created by {}", parent),
                    (None, None) => "-".to_string(),
                };
                println!("{:<32} {:<28} {}", info.name, kind, info.dir.display());
                for dep in &info.deps {
                    println!("    {:?} {}", dep.tag, dep.name);
                }
            }
        }
        ShowTarget::Graph => {
            let mut ctx = suite_harness::load_context(config)?;
            let graph = ctx.generate_build_actions()?;
            print!("{}", ninja::write_ninja(&graph));
        }
    }
    Ok(())
}
