//! suite-harness - expands test-suite launcher declarations into a build graph.
//!
//! Reads every `Blueprints.json` under the source root, expands
//! `tradefed_binary_host` launchers into their generator modules, and either
//! writes a ninja manifest (`gen`) or runs the graph itself (`build`).

mod commands;
mod timing;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use suite_harness::config::Config;

#[derive(Parser)]
#[command(name = "suite-harness")]
#[command(about = "Test-suite launcher build graph generator")]
#[command(
    after_help = "QUICK START:\n  suite-harness show config   Check configuration\n  suite-harness gen           Write out/build.ninja\n  suite-harness build         Build every launcher"
)]
struct Cli {
    /// Directory holding `.env` and relative paths (default: current directory)
    #[arg(long, global = true)]
    base_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write the ninja manifest to <OUT_DIR>/build.ninja
    Gen,

    /// Run every stale build edge
    Build,

    /// Show information
    Show {
        #[command(subcommand)]
        what: ShowTarget,
    },
}

#[derive(Subcommand)]
enum ShowTarget {
    /// Show current configuration
    Config,
    /// List modules, including those created by load hooks
    Modules,
    /// Print the manifest without writing it
    Graph,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let cli = Cli::parse();
    let base_dir = match cli.base_dir {
        Some(dir) => dir,
        None => std::env::current_dir()?,
    };

    // Load .env if present
    let config = Config::load(&base_dir)?;

    match cli.command {
        Commands::Gen => commands::cmd_gen(config)?,
        Commands::Build => commands::cmd_build(config)?,
        Commands::Show { what } => {
            let show_target = match what {
                ShowTarget::Config => commands::show::ShowTarget::Config,
                ShowTarget::Modules => commands::show::ShowTarget::Modules,
                ShowTarget::Graph => commands::show::ShowTarget::Graph,
            };
            commands::cmd_show(show_target, config)?;
        }
    }

    Ok(())
}
