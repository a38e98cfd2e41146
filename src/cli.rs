// ABOUTME: Command-line interface definition using clap derive macros.
// ABOUTME: Defines all subcommands and their arguments.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::output::OutputMode;

#[derive(Parser)]
#[command(name = "tagpull")]
#[command(about = "Resolve version-ranged image tags and pull them with live progress")]
#[command(version)]
pub struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Print only results, no progress
    #[arg(short, long, global = true, conflicts_with = "json")]
    pub quiet: bool,

    /// Emit JSON lines for scripting
    #[arg(long, global = true)]
    pub json: bool,

    /// Config file (defaults to tagpull.yml in the working directory)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    pub fn output_mode(&self) -> OutputMode {
        if self.json {
            OutputMode::Json
        } else if self.quiet {
            OutputMode::Quiet
        } else {
            OutputMode::Normal
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a new tagpull.yml configuration file
    Init {
        /// Overwrite an existing file
        #[arg(short, long)]
        force: bool,
    },

    /// Print the concrete tag an image reference resolves to
    Resolve {
        /// Image reference, e.g. nginx:~1.x or redis:*
        image: String,

        /// Ignore local images and ask the registry
        #[arg(short, long)]
        force: bool,
    },

    /// Resolve and pull an image, showing progress
    Pull {
        /// Image reference, e.g. nginx:~1.x or redis:*
        image: String,

        /// Ignore local images and ask the registry
        #[arg(short, long)]
        force: bool,
    },

    /// Print the engine's bridge gateway address
    BridgeIp,
}
