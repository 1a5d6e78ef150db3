//! CLI parse: clap types for paneline. No behavior; definitions only.

use crate::location::Target;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// paneline - template-driven status segments for terminal multiplexers
#[derive(Parser)]
#[command(name = "paneline")]
#[command(about = "Render status segments from pluggable operations and persisted state")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Configuration file path (replaces the global config file)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging (default: off)
    #[arg(long, global = true, default_value = "false")]
    pub verbose: bool,

    /// Log level (trace, debug, info, warn, error, off)
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Log format (json, text)
    #[arg(long, global = true)]
    pub log_format: Option<String>,

    /// Log output (stdout, stderr, file)
    #[arg(long, global = true)]
    pub log_output: Option<String>,

    /// Log file path (when output is "file")
    #[arg(long, global = true)]
    pub log_file: Option<PathBuf>,
}

/// Which location instance a command runs against
#[derive(Args, Debug, Clone, PartialEq, Eq)]
pub struct TargetArgs {
    /// Location key from the config (e.g. "pane")
    pub location: String,
    /// Instance key (e.g. "$1.%3" for a tmux pane)
    pub instance: String,
    /// Filesystem path the instance is looking at
    pub path: PathBuf,
}

impl TargetArgs {
    pub fn target(&self) -> Target {
        Target::new(
            self.location.as_str(),
            self.instance.as_str(),
            self.path.clone(),
        )
    }
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Render a location's template for one instance
    Generate(TargetArgs),
    /// Refresh and persist state for one instance, then run post commands
    Update(TargetArgs),
    /// Run `update` in a detached background process and return immediately
    StartUpdate(TargetArgs),
    /// Overwrite one state record, then run post commands
    SetState {
        location: String,
        instance: String,
        operation: String,
        value: String,
    },
    /// Print one state record
    GetState {
        location: String,
        instance: String,
        operation: String,
    },
    /// List registered operations
    Operations {
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
}
