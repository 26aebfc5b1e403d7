//! CLI command definitions

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Output format for session results
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Formatted transcript and action items
    Text,
    /// JSON output
    Json,
}

/// CLI arguments for roundtable
#[derive(Parser, Debug)]
#[command(name = "roundtable")]
#[command(author, version, about = "Round-robin deliberation between LLM agents")]
#[command(long_about = r#"
Roundtable runs a deliberation session: a fixed set of LLM agents take turns
on a topic for a bounded number of rounds, then a synthesis step condenses the
discussion into action items.

Sessions, agents and provider profiles are read from the JSON record store
(--store, or [store] path in the configuration).

Configuration is loaded from (in priority order):
1. ROUNDTABLE_* environment variables
2. --config <path>          Explicit config file
3. ./roundtable.toml        Project-level config
4. ~/.config/roundtable/config.toml   Global config

Example:
  roundtable start weekly-sync
  roundtable show weekly-sync -o json
  roundtable cancel weekly-sync
"#)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text", global = true)]
    pub output: OutputFormat,

    /// Verbosity level (-v = info, -vv = debug, -vvv = trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress progress indicators
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Path to the JSON record store
    #[arg(long, value_name = "PATH", global = true)]
    pub store: Option<PathBuf>,

    /// Directory for daily diagnostic log files
    #[arg(long, value_name = "DIR", global = true)]
    pub log_dir: Option<PathBuf>,

    /// Path to configuration file
    #[arg(long, value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,

    /// Disable loading of configuration files
    #[arg(long, global = true)]
    pub no_config: bool,

    /// Show configuration file locations and exit
    #[arg(long)]
    pub show_config: bool,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Run a draft session, or resume a running one
    Start {
        session_id: String,

        /// Call all agents of a round at once
        #[arg(long)]
        concurrent: bool,
    },
    /// Request cancellation of a running session
    Cancel { session_id: String },
    /// Print a session's transcript and action items
    Show { session_id: String },
}
