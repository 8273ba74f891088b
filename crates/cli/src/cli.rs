use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "frontdesk", author, version, about = "Fronting-history tracker and notifier", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Config file path
    #[arg(short, long, value_name = "FILE")]
    pub config_path: Option<String>,

    /// Enable debug logging
    #[arg(short, long)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the polling daemon (default)
    Run,

    /// Rebuild the presence map from the full switch history
    Rebuild,

    /// Refresh the system, member, and group snapshots
    Update,

    /// Log a switch-out upstream (clears the current fronters)
    SwitchOut,

    /// Generate sample configuration
    ConfigSample {
        /// Output path
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}
