use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "cropsync",
    version,
    about = "Pick a crop and tune its irrigation thresholds"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Path to config.yaml
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Override local storage directory
    #[arg(short, long)]
    pub data_dir: Option<PathBuf>,

    /// Increase log verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run interactive setup
    Init,
    /// Validate config and test the catalog connection
    Check,
    /// List crops with local edits applied
    List,
    /// Show the selected crop
    Show,
    /// Select a crop by id
    Select { id: i64 },
    /// Change a threshold of the selected crop (e.g. minTemperature 18)
    Edit { field: String, value: String },
    /// Save the daily irrigation window for a crop (HH:MM)
    Schedule {
        id: i64,
        start: String,
        end: String,
    },
    /// Confirm the selected crop for use
    Commit,
    /// Create an account
    Register,
}
