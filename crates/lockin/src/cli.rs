use clap::{Parser, Subcommand};
use std::net::SocketAddr;
use std::path::PathBuf;

use crate::level::LockinLevel;

/// Lockin – locked-in meter and chat webhook relay
#[derive(Parser, Debug)]
#[command(name = "lockin", author, version, about, long_about = None)]
pub struct Cli {
    /// Activate verbose output (-v, -vv, etc.)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Sets a custom config file
    #[arg(short, long, value_name = "FILE", global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the webhook relay and the meter page
    Serve {
        /// Listen address (overrides [server].bind)
        #[arg(short, long)]
        bind: Option<SocketAddr>,
    },
    /// Submit a lock-in level through the relay
    Submit {
        /// Lock-in level, 0-100
        #[arg(short, long)]
        level: LockinLevel,

        /// Full relay URL (overrides [client].endpoint)
        #[arg(short, long)]
        endpoint: Option<String>,
    },
    /// Print the notification payload for a level
    Preview {
        /// Lock-in level, 0-100
        #[arg(short, long)]
        level: LockinLevel,
    },
    /// Show the level bands with their labels and messages
    Levels,
    /// Print build information
    Version {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}
