//! Command-line interface definition.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// dashagenda - Upcoming calendar events as a fixed-height text block
#[derive(Debug, Parser)]
#[command(name = "dashagenda")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(long, short, global = true, env = "DASHAGENDA_CONFIG")]
    pub config: Option<PathBuf>,

    /// Enable debug output
    #[arg(long, short = 'v', global = true)]
    pub debug: bool,

    /// Path to the server socket
    #[arg(long, global = true, env = "DASHAGENDA_SOCKET")]
    pub socket_path: Option<PathBuf>,

    /// Connection timeout in seconds
    #[arg(long, global = true)]
    pub timeout: Option<u64>,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// Returns true when the process will run as the long-lived daemon.
    pub fn is_server(&self) -> bool {
        matches!(self.command, Command::Server { .. })
    }
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Start the agenda server in the foreground
    Server {
        /// Directory holding one `<calendar_id>.json` file per calendar
        #[arg(long)]
        events_dir: Option<PathBuf>,
    },

    /// Fetch the agenda from the running server and print it
    Get {
        /// Line budget for this agenda
        #[arg(long, value_parser = parse_line_budget)]
        max_lines: Option<usize>,
    },

    /// Render an events file without a server
    Render {
        /// Events file (`{"items": [...]}`)
        #[arg(long, short)]
        file: PathBuf,

        /// Line budget for this agenda
        #[arg(long, value_parser = parse_line_budget)]
        max_lines: Option<usize>,
    },

    /// Show server status
    Status,

    /// Configuration commands
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Configuration actions.
#[derive(Debug, Subcommand)]
pub enum ConfigAction {
    /// Dump current configuration
    Dump,

    /// Validate configuration
    Validate,

    /// Show configuration file path
    Path,
}

fn parse_line_budget(value: &str) -> Result<usize, String> {
    match value.parse::<usize>() {
        Ok(0) => Err("must be at least 1".to_string()),
        Ok(n) => Ok(n),
        Err(e) => Err(e.to_string()),
    }
}
