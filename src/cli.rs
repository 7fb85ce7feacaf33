//! CLI argument parsing for gridtrace
//!
//! Global flags: --network, --config, --format, --quiet, --verbose

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use clap::{Parser, Subcommand, ValueEnum};

use gridtrace_core::error::TraceError;
use gridtrace_core::network::FeederDirection;
use gridtrace_core::trace::NetworkState;

/// Gridtrace - feeder direction and membership tracing for distribution networks
#[derive(Parser, Debug)]
#[command(name = "gridtrace")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Network fixture (JSON) to load
    #[arg(long, global = true, env = "GRIDTRACE_NETWORK")]
    pub network: Option<PathBuf>,

    /// Tracing configuration (TOML)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Output format
    #[arg(long, global = true, default_value = "human", value_parser = parse_format)]
    pub format: OutputFormat,

    /// Suppress non-essential output
    #[arg(long, short, global = true)]
    pub quiet: bool,

    /// Enable debug logging
    #[arg(long, short, global = true)]
    pub verbose: bool,

    /// Log level filter (e.g. debug, or gridtrace_core=trace)
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    pub log_json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Apply directions and feeder membership, then print a summary
    Process,

    /// Trace from an equipment and list the equipment reached
    Trace {
        /// Equipment mRID to start from
        #[arg(long)]
        from: String,

        /// Network state to trace
        #[arg(long, default_value = "normal")]
        state: NetworkState,

        /// Only follow steps moving with this flow
        #[arg(long, value_enum, default_value = "any")]
        flow: Flow,

        /// Stop after moving onto this many equipment
        #[arg(long)]
        max_steps: Option<u32>,
    },

    /// Clear directions around a terminal and re-apply them from the heads reached
    ClearDirection {
        /// Terminal mRID
        terminal: String,

        /// Network state to update
        #[arg(long, default_value = "normal")]
        state: NetworkState,
    },

    /// Remove a direction from a terminal, keeping multi-fed equipment directed
    RemoveDirection {
        /// Terminal mRID
        terminal: String,

        /// Direction to remove (none removes everything the terminal holds)
        #[arg(long, default_value = "none")]
        direction: FeederDirection,

        /// Network state to update
        #[arg(long, default_value = "normal")]
        state: NetworkState,
    },
}

/// Direction filter for `trace`
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Flow {
    Downstream,
    Upstream,
    Any,
}

impl Flow {
    pub fn as_str(self) -> &'static str {
        match self {
            Flow::Downstream => "downstream",
            Flow::Upstream => "upstream",
            Flow::Any => "any",
        }
    }
}

/// Output format for command results
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// Human-readable output (default)
    #[default]
    Human,
    /// JSON output for machine consumption
    Json,
}

impl FromStr for OutputFormat {
    type Err = TraceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "human" => Ok(OutputFormat::Human),
            "json" => Ok(OutputFormat::Json),
            other => Err(TraceError::UnknownFormat(other.to_string())),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputFormat::Human => write!(f, "human"),
            OutputFormat::Json => write!(f, "json"),
        }
    }
}

fn parse_format(s: &str) -> Result<OutputFormat, String> {
    s.parse().map_err(|e: TraceError| e.to_string())
}
