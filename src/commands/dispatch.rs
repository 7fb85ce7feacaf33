//! Command dispatch logic for gridtrace

use std::time::Instant;

use gridtrace_core::bail_usage;
use gridtrace_core::config::TraceConfig;
use gridtrace_core::error::Result;
use gridtrace_core::network::Network;
use gridtrace_core::processing::run_post_load;

use crate::cli::{Cli, Commands};
use crate::commands;
use crate::snapshot;

/// Load the network, run post-load processing, then run the command.
pub fn run(cli: &Cli, start: Instant) -> Result<()> {
    let config = load_config(cli)?;
    let mut network = load_network(cli)?;
    tracing::debug!(elapsed = ?start.elapsed(), "load_network");

    let summary = run_post_load(&mut network, &config)?;
    tracing::debug!(elapsed = ?start.elapsed(), "post_load");

    match &cli.command {
        Commands::Process => commands::process::execute(cli, &summary),

        Commands::Trace {
            from,
            state,
            flow,
            max_steps,
        } => commands::trace::execute(cli, &mut network, from, *state, *flow, *max_steps),

        Commands::ClearDirection { terminal, state } => {
            commands::direction::execute_clear(cli, &mut network, terminal, *state)
        }

        Commands::RemoveDirection {
            terminal,
            direction,
            state,
        } => commands::direction::execute_remove(cli, &mut network, terminal, *direction, *state),
    }
}

fn load_config(cli: &Cli) -> Result<TraceConfig> {
    match &cli.config {
        Some(path) => TraceConfig::load(path),
        None => Ok(TraceConfig::default()),
    }
}

fn load_network(cli: &Cli) -> Result<Network> {
    let Some(path) = &cli.network else {
        bail_usage!("--network <FILE> is required");
    };
    snapshot::load(path)
}
