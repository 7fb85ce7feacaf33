//! `gridtrace clear-direction` and `gridtrace remove-direction` commands
//!
//! Both edit directions after post-load processing and report the terminals
//! whose direction changed.

use std::collections::BTreeMap;

use serde::Serialize;

use gridtrace_core::bail_not_found;
use gridtrace_core::direction::{ClearDirection, RemoveDirection, SetDirection};
use gridtrace_core::error::{Result, TraceError};
use gridtrace_core::network::{FeederDirection, Network};
use gridtrace_core::trace::{NetworkState, NetworkStateOperators};

use crate::cli::{Cli, OutputFormat};

#[derive(Debug, Serialize)]
struct DirectionChange {
    terminal: String,
    before: String,
    after: String,
}

/// Clear around `terminal`, then re-apply from the start (if it is a head)
/// and from every head the clear reached.
pub fn execute_clear(
    cli: &Cli,
    network: &mut Network,
    terminal: &str,
    state: NetworkState,
) -> Result<()> {
    ensure_terminal(network, terminal)?;
    let operators = state.operators();
    let before = directions(network, operators);

    let heads = ClearDirection.run(network, terminal, operators)?;

    let start_head = network
        .is_feeder_head_terminal(terminal)
        .then(|| terminal.to_string());
    let mut reapplied = Vec::new();
    for head in start_head.into_iter().chain(heads.iter().cloned()) {
        let equipment = network
            .equipment_of(&head)
            .ok_or_else(|| TraceError::missing_equipment(&head))?;
        if operators.is_open(equipment, None) {
            continue;
        }
        SetDirection.run_terminal(network, &head, operators)?;
        reapplied.push(head);
    }

    let changes = changes(&before, &directions(network, operators));
    match cli.format {
        OutputFormat::Json => {
            let output = serde_json::json!({
                "terminal": terminal,
                "state": state,
                "heads": heads,
                "reapplied": reapplied,
                "changes": changes,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Human => {
            if !cli.quiet {
                println!("cleared from {terminal}; re-applied from: {}", reapplied.join(", "));
            }
            print_changes(&changes);
        }
    }
    Ok(())
}

pub fn execute_remove(
    cli: &Cli,
    network: &mut Network,
    terminal: &str,
    direction: FeederDirection,
    state: NetworkState,
) -> Result<()> {
    ensure_terminal(network, terminal)?;
    let operators = state.operators();
    let before = directions(network, operators);

    RemoveDirection.run(network, terminal, direction, operators)?;

    let changes = changes(&before, &directions(network, operators));
    match cli.format {
        OutputFormat::Json => {
            let output = serde_json::json!({
                "terminal": terminal,
                "state": state,
                "direction": direction.to_string(),
                "changes": changes,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Human => print_changes(&changes),
    }
    Ok(())
}

fn ensure_terminal(network: &Network, terminal: &str) -> Result<()> {
    if network.terminal(terminal).is_none() {
        bail_not_found!("terminal", terminal);
    }
    Ok(())
}

fn directions(
    network: &Network,
    operators: &dyn NetworkStateOperators,
) -> BTreeMap<String, FeederDirection> {
    network
        .all_terminals()
        .map(|t| (t.mrid.clone(), *operators.terminal_direction(t)))
        .collect()
}

fn changes(
    before: &BTreeMap<String, FeederDirection>,
    after: &BTreeMap<String, FeederDirection>,
) -> Vec<DirectionChange> {
    after
        .iter()
        .filter_map(|(terminal, &now)| {
            let was = before.get(terminal).copied().unwrap_or_default();
            (was != now).then(|| DirectionChange {
                terminal: terminal.clone(),
                before: was.to_string(),
                after: now.to_string(),
            })
        })
        .collect()
}

fn print_changes(changes: &[DirectionChange]) {
    if changes.is_empty() {
        println!("no direction changes");
    }
    for change in changes {
        println!("{}: {} -> {}", change.terminal, change.before, change.after);
    }
}
