//! `gridtrace process` command - report what post-load processing produced

use gridtrace_core::error::Result;
use gridtrace_core::processing::ProcessingSummary;

use crate::cli::{Cli, OutputFormat};

pub fn execute(cli: &Cli, summary: &ProcessingSummary) -> Result<()> {
    match cli.format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(summary)?);
        }
        OutputFormat::Human => {
            for state in &summary.states {
                println!(
                    "{}: {} heads traced, {} terminals directed, {} feeders, {} lv feeders, {} equipment assigned",
                    state.state,
                    state.heads_traced,
                    state.terminals_with_direction,
                    state.feeders_processed,
                    state.lv_feeders_processed,
                    state.equipment_associated,
                );
            }
        }
    }
    Ok(())
}
