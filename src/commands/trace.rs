//! `gridtrace trace` command - list the equipment reachable from an equipment

use std::cell::RefCell;
use std::rc::Rc;

use serde::Serialize;

use gridtrace_core::error::Result;
use gridtrace_core::network::{EquipmentKind, Network};
use gridtrace_core::trace::conditions::{downstream, limit_equipment_steps, upstream};
use gridtrace_core::trace::{NetworkState, NetworkTrace, NetworkTraceStep, Visitation};
use gridtrace_core::traversal::{QueueType, Traversal};

use crate::cli::{Cli, Flow, OutputFormat};

#[derive(Debug, Clone, Serialize)]
struct Reached {
    mrid: String,
    kind: Option<EquipmentKind>,
    /// Equipment steps from the start
    steps: u32,
}

pub fn execute(
    cli: &Cli,
    network: &mut Network,
    from: &str,
    state: NetworkState,
    flow: Flow,
    max_steps: Option<u32>,
) -> Result<()> {
    let reached = reachable(network, from, state, flow, max_steps)?;

    match cli.format {
        OutputFormat::Json => {
            let output = serde_json::json!({
                "from": from,
                "state": state,
                "flow": flow.as_str(),
                "equipment": reached,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Human => {
            if reached.is_empty() && !cli.quiet {
                eprintln!("nothing reached from {from}");
            }
            for r in &reached {
                let kind = r.kind.map(|k| format!("{k:?}")).unwrap_or_default();
                println!("{}\t{}\t{}", r.steps, r.mrid, kind);
            }
        }
    }
    Ok(())
}

/// Equipment in the order the trace first entered it
fn reachable(
    network: &mut Network,
    from: &str,
    state: NetworkState,
    flow: Flow,
    max_steps: Option<u32>,
) -> Result<Vec<Reached>> {
    let operators = state.operators();
    let reached: Rc<RefCell<Vec<Reached>>> = Rc::default();
    let sink = Rc::clone(&reached);

    let mut trace = NetworkTrace::basic(
        operators,
        QueueType::BreadthFirst,
        Visitation::Terminal,
        |_, _, _| (),
    );
    match flow {
        Flow::Downstream => {
            trace.add_queue_condition(downstream::<()>(operators));
        }
        Flow::Upstream => {
            trace.add_queue_condition(upstream::<()>(operators));
        }
        Flow::Any => {}
    }
    if let Some(limit) = max_steps {
        trace.add_stop_condition(limit_equipment_steps::<()>(limit));
    }
    trace.add_step_action(move |step: &NetworkTraceStep<()>, network: &mut Network, _| {
        if !step.path.enters_equipment() {
            return;
        }
        let Some(mrid) = &step.path.to_equipment else {
            return;
        };
        let mut reached = sink.borrow_mut();
        if reached.iter().any(|r| &r.mrid == mrid) {
            return;
        }
        reached.push(Reached {
            mrid: mrid.clone(),
            kind: network.equipment(mrid).map(|eq| eq.kind),
            steps: step.num_equipment_steps,
        });
    });

    trace.add_start_equipment(network, from, ())?;
    trace.run_queued(false, network)?;
    tracing::debug!(from, state = %state, reached = reached.borrow().len(), "trace complete");

    Ok(reached.take())
}
