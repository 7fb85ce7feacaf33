use crate::error::Result;
use crate::network::{FeederDirection, Network};
use crate::trace::{NetworkStateOperators, NetworkTrace, NetworkTraceStep, Path, Visitation};
use crate::traversal::{QueueType, Traversal};

/// Retracts feeder directions while keeping multi-fed equipment directed.
///
/// Each step carries the direction it ebbs off its terminal. The ebb spreads
/// across the group the next step crosses (the connectivity node for external
/// steps, the equipment for internal ones). For every component `c` that just
/// ebbed, the other group members still holding `c` decide who loses
/// `opposite(c)`:
///
/// - none: every member
/// - exactly one: only that member, which is still fed from elsewhere
/// - two or more: nobody, the group remains validly multi-fed
#[derive(Debug, Clone, Copy, Default)]
pub struct RemoveDirection;

impl RemoveDirection {
    /// Remove `direction` from `terminal` and propagate the retraction.
    ///
    /// NONE removes everything the terminal holds.
    #[tracing::instrument(skip(self, network, operators), fields(state = %operators.state()))]
    pub fn run(
        &self,
        network: &mut Network,
        terminal: &str,
        direction: FeederDirection,
        operators: &'static dyn NetworkStateOperators,
    ) -> Result<()> {
        let held = operators.get_direction(network, terminal);
        let ebb = if direction.is_none() {
            held
        } else {
            direction.intersection(held)
        };
        if ebb.is_none() {
            tracing::debug!(terminal, "nothing to remove");
            return Ok(());
        }

        let mut trace = NetworkTrace::basic(
            operators,
            QueueType::BreadthFirst,
            Visitation::TerminalPerSide,
            move |step: &NetworkTraceStep<FeederDirection>, path: &Path, network: &Network| {
                ebbed_direction(operators, network, step, path)
            },
        );
        trace
            .add_queue_condition(|next: &NetworkTraceStep<FeederDirection>, _, _| {
                !next.data.is_none()
            })
            .add_step_action(
                move |step: &NetworkTraceStep<FeederDirection>, network: &mut Network, _| {
                    operators.remove_direction(network, &step.path.to_terminal, step.data);
                },
            );
        trace.run_from_terminal(network, terminal, ebb, true)
    }
}

/// The direction the end of `path` loses because `step` ebbed.
fn ebbed_direction(
    operators: &dyn NetworkStateOperators,
    network: &Network,
    step: &NetworkTraceStep<FeederDirection>,
    path: &Path,
) -> FeederDirection {
    let ebbing = &step.path.to_terminal;
    let group = if path.traced_externally {
        network.connected_terminals(ebbing)
    } else {
        network.sibling_terminals(ebbing)
    };

    let mut loses = FeederDirection::None;
    for component in step.data.components() {
        let holders: Vec<&str> = group
            .iter()
            .filter(|t| operators.terminal_direction(t).contains(component))
            .map(|t| t.mrid.as_str())
            .collect();
        let affected = match holders.as_slice() {
            [] => true,
            [only] => *only == path.to_terminal,
            _ => false,
        };
        if affected {
            loses += component.opposite();
        }
    }

    loses.intersection(operators.get_direction(network, &path.to_terminal))
}
