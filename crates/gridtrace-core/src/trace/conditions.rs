//! Reusable conditions for network traces
//!
//! Register them with [`crate::traversal::Traversal::add_queue_condition`] or
//! [`crate::traversal::Traversal::add_stop_condition`].

use super::operators::NetworkStateOperators;
use super::step::{NetworkTraceStep, Path};
use crate::network::{FeederDirection, Network};

/// True if stepping along `path` moves with `flow`.
///
/// Entering equipment downstream means arriving at a terminal that has the
/// feeder head behind it (UPSTREAM); leaving it downstream means arriving at a
/// terminal with load beyond it (DOWNSTREAM).
fn moves_with(
    operators: &dyn NetworkStateOperators,
    network: &Network,
    path: &Path,
    flow: FeederDirection,
) -> bool {
    let expected = if path.traced_externally {
        flow.opposite()
    } else {
        flow
    };
    operators
        .get_direction(network, &path.to_terminal)
        .contains(expected)
}

/// Only queue steps heading away from the feeder head
pub fn downstream<D: 'static>(
    operators: &'static dyn NetworkStateOperators,
) -> impl Fn(&NetworkTraceStep<D>, &NetworkTraceStep<D>, &Network) -> bool + 'static {
    move |next: &NetworkTraceStep<D>, _current: &NetworkTraceStep<D>, network: &Network| {
        moves_with(operators, network, &next.path, FeederDirection::Downstream)
    }
}

/// Only queue steps heading towards the feeder head
pub fn upstream<D: 'static>(
    operators: &'static dyn NetworkStateOperators,
) -> impl Fn(&NetworkTraceStep<D>, &NetworkTraceStep<D>, &Network) -> bool + 'static {
    move |next: &NetworkTraceStep<D>, _current: &NetworkTraceStep<D>, network: &Network| {
        moves_with(operators, network, &next.path, FeederDirection::Upstream)
    }
}

pub fn stop_at_feeder_head<D: 'static>() -> impl Fn(&NetworkTraceStep<D>, &Network) -> bool + 'static
{
    |step: &NetworkTraceStep<D>, network: &Network| {
        network.is_feeder_head_terminal(&step.path.to_terminal)
    }
}

/// Stop once the trace has moved onto `limit` equipment past the start
pub fn limit_equipment_steps<D: 'static>(
    limit: u32,
) -> impl Fn(&NetworkTraceStep<D>, &Network) -> bool + 'static {
    move |step: &NetworkTraceStep<D>, _: &Network| step.num_equipment_steps >= limit
}
