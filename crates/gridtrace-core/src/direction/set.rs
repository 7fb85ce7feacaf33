use std::time::Instant;

use crate::error::{Result, TraceError};
use crate::network::{FeederDirection, Network};
use crate::trace::conditions::stop_at_feeder_head;
use crate::trace::{NetworkStateOperators, NetworkTrace, NetworkTraceStep, Path, Visitation};
use crate::trace_time;
use crate::traversal::{QueueType, Traversal};

/// Applies feeder directions outward from feeder heads.
///
/// The head terminal is DOWNSTREAM and every step flips the direction applied
/// to the next terminal. Steps that would add nothing new are never queued, so
/// a loop stops once it meets directions it already carries. Some loop
/// segments therefore end up with one direction rather than BOTH.
#[derive(Debug, Clone, Copy, Default)]
pub struct SetDirection;

impl SetDirection {
    /// Apply directions from every feeder head whose head equipment is not
    /// open, in feeder mRID order. Returns the number of heads traced.
    #[tracing::instrument(skip(self, network, operators), fields(state = %operators.state()))]
    pub fn run(
        &self,
        network: &mut Network,
        operators: &'static dyn NetworkStateOperators,
    ) -> Result<usize> {
        let start = Instant::now();
        let heads: Vec<(String, String)> = network
            .feeders()
            .filter_map(|f| f.head_terminal.clone().map(|t| (f.mrid.clone(), t)))
            .collect();

        let mut traced = 0;
        for (feeder, head) in heads {
            let equipment = network
                .equipment_of(&head)
                .ok_or_else(|| TraceError::missing_equipment(&head))?;
            if operators.is_open(equipment, None) {
                tracing::debug!(feeder = %feeder, head = %head, "feeder head is open, skipping");
                continue;
            }
            self.run_terminal(network, &head, operators)?;
            traced += 1;
        }

        trace_time!(start, "set_direction", heads = traced);
        Ok(traced)
    }

    /// Apply directions outward from a single terminal
    pub fn run_terminal(
        &self,
        network: &mut Network,
        terminal: &str,
        operators: &'static dyn NetworkStateOperators,
    ) -> Result<()> {
        tracing::debug!(terminal, state = %operators.state(), "setting direction");
        Self::trace(operators).run_from_terminal(
            network,
            terminal,
            FeederDirection::Downstream,
            false,
        )
    }

    /// The branching trace behind [`SetDirection::run_terminal`], for callers
    /// that need extra conditions or actions.
    pub fn trace(operators: &'static dyn NetworkStateOperators) -> NetworkTrace<FeederDirection> {
        let by_phases =
            |step: &NetworkTraceStep<FeederDirection>| step.path.phases.num_phases() as i32;
        let mut trace = NetworkTrace::branching(
            operators,
            QueueType::weighted(by_phases),
            QueueType::weighted(by_phases),
            Visitation::Terminal,
            move |step: &NetworkTraceStep<FeederDirection>, path: &Path, network: &Network| {
                next_direction(operators, network, step.data, path)
            },
        );

        trace
            .add_queue_condition(|next: &NetworkTraceStep<FeederDirection>, _, _| {
                !next.data.is_none()
            })
            .add_stop_condition(stop_at_feeder_head::<FeederDirection>())
            .add_stop_condition(
                |step: &NetworkTraceStep<FeederDirection>, network: &Network| {
                    step.path
                        .to_equipment
                        .as_deref()
                        .is_some_and(|eq| network.is_substation_transformer(eq))
                },
            )
            .add_step_action(
                move |step: &NetworkTraceStep<FeederDirection>, network: &mut Network, _| {
                    operators.add_direction(network, &step.path.to_terminal, step.data);
                },
            );
        trace
    }
}

/// The direction to apply at the end of `path`, or NONE if it is already there.
fn next_direction(
    operators: &dyn NetworkStateOperators,
    network: &Network,
    applied: FeederDirection,
    path: &Path,
) -> FeederDirection {
    let next = applied.opposite();
    if operators
        .get_direction(network, &path.to_terminal)
        .contains(next)
    {
        FeederDirection::None
    } else {
        next
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::{EquipmentKind, NetworkBuilder};
    use crate::trace::{NetworkState, CURRENT, NORMAL};

    fn direction(network: &Network, terminal: &str) -> FeederDirection {
        NORMAL.get_direction(network, terminal)
    }

    /// fdr: b0 -- c1 -- b2 -- c3
    fn radial() -> NetworkBuilder {
        NetworkBuilder::new()
            .equipment("b0", EquipmentKind::Breaker, 2)
            .equipment("c1", EquipmentKind::AcLineSegment, 2)
            .equipment("b2", EquipmentKind::Breaker, 2)
            .equipment("c3", EquipmentKind::AcLineSegment, 2)
            .connect("b0-t2", "c1-t1")
            .connect("c1-t2", "b2-t1")
            .connect("b2-t2", "c3-t1")
            .feeder("fdr", "b0-t2")
    }

    #[test]
    fn test_directions_alternate_along_radial_feeder() {
        let mut network = radial().build().unwrap();
        assert_eq!(SetDirection.run(&mut network, NORMAL).unwrap(), 1);

        use FeederDirection::*;
        for (terminal, expected) in [
            ("b0-t1", None),
            ("b0-t2", Downstream),
            ("c1-t1", Upstream),
            ("c1-t2", Downstream),
            ("b2-t1", Upstream),
            ("b2-t2", Downstream),
            ("c3-t1", Upstream),
            ("c3-t2", Downstream),
        ] {
            assert_eq!(direction(&network, terminal), expected, "{terminal}");
        }
        assert_eq!(CURRENT.get_direction(&network, "c1-t1"), None);
    }

    #[test]
    fn test_open_switch_is_not_crossed() {
        let mut network = radial().open("b2", NetworkState::Current).build().unwrap();
        SetDirection.run(&mut network, CURRENT).unwrap();

        assert_eq!(
            CURRENT.get_direction(&network, "b2-t1"),
            FeederDirection::Upstream
        );
        assert_eq!(CURRENT.get_direction(&network, "b2-t2"), FeederDirection::None);
        assert_eq!(CURRENT.get_direction(&network, "c3-t1"), FeederDirection::None);
    }

    #[test]
    fn test_open_feeder_head_is_skipped() {
        let mut network = radial().open("b0", NetworkState::Normal).build().unwrap();
        assert_eq!(SetDirection.run(&mut network, NORMAL).unwrap(), 0);
        assert_eq!(direction(&network, "b0-t2"), FeederDirection::None);
    }

    #[test]
    fn test_stops_at_other_feeder_head() {
        let mut network = radial().feeder("fdr2", "c3-t1").build().unwrap();
        SetDirection.run_terminal(&mut network, "b0-t2", NORMAL).unwrap();

        assert_eq!(direction(&network, "c3-t1"), FeederDirection::Upstream);
        assert_eq!(direction(&network, "c3-t2"), FeederDirection::None);
    }

    #[test]
    fn test_stops_at_substation_transformer() {
        let mut network = radial()
            .transformer("tx", &[11000, 33000])
            .connect("c3-t2", "tx-t1")
            .substation("zone", &["tx"])
            .build()
            .unwrap();
        SetDirection.run(&mut network, NORMAL).unwrap();

        assert_eq!(direction(&network, "tx-t1"), FeederDirection::Upstream);
        assert_eq!(direction(&network, "tx-t2"), FeederDirection::None);
    }

    #[test]
    fn test_head_without_equipment_is_a_data_error() {
        let mut network = NetworkBuilder::new()
            .detached_terminal("loose", None)
            .feeder("fdr", "loose")
            .build()
            .unwrap();
        assert!(matches!(
            SetDirection.run(&mut network, NORMAL),
            Err(TraceError::MissingEquipment { .. })
        ));
    }
}
