use std::cell::RefCell;
use std::rc::Rc;

use crate::error::Result;
use crate::network::{FeederDirection, Network};
use crate::trace::conditions::stop_at_feeder_head;
use crate::trace::network_trace::start_path;
use crate::trace::{NetworkStateOperators, NetworkTrace, NetworkTraceStep, Visitation};
use crate::traversal::{QueueType, Traversal};

/// Clears every direction reachable from a terminal, up to feeder heads.
///
/// Unlike [`super::RemoveDirection`] this ignores multi-fed equipment, so the
/// caller must re-run [`super::SetDirection`] from the returned heads.
#[derive(Debug, Clone, Copy, Default)]
pub struct ClearDirection;

impl ClearDirection {
    /// Clear outward from `terminal` through both its node and its equipment.
    ///
    /// Returns the feeder head terminals reached, other than `terminal`, in
    /// the order they were reached.
    #[tracing::instrument(skip(self, network, operators), fields(state = %operators.state()))]
    pub fn run(
        &self,
        network: &mut Network,
        terminal: &str,
        operators: &'static dyn NetworkStateOperators,
    ) -> Result<Vec<String>> {
        let heads = Rc::new(RefCell::new(Vec::new()));

        let mut trace = NetworkTrace::basic(
            operators,
            QueueType::BreadthFirst,
            Visitation::TerminalPerSide,
            |_, _, _| (),
        );
        let start = terminal.to_string();
        let found = Rc::clone(&heads);
        trace
            .add_stop_condition(stop_at_feeder_head::<()>())
            .add_queue_condition(move |next: &NetworkTraceStep<()>, _, network: &Network| {
                !operators
                    .get_direction(network, &next.path.to_terminal)
                    .is_none()
            })
            .add_step_action(move |step: &NetworkTraceStep<()>, network: &mut Network, _| {
                let to = &step.path.to_terminal;
                operators.set_direction(network, to, FeederDirection::None);
                if *to != start && network.is_feeder_head_terminal(to) {
                    let mut found = found.borrow_mut();
                    if !found.contains(to) {
                        found.push(to.clone());
                    }
                }
            });

        trace.add_start_terminal(network, terminal, ())?;
        let into_equipment = start_path(network, terminal)?.facing_equipment();
        trace.add_start_item(NetworkTraceStep::start(into_equipment, ()));
        trace.run_queued(false, network)?;

        let heads = std::mem::take(&mut *heads.borrow_mut());
        tracing::debug!(terminal, heads = heads.len(), "cleared direction");
        Ok(heads)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::direction::SetDirection;
    use crate::network::{EquipmentKind, NetworkBuilder};
    use crate::trace::NORMAL;

    /// fdr1: b0 -- c1 -- c2 -- b3 (head of fdr2) -- c4
    fn two_feeders() -> Network {
        let mut network = NetworkBuilder::new()
            .equipment("b0", EquipmentKind::Breaker, 2)
            .equipment("c1", EquipmentKind::AcLineSegment, 2)
            .equipment("c2", EquipmentKind::AcLineSegment, 2)
            .equipment("b3", EquipmentKind::Breaker, 2)
            .equipment("c4", EquipmentKind::AcLineSegment, 2)
            .connect("b0-t2", "c1-t1")
            .connect("c1-t2", "c2-t1")
            .connect("c2-t2", "b3-t1")
            .connect("b3-t2", "c4-t1")
            .feeder("fdr1", "b0-t2")
            .feeder("fdr2", "b3-t2")
            .build()
            .unwrap();
        SetDirection.run(&mut network, NORMAL).unwrap();
        network
    }

    #[test]
    fn test_clears_both_ways_and_reports_heads() {
        let mut network = two_feeders();
        let heads = ClearDirection.run(&mut network, "c1-t2", NORMAL).unwrap();
        assert_eq!(heads, vec!["b0-t2", "b3-t2"]);

        for terminal in ["b0-t2", "c1-t1", "c1-t2", "c2-t1", "c2-t2", "b3-t1", "b3-t2"] {
            assert!(NORMAL.get_direction(&network, terminal).is_none(), "{terminal}");
        }
        // The trace stops at the fdr2 head, so fdr2 keeps its directions
        assert_eq!(
            NORMAL.get_direction(&network, "c4-t1"),
            FeederDirection::Upstream
        );
    }

    #[test]
    fn test_start_head_is_not_reported() {
        let mut network = two_feeders();
        let heads = ClearDirection.run(&mut network, "b0-t2", NORMAL).unwrap();
        assert_eq!(heads, vec!["b3-t2"]);
        assert!(NORMAL.get_direction(&network, "c2-t2").is_none());
        assert!(NORMAL.get_direction(&network, "b0-t1").is_none());
    }

    #[test]
    fn test_unknown_terminal_fails() {
        let mut network = two_feeders();
        assert!(ClearDirection.run(&mut network, "zz", NORMAL).is_err());
    }

    #[test]
    fn test_head_start_does_not_clear_into_its_own_equipment() {
        let mut network = two_feeders();
        NORMAL.set_direction(&mut network, "b0-t1", FeederDirection::Upstream);

        ClearDirection.run(&mut network, "b0-t2", NORMAL).unwrap();
        assert!(NORMAL.get_direction(&network, "b0-t2").is_none());
        assert_eq!(
            NORMAL.get_direction(&network, "b0-t1"),
            FeederDirection::Upstream
        );
    }
}
