use std::collections::BTreeSet;
use std::time::Instant;

use super::{equipment_of_heads, head_equipment, VoltageLevels};
use crate::config::TraceConfig;
use crate::error::{Result, TraceError};
use crate::network::Network;
use crate::trace::{NetworkStateOperators, NetworkTrace, NetworkTraceStep, Visitation};
use crate::trace_time;
use crate::traversal::{QueueType, Traversal};

/// Associates equipment with the HV feeder energizing it.
///
/// The trace stops at equipment owning another feeder's head, at the step down
/// to LV and at substation transformers. LV equipment and substation
/// transformers are never associated. Distribution transformers are, along
/// with an energizing link to any LV feeder headed on them.
#[derive(Debug, Clone, Copy)]
pub struct AssignToFeeders {
    levels: VoltageLevels,
}

impl Default for AssignToFeeders {
    fn default() -> Self {
        Self::new(&TraceConfig::default())
    }
}

impl AssignToFeeders {
    pub fn new(config: &TraceConfig) -> Self {
        Self {
            levels: VoltageLevels::new(config),
        }
    }

    /// Assign every feeder with a head terminal, in feeder mRID order.
    /// Returns the number of feeders processed.
    #[tracing::instrument(skip(self, network, operators), fields(state = %operators.state()))]
    pub fn run(
        &self,
        network: &mut Network,
        operators: &'static dyn NetworkStateOperators,
    ) -> Result<usize> {
        let start = Instant::now();
        let feeders: Vec<String> = network
            .feeders()
            .filter(|f| f.head_terminal.is_some())
            .map(|f| f.mrid.clone())
            .collect();

        for feeder in &feeders {
            self.run_feeder(network, feeder, operators)?;
        }

        trace_time!(start, "assign_to_feeders", feeders = feeders.len());
        Ok(feeders.len())
    }

    /// Reassign one feeder from scratch. Returns the number of equipment it
    /// now holds; a feeder without a head terminal holds none.
    pub fn run_feeder(
        &self,
        network: &mut Network,
        feeder: &str,
        operators: &'static dyn NetworkStateOperators,
    ) -> Result<usize> {
        let head = network
            .feeder(feeder)
            .ok_or_else(|| TraceError::not_found("feeder", feeder))?
            .head_terminal
            .clone();
        operators.clear_feeder(network, feeder);
        let Some(head) = head else {
            return Ok(0);
        };
        head_equipment(network, &head)?;

        let other_heads = equipment_of_heads(
            network,
            network
                .feeders()
                .filter(|f| f.mrid != feeder)
                .filter_map(|f| f.head_terminal.as_deref()),
        );
        self.feeder_trace(feeder, other_heads, operators)
            .run_from_terminal(network, &head, (), false)?;

        let assigned = network
            .feeder(feeder)
            .map_or(0, |f| operators.feeder_equipment(f).len());
        tracing::debug!(feeder, head = %head, assigned, "assigned feeder");
        Ok(assigned)
    }

    fn feeder_trace(
        &self,
        feeder: &str,
        other_heads: BTreeSet<String>,
        operators: &'static dyn NetworkStateOperators,
    ) -> NetworkTrace<()> {
        let levels = self.levels;
        let feeder = feeder.to_string();
        let mut trace = NetworkTrace::basic(
            operators,
            QueueType::BreadthFirst,
            Visitation::Equipment,
            |_, _, _| (),
        );

        trace
            .add_stop_condition(move |step: &NetworkTraceStep<()>, network: &Network| {
                let Some(eq) = step.path.to_equipment.as_deref() else {
                    return false;
                };
                other_heads.contains(eq)
                    || network.is_substation_transformer(eq)
                    || network
                        .equipment(eq)
                        .is_some_and(|e| levels.is_lv_equipment(e) || levels.steps_down_to_lv(e))
            })
            .add_step_action(move |step: &NetworkTraceStep<()>, network: &mut Network, _| {
                if !step.path.enters_equipment() {
                    return;
                }
                let Some(eq) = step.path.to_equipment.as_deref() else {
                    return;
                };
                let skip = network.is_substation_transformer(eq)
                    || network.equipment(eq).is_some_and(|e| levels.is_lv_equipment(e));
                if skip {
                    return;
                }
                operators.associate_equipment_and_feeder(network, eq, &feeder);

                for lv_feeder in &network.lv_feeders_headed_on(eq) {
                    operators.associate_energizing_feeder(network, &feeder, lv_feeder);
                }
            });
        trace
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::{EquipmentKind, NetworkBuilder};
    use crate::trace::{NetworkState, CURRENT, NORMAL};

    fn members(network: &Network, feeder: &str) -> Vec<String> {
        NORMAL
            .feeder_equipment(network.feeder(feeder).unwrap())
            .iter()
            .cloned()
            .collect()
    }

    /// fdr: b0 -- c1 -- b2 -- c3 -- tx(11kV/415V) -- c4(415V)
    fn radial() -> NetworkBuilder {
        NetworkBuilder::new()
            .equipment("b0", EquipmentKind::Breaker, 2)
            .equipment("c1", EquipmentKind::AcLineSegment, 2)
            .equipment("b2", EquipmentKind::Breaker, 2)
            .equipment("c3", EquipmentKind::AcLineSegment, 2)
            .transformer("tx", &[11000, 415])
            .equipment("c4", EquipmentKind::AcLineSegment, 2)
            .base_voltage("c4", 415)
            .connect("b0-t2", "c1-t1")
            .connect("c1-t2", "b2-t1")
            .connect("b2-t2", "c3-t1")
            .connect("c3-t2", "tx-t1")
            .connect("tx-t2", "c4-t1")
            .feeder("fdr", "b0-t2")
    }

    #[test]
    fn test_assigns_up_to_distribution_transformer() {
        let mut network = radial().build().unwrap();
        let count = AssignToFeeders::default().run(&mut network, NORMAL).unwrap();

        assert_eq!(count, 1);
        assert_eq!(members(&network, "fdr"), vec!["b0", "b2", "c1", "c3", "tx"]);
        assert!(NORMAL
            .equipment_feeders(network.equipment("c1").unwrap())
            .contains("fdr"));
        assert!(NORMAL
            .equipment_feeders(network.equipment("c4").unwrap())
            .is_empty());
        assert!(CURRENT
            .feeder_equipment(network.feeder("fdr").unwrap())
            .is_empty());
    }

    #[test]
    fn test_open_switch_limits_current_assignment() {
        let mut network = radial().open("b2", NetworkState::Current).build().unwrap();
        let assigner = AssignToFeeders::default();
        assigner.run(&mut network, CURRENT).unwrap();

        let current: Vec<&String> = CURRENT
            .feeder_equipment(network.feeder("fdr").unwrap())
            .iter()
            .collect();
        assert_eq!(current, vec!["b0", "b2", "c1"]);
    }

    #[test]
    fn test_records_energizing_lv_feeder() {
        let mut network = radial().lv_feeder("lv", "tx-t2").build().unwrap();
        AssignToFeeders::default().run(&mut network, NORMAL).unwrap();

        assert!(NORMAL
            .feeder_lv_feeders(network.feeder("fdr").unwrap())
            .contains("lv"));
        assert!(NORMAL
            .lv_feeder_feeders(network.lv_feeder("lv").unwrap())
            .contains("fdr"));
    }

    #[test]
    fn test_stops_at_other_feeder_head_equipment() {
        let mut network = radial().feeder("fdr2", "b2-t2").build().unwrap();
        AssignToFeeders::default()
            .run_feeder(&mut network, "fdr", NORMAL)
            .unwrap();

        // b2 owns the other head, so it is associated but not crossed
        assert_eq!(members(&network, "fdr"), vec!["b0", "b2", "c1"]);
    }

    #[test]
    fn test_substation_transformer_is_not_associated() {
        let mut network = NetworkBuilder::new()
            .equipment("b0", EquipmentKind::Breaker, 2)
            .transformer("zt", &[33000, 11000])
            .equipment("c1", EquipmentKind::AcLineSegment, 2)
            .connect("b0-t1", "zt-t2")
            .connect("b0-t2", "c1-t1")
            .connect("zt-t1", "c1-t2")
            .substation("zone", &["zt"])
            .feeder("fdr", "b0-t2")
            .build()
            .unwrap();
        AssignToFeeders::default().run(&mut network, NORMAL).unwrap();

        assert_eq!(members(&network, "fdr"), vec!["b0", "c1"]);
    }

    #[test]
    fn test_rerun_is_idempotent() {
        let mut network = radial().build().unwrap();
        let assigner = AssignToFeeders::default();
        assigner.run(&mut network, NORMAL).unwrap();
        let first = members(&network, "fdr");
        assigner.run(&mut network, NORMAL).unwrap();
        assert_eq!(members(&network, "fdr"), first);
    }

    #[test]
    fn test_rerun_drops_equipment_no_longer_reached() {
        let mut network = radial().build().unwrap();
        let assigner = AssignToFeeders::default();
        assigner.run(&mut network, NORMAL).unwrap();

        NORMAL.set_open(&mut network, "b2", true, None).unwrap();
        assigner.run(&mut network, NORMAL).unwrap();
        assert_eq!(members(&network, "fdr"), vec!["b0", "b2", "c1"]);
        assert!(NORMAL
            .equipment_feeders(network.equipment("c3").unwrap())
            .is_empty());
    }

    #[test]
    fn test_unknown_feeder_fails() {
        let mut network = radial().build().unwrap();
        assert!(matches!(
            AssignToFeeders::default().run_feeder(&mut network, "nope", NORMAL),
            Err(TraceError::NotFound { .. })
        ));
    }
}
