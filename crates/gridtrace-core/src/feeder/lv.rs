use std::collections::BTreeSet;
use std::time::Instant;

use super::{equipment_of_heads, head_equipment, VoltageLevels};
use crate::config::TraceConfig;
use crate::error::{Result, TraceError};
use crate::network::Network;
use crate::trace::{NetworkStateOperators, NetworkTrace, NetworkTraceStep, Visitation};
use crate::trace_time;
use crate::traversal::{QueueType, Traversal};

/// Associates LV equipment with the LV feeder supplying it.
///
/// The trace stops at HV equipment, which is never associated (not even the
/// transformer the head sits on), and at other LV feeders' head equipment.
/// HV feeders already holding equipment this trace reaches are linked as
/// energizing feeders.
#[derive(Debug, Clone, Copy)]
pub struct AssignToLvFeeders {
    levels: VoltageLevels,
}

impl Default for AssignToLvFeeders {
    fn default() -> Self {
        Self::new(&TraceConfig::default())
    }
}

impl AssignToLvFeeders {
    pub fn new(config: &TraceConfig) -> Self {
        Self {
            levels: VoltageLevels::new(config),
        }
    }

    /// Assign every LV feeder with a head terminal, in mRID order.
    /// Returns the number of LV feeders processed.
    #[tracing::instrument(skip(self, network, operators), fields(state = %operators.state()))]
    pub fn run(
        &self,
        network: &mut Network,
        operators: &'static dyn NetworkStateOperators,
    ) -> Result<usize> {
        let start = Instant::now();
        let lv_feeders: Vec<String> = network
            .lv_feeders()
            .filter(|f| f.head_terminal.is_some())
            .map(|f| f.mrid.clone())
            .collect();

        for lv_feeder in &lv_feeders {
            self.run_lv_feeder(network, lv_feeder, operators)?;
        }

        trace_time!(start, "assign_to_lv_feeders", lv_feeders = lv_feeders.len());
        Ok(lv_feeders.len())
    }

    /// Reassign one LV feeder from scratch. Returns the number of equipment
    /// it now holds.
    pub fn run_lv_feeder(
        &self,
        network: &mut Network,
        lv_feeder: &str,
        operators: &'static dyn NetworkStateOperators,
    ) -> Result<usize> {
        let head = network
            .lv_feeder(lv_feeder)
            .ok_or_else(|| TraceError::not_found("lv feeder", lv_feeder))?
            .head_terminal
            .clone();
        operators.clear_lv_feeder(network, lv_feeder);
        let Some(head) = head else {
            return Ok(0);
        };
        head_equipment(network, &head)?;

        let other_heads = equipment_of_heads(
            network,
            network
                .lv_feeders()
                .filter(|f| f.mrid != lv_feeder)
                .filter_map(|f| f.head_terminal.as_deref()),
        );
        self.lv_feeder_trace(lv_feeder, other_heads, operators)
            .run_from_terminal(network, &head, (), false)?;

        let assigned = network
            .lv_feeder(lv_feeder)
            .map_or(0, |f| operators.lv_feeder_equipment(f).len());
        tracing::debug!(lv_feeder, head = %head, assigned, "assigned lv feeder");
        Ok(assigned)
    }

    fn lv_feeder_trace(
        &self,
        lv_feeder: &str,
        other_heads: BTreeSet<String>,
        operators: &'static dyn NetworkStateOperators,
    ) -> NetworkTrace<()> {
        let levels = self.levels;
        let lv_feeder = lv_feeder.to_string();
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
                    || network
                        .equipment(eq)
                        .is_some_and(|e| levels.is_hv_equipment(e))
            })
            .add_step_action(move |step: &NetworkTraceStep<()>, network: &mut Network, _| {
                if !step.path.enters_equipment() {
                    return;
                }
                let Some(eq) = step.path.to_equipment.as_deref() else {
                    return;
                };
                let Some(equipment) = network.equipment(eq) else {
                    return;
                };
                let is_hv = levels.is_hv_equipment(equipment);
                let energizing: Vec<String> =
                    operators.equipment_feeders(equipment).iter().cloned().collect();

                for feeder in &energizing {
                    operators.associate_energizing_feeder(network, feeder, &lv_feeder);
                }
                if !is_hv {
                    operators.associate_equipment_and_lv_feeder(network, eq, &lv_feeder);
                }
            });
        trace
    }
}
