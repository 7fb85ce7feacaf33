//! Post-load processing
//!
//! Run once a network is loaded: directions first, then HV feeder
//! membership, then LV feeder membership, for every configured state.

use std::time::Instant;

use serde::Serialize;

use crate::config::TraceConfig;
use crate::direction::SetDirection;
use crate::error::Result;
use crate::feeder::{AssignToFeeders, AssignToLvFeeders};
use crate::logging::state_span;
use crate::network::Network;
use crate::trace::{NetworkState, NetworkStateOperators};
use crate::trace_time;

/// What post-load processing produced for one state
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StateSummary {
    pub state: NetworkState,
    /// Feeder heads directions were applied from
    pub heads_traced: usize,
    pub terminals_with_direction: usize,
    pub feeders_processed: usize,
    pub lv_feeders_processed: usize,
    /// Equipment belonging to at least one feeder or LV feeder
    pub equipment_associated: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProcessingSummary {
    pub states: Vec<StateSummary>,
}

impl ProcessingSummary {
    pub fn state(&self, state: NetworkState) -> Option<&StateSummary> {
        self.states.iter().find(|s| s.state == state)
    }
}

/// Apply directions and feeder membership for every configured state.
#[tracing::instrument(skip(network, config), fields(states = config.states.len()))]
pub fn run_post_load(network: &mut Network, config: &TraceConfig) -> Result<ProcessingSummary> {
    let start = Instant::now();
    let assign = AssignToFeeders::new(config);
    let assign_lv = AssignToLvFeeders::new(config);

    let mut states = Vec::with_capacity(config.states.len());
    for &state in &config.states {
        let _span = state_span(state).entered();
        let operators = state.operators();
        let heads_traced = SetDirection.run(network, operators)?;
        let feeders_processed = assign.run(network, operators)?;
        let lv_feeders_processed = assign_lv.run(network, operators)?;

        let summary = StateSummary {
            state,
            heads_traced,
            terminals_with_direction: terminals_with_direction(network, operators),
            feeders_processed,
            lv_feeders_processed,
            equipment_associated: equipment_associated(network, operators),
        };
        tracing::info!(
            state = %state,
            terminals = summary.terminals_with_direction,
            equipment = summary.equipment_associated,
            "processed state"
        );
        states.push(summary);
    }

    trace_time!(start, "run_post_load");
    Ok(ProcessingSummary { states })
}

fn terminals_with_direction(network: &Network, operators: &dyn NetworkStateOperators) -> usize {
    network
        .all_terminals()
        .filter(|t| !operators.terminal_direction(t).is_none())
        .count()
}

fn equipment_associated(network: &Network, operators: &dyn NetworkStateOperators) -> usize {
    network
        .all_equipment()
        .filter(|eq| {
            !operators.equipment_feeders(eq).is_empty()
                || !operators.equipment_lv_feeders(eq).is_empty()
        })
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::{EquipmentKind, FeederDirection, NetworkBuilder};
    use crate::trace::{CURRENT, NORMAL};

    /// fdr: b0 -- c1 -- b2 -- tx(11kV/415V) -- c3(415V), lv headed at tx-t2
    fn network() -> NetworkBuilder {
        NetworkBuilder::new()
            .equipment("b0", EquipmentKind::Breaker, 2)
            .equipment("c1", EquipmentKind::AcLineSegment, 2)
            .equipment("b2", EquipmentKind::Breaker, 2)
            .transformer("tx", &[11000, 415])
            .equipment("c3", EquipmentKind::AcLineSegment, 2)
            .base_voltage("c3", 415)
            .connect("b0-t2", "c1-t1")
            .connect("c1-t2", "b2-t1")
            .connect("b2-t2", "tx-t1")
            .connect("tx-t2", "c3-t1")
            .feeder("fdr", "b0-t2")
            .lv_feeder("lv", "tx-t2")
    }

    #[test]
    fn test_processes_every_configured_state() {
        let mut network = network().open("b2", NetworkState::Current).build().unwrap();
        let summary = run_post_load(&mut network, &TraceConfig::default()).unwrap();

        let normal = summary.state(NetworkState::Normal).unwrap();
        assert_eq!(normal.heads_traced, 1);
        assert_eq!(normal.feeders_processed, 1);
        assert_eq!(normal.lv_feeders_processed, 1);
        // b0-t2 through c3-t2
        assert_eq!(normal.terminals_with_direction, 9);
        assert_eq!(normal.equipment_associated, 5);

        let current = summary.state(NetworkState::Current).unwrap();
        assert_eq!(current.terminals_with_direction, 4);
        // b0, c1, b2 on the feeder; c3 on the LV feeder, which does not depend
        // on the HV side being energized
        assert_eq!(current.equipment_associated, 4);

        assert_eq!(
            NORMAL.get_direction(&network, "c3-t1"),
            FeederDirection::Upstream
        );
        assert!(CURRENT.get_direction(&network, "tx-t1").is_none());
        assert!(NORMAL
            .lv_feeder_feeders(network.lv_feeder("lv").unwrap())
            .contains("fdr"));
    }

    #[test]
    fn test_only_configured_states_are_processed() {
        let mut network = network().build().unwrap();
        let config = TraceConfig {
            states: vec![NetworkState::Current],
            ..TraceConfig::default()
        };
        let summary = run_post_load(&mut network, &config).unwrap();

        assert_eq!(summary.states.len(), 1);
        assert!(summary.state(NetworkState::Normal).is_none());
        assert!(NORMAL.get_direction(&network, "b0-t2").is_none());
    }

    #[test]
    fn test_summary_serializes() {
        let mut network = network().build().unwrap();
        let summary = run_post_load(&mut network, &TraceConfig::default()).unwrap();
        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["states"][0]["state"], "normal");
        assert_eq!(json["states"][1]["state"], "current");
    }
}
