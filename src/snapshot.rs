//! JSON network fixtures
//!
//! A fixture lists equipment, the terminal pairs sharing a connectivity node,
//! and the feeders headed on them:
//!
//! ```json
//! {
//!   "equipment": [
//!     {"mrid": "b0", "kind": "breaker", "base_voltage": 11000},
//!     {"mrid": "tx", "kind": "power_transformer", "end_voltages": [11000, 415]},
//!     {"mrid": "c1", "kind": "ac_line_segment", "base_voltage": 415}
//!   ],
//!   "connections": [["b0-t2", "tx-t1"], ["tx-t2", "c1-t1"]],
//!   "feeders": [{"mrid": "fdr", "head_terminal": "b0-t2"}],
//!   "lv_feeders": [{"mrid": "lv", "head_terminal": "tx-t2"}]
//! }
//! ```
//!
//! Terminals are named `<equipment>-t<n>`. Transformers get one terminal per
//! end voltage; everything else defaults to two.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::Deserialize;

use gridtrace_core::error::Result;
use gridtrace_core::network::{EquipmentKind, Network, NetworkBuilder, PhaseCode};
use gridtrace_core::trace::NetworkState;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NetworkFixture {
    #[serde(default)]
    pub equipment: Vec<EquipmentFixture>,
    /// Nominal phases per terminal, for terminals that are not ABC
    #[serde(default)]
    pub phases: BTreeMap<String, PhaseCode>,
    #[serde(default)]
    pub connections: Vec<[String; 2]>,
    #[serde(default)]
    pub feeders: Vec<HeadFixture>,
    #[serde(default)]
    pub lv_feeders: Vec<HeadFixture>,
    #[serde(default)]
    pub substations: Vec<SubstationFixture>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EquipmentFixture {
    pub mrid: String,
    pub kind: EquipmentKind,
    pub name: Option<String>,
    #[serde(default = "default_terminals")]
    pub terminals: u32,
    pub base_voltage: Option<u32>,
    #[serde(default)]
    pub end_voltages: Vec<u32>,
    /// Switches only
    pub normal_open: Option<PhaseCode>,
    /// Switches only
    pub current_open: Option<PhaseCode>,
    #[serde(default = "default_in_service")]
    pub normally_in_service: bool,
    #[serde(default = "default_in_service")]
    pub in_service: bool,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HeadFixture {
    pub mrid: String,
    pub head_terminal: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SubstationFixture {
    pub mrid: String,
    #[serde(default)]
    pub equipment: Vec<String>,
}

fn default_terminals() -> u32 {
    2
}

fn default_in_service() -> bool {
    true
}

/// Load a network from a fixture file
pub fn load(path: &Path) -> Result<Network> {
    let content = fs::read_to_string(path)?;
    parse(&content)
}

pub fn parse(content: &str) -> Result<Network> {
    let fixture: NetworkFixture = serde_json::from_str(content)?;
    fixture.into_network()
}

impl NetworkFixture {
    pub fn into_network(self) -> Result<Network> {
        let mut builder = NetworkBuilder::new();

        for eq in &self.equipment {
            builder = if eq.kind == EquipmentKind::PowerTransformer && !eq.end_voltages.is_empty() {
                builder.transformer(&eq.mrid, &eq.end_voltages)
            } else {
                builder.equipment(&eq.mrid, eq.kind, eq.terminals)
            };
            if let Some(name) = &eq.name {
                builder = builder.name(&eq.mrid, name);
            }
            if let Some(volts) = eq.base_voltage {
                builder = builder.base_voltage(&eq.mrid, volts);
            }
            if let Some(phases) = eq.normal_open {
                builder = builder.open_phases(&eq.mrid, NetworkState::Normal, phases);
            }
            if let Some(phases) = eq.current_open {
                builder = builder.open_phases(&eq.mrid, NetworkState::Current, phases);
            }
            if !eq.normally_in_service {
                builder = builder.out_of_service(&eq.mrid, NetworkState::Normal);
            }
            if !eq.in_service {
                builder = builder.out_of_service(&eq.mrid, NetworkState::Current);
            }
        }

        for (terminal, phases) in &self.phases {
            builder = builder.phases(terminal, *phases);
        }
        for [a, b] in &self.connections {
            builder = builder.connect(a, b);
        }
        for feeder in &self.feeders {
            builder = builder.feeder(&feeder.mrid, &feeder.head_terminal);
        }
        for lv_feeder in &self.lv_feeders {
            builder = builder.lv_feeder(&lv_feeder.mrid, &lv_feeder.head_terminal);
        }
        for substation in &self.substations {
            let equipment: Vec<&str> = substation.equipment.iter().map(String::as_str).collect();
            builder = builder.substation(&substation.mrid, &equipment);
        }

        builder.build()
    }
}
