//! Entity types stored in the network arena
//!
//! Every cross reference is an mRID resolved through [`super::Network`].
//! Fields that differ between the normal and current views of the network are
//! duplicated with `normal_` / `current_` prefixes.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::direction::FeederDirection;
use super::phase::PhaseCode;

/// Closed set of equipment kinds understood by the tracing algorithms
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EquipmentKind {
    Breaker,
    Disconnector,
    Fuse,
    Junction,
    BusbarSection,
    AcLineSegment,
    PowerTransformer,
    EnergySource,
    EnergyConsumer,
    Other,
}

impl EquipmentKind {
    pub fn is_switch(self) -> bool {
        matches!(
            self,
            EquipmentKind::Breaker | EquipmentKind::Disconnector | EquipmentKind::Fuse
        )
    }
}

/// Open phases of a switch, per network state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SwitchState {
    pub normal_open: PhaseCode,
    pub current_open: PhaseCode,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConductingEquipment {
    pub mrid: String,
    pub name: String,
    pub kind: EquipmentKind,
    /// Terminal mRIDs ordered by sequence number
    pub terminals: Vec<String>,
    /// Nominal voltage in volts, if known
    pub base_voltage: Option<u32>,
    /// Rated voltage of each transformer end, indexed like `terminals`
    pub end_voltages: Vec<u32>,
    /// Present only for switch kinds
    pub switch: Option<SwitchState>,
    pub normally_in_service: bool,
    pub in_service: bool,
    /// Equipment containers (substations) this equipment belongs to
    pub containers: BTreeSet<String>,
    pub normal_feeders: BTreeSet<String>,
    pub current_feeders: BTreeSet<String>,
    pub normal_lv_feeders: BTreeSet<String>,
    pub current_lv_feeders: BTreeSet<String>,
}

impl ConductingEquipment {
    pub fn new(mrid: impl Into<String>, kind: EquipmentKind) -> Self {
        let mrid = mrid.into();
        Self {
            name: mrid.clone(),
            mrid,
            kind,
            terminals: Vec::new(),
            base_voltage: None,
            end_voltages: Vec::new(),
            switch: kind.is_switch().then(SwitchState::default),
            normally_in_service: true,
            in_service: true,
            containers: BTreeSet::new(),
            normal_feeders: BTreeSet::new(),
            current_feeders: BTreeSet::new(),
            normal_lv_feeders: BTreeSet::new(),
            current_lv_feeders: BTreeSet::new(),
        }
    }

    /// Highest voltage this equipment operates at.
    ///
    /// Transformers report their highest rated end, everything else its base
    /// voltage.
    pub fn nominal_voltage(&self) -> Option<u32> {
        match self.kind {
            EquipmentKind::PowerTransformer if !self.end_voltages.is_empty() => {
                self.end_voltages.iter().copied().max()
            }
            _ => self.base_voltage,
        }
    }

    /// Lowest voltage this equipment operates at.
    pub fn lowest_voltage(&self) -> Option<u32> {
        match self.kind {
            EquipmentKind::PowerTransformer if !self.end_voltages.is_empty() => {
                self.end_voltages.iter().copied().min()
            }
            _ => self.base_voltage,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Terminal {
    pub mrid: String,
    /// Owning equipment; `None` only in degenerate data
    pub equipment: Option<String>,
    pub connectivity_node: Option<String>,
    pub sequence_number: u32,
    /// Nominal phases connected at this terminal
    pub phases: PhaseCode,
    pub normal_feeder_direction: FeederDirection,
    pub current_feeder_direction: FeederDirection,
    /// Energized phases, per state
    pub normal_phase_status: PhaseCode,
    pub current_phase_status: PhaseCode,
}

impl Terminal {
    pub fn new(mrid: impl Into<String>, equipment: Option<String>, sequence_number: u32) -> Self {
        Self {
            mrid: mrid.into(),
            equipment,
            connectivity_node: None,
            sequence_number,
            phases: PhaseCode::ABC,
            normal_feeder_direction: FeederDirection::None,
            current_feeder_direction: FeederDirection::None,
            normal_phase_status: PhaseCode::NONE,
            current_phase_status: PhaseCode::NONE,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ConnectivityNode {
    pub mrid: String,
    pub terminals: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Feeder {
    pub mrid: String,
    pub name: String,
    pub head_terminal: Option<String>,
    pub normal_equipment: BTreeSet<String>,
    pub current_equipment: BTreeSet<String>,
    pub normal_energized_lv_feeders: BTreeSet<String>,
    pub current_energized_lv_feeders: BTreeSet<String>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct LvFeeder {
    pub mrid: String,
    pub name: String,
    pub head_terminal: Option<String>,
    pub normal_equipment: BTreeSet<String>,
    pub current_equipment: BTreeSet<String>,
    pub normal_energizing_feeders: BTreeSet<String>,
    pub current_energizing_feeders: BTreeSet<String>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Substation {
    pub mrid: String,
    pub name: String,
    pub equipment: BTreeSet<String>,
}
