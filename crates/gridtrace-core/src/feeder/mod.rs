//! Feeder and LV feeder membership
//!
//! Both assignments trace outward from a head terminal, entering each
//! equipment once, and stop where the voltage level changes or another
//! head takes over. Membership is per state and always recorded on both
//! sides of the association.

pub mod assign;
pub mod lv;

pub use assign::AssignToFeeders;
pub use lv::AssignToLvFeeders;

use std::collections::BTreeSet;

use crate::config::TraceConfig;
use crate::error::{Result, TraceError};
use crate::network::{ConductingEquipment, EquipmentKind, Network};

/// Voltage tests shared by both assignments
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct VoltageLevels {
    threshold: u32,
}

impl VoltageLevels {
    pub(crate) fn new(config: &TraceConfig) -> Self {
        Self {
            threshold: config.lv_threshold_volts,
        }
    }

    fn is_lv(self, volts: u32) -> bool {
        volts > 0 && volts < self.threshold
    }

    /// Non-transformer equipment known to run below the threshold
    pub(crate) fn is_lv_equipment(self, equipment: &ConductingEquipment) -> bool {
        equipment.kind != EquipmentKind::PowerTransformer
            && equipment.nominal_voltage().is_some_and(|v| self.is_lv(v))
    }

    /// A transformer with an end below the threshold
    pub(crate) fn steps_down_to_lv(self, equipment: &ConductingEquipment) -> bool {
        equipment.kind == EquipmentKind::PowerTransformer
            && equipment.lowest_voltage().is_some_and(|v| self.is_lv(v))
    }

    /// Equipment known to run at or above the threshold
    pub(crate) fn is_hv_equipment(self, equipment: &ConductingEquipment) -> bool {
        equipment
            .nominal_voltage()
            .is_some_and(|v| v >= self.threshold)
    }
}

/// The equipment owning a head terminal
pub(crate) fn head_equipment(network: &Network, head_terminal: &str) -> Result<String> {
    network
        .equipment_of(head_terminal)
        .map(|eq| eq.mrid.clone())
        .ok_or_else(|| TraceError::missing_equipment(head_terminal))
}

/// Equipment owning the given head terminals, skipping unknown terminals
pub(crate) fn equipment_of_heads<'a>(
    network: &Network,
    heads: impl Iterator<Item = &'a str>,
) -> BTreeSet<String> {
    heads
        .filter_map(|t| network.equipment_of(t))
        .map(|eq| eq.mrid.clone())
        .collect()
}
