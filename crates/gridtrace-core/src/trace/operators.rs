//! Per-state accessors and adjacency
//!
//! Every field that differs between the normal and current views of the
//! network is reached through a [`NetworkStateOperators`] implementation.
//! Algorithms take a `&dyn NetworkStateOperators` and never name a state.

use std::collections::BTreeSet;
use std::fmt;

use super::step::Path;
use super::NetworkState;
use crate::error::{Result, TraceError};
use crate::network::{
    ConductingEquipment, EquipmentKind, Feeder, FeederDirection, LvFeeder, Network, PhaseCode,
    SwitchState, Terminal,
};

/// Accessors for one network state.
///
/// Implementors only map each per-state field; every operation is provided
/// on top of those accessors.
pub trait NetworkStateOperators: fmt::Debug {
    fn state(&self) -> NetworkState;

    fn switch_open<'a>(&self, switch: &'a SwitchState) -> &'a PhaseCode;
    fn switch_open_mut<'a>(&self, switch: &'a mut SwitchState) -> &'a mut PhaseCode;
    fn in_service_flag<'a>(&self, equipment: &'a ConductingEquipment) -> &'a bool;
    fn in_service_flag_mut<'a>(&self, equipment: &'a mut ConductingEquipment) -> &'a mut bool;
    fn terminal_direction<'a>(&self, terminal: &'a Terminal) -> &'a FeederDirection;
    fn terminal_direction_mut<'a>(&self, terminal: &'a mut Terminal) -> &'a mut FeederDirection;
    fn terminal_phase_status<'a>(&self, terminal: &'a Terminal) -> &'a PhaseCode;
    fn terminal_phase_status_mut<'a>(&self, terminal: &'a mut Terminal) -> &'a mut PhaseCode;
    fn equipment_feeders<'a>(&self, equipment: &'a ConductingEquipment) -> &'a BTreeSet<String>;
    fn equipment_feeders_mut<'a>(
        &self,
        equipment: &'a mut ConductingEquipment,
    ) -> &'a mut BTreeSet<String>;
    fn equipment_lv_feeders<'a>(&self, equipment: &'a ConductingEquipment)
        -> &'a BTreeSet<String>;
    fn equipment_lv_feeders_mut<'a>(
        &self,
        equipment: &'a mut ConductingEquipment,
    ) -> &'a mut BTreeSet<String>;
    fn feeder_equipment<'a>(&self, feeder: &'a Feeder) -> &'a BTreeSet<String>;
    fn feeder_equipment_mut<'a>(&self, feeder: &'a mut Feeder) -> &'a mut BTreeSet<String>;
    fn feeder_lv_feeders<'a>(&self, feeder: &'a Feeder) -> &'a BTreeSet<String>;
    fn feeder_lv_feeders_mut<'a>(&self, feeder: &'a mut Feeder) -> &'a mut BTreeSet<String>;
    fn lv_feeder_equipment<'a>(&self, lv_feeder: &'a LvFeeder) -> &'a BTreeSet<String>;
    fn lv_feeder_equipment_mut<'a>(&self, lv_feeder: &'a mut LvFeeder)
        -> &'a mut BTreeSet<String>;
    fn lv_feeder_feeders<'a>(&self, lv_feeder: &'a LvFeeder) -> &'a BTreeSet<String>;
    fn lv_feeder_feeders_mut<'a>(&self, lv_feeder: &'a mut LvFeeder) -> &'a mut BTreeSet<String>;

    // Open state

    /// Open phases of a switch; non-switch equipment has none.
    fn open_phases(&self, equipment: &ConductingEquipment) -> PhaseCode {
        equipment
            .switch
            .as_ref()
            .map_or(PhaseCode::NONE, |switch| *self.switch_open(switch))
    }

    /// True if any of `phases` (any phase at all when `None`) is open.
    fn is_open(&self, equipment: &ConductingEquipment, phases: Option<PhaseCode>) -> bool {
        let open = self.open_phases(equipment);
        match phases {
            Some(phases) => !open.intersection(phases).is_empty(),
            None => !open.is_empty(),
        }
    }

    /// Open or close `phases` of a switch (every phase when `None`).
    fn set_open(
        &self,
        network: &mut Network,
        equipment: &str,
        open: bool,
        phases: Option<PhaseCode>,
    ) -> Result<()> {
        let switch = network
            .equipment_mut(equipment)
            .and_then(|eq| eq.switch.as_mut())
            .ok_or_else(|| TraceError::not_found("switch", equipment))?;
        let phases = phases.unwrap_or(PhaseCode::ABCN);
        let mask = self.switch_open_mut(switch);
        *mask = if open {
            mask.union(phases)
        } else {
            mask.difference(phases)
        };
        Ok(())
    }

    // Service state

    fn is_in_service(&self, equipment: &ConductingEquipment) -> bool {
        *self.in_service_flag(equipment)
    }

    fn set_in_service(
        &self,
        network: &mut Network,
        equipment: &str,
        in_service: bool,
    ) -> Result<()> {
        let equipment = network
            .equipment_mut(equipment)
            .ok_or_else(|| TraceError::not_found("equipment", equipment))?;
        *self.in_service_flag_mut(equipment) = in_service;
        Ok(())
    }

    // Feeder direction

    /// Direction of a terminal; unknown terminals have none.
    fn get_direction(&self, network: &Network, terminal: &str) -> FeederDirection {
        network
            .terminal(terminal)
            .map_or(FeederDirection::None, |t| *self.terminal_direction(t))
    }

    /// Returns true if the stored direction changed.
    fn set_direction(
        &self,
        network: &mut Network,
        terminal: &str,
        direction: FeederDirection,
    ) -> bool {
        update_direction(self, network, terminal, |_| direction)
    }

    /// Returns true if the stored direction changed.
    fn add_direction(
        &self,
        network: &mut Network,
        terminal: &str,
        direction: FeederDirection,
    ) -> bool {
        update_direction(self, network, terminal, |current| current + direction)
    }

    /// Returns true if the stored direction changed.
    fn remove_direction(
        &self,
        network: &mut Network,
        terminal: &str,
        direction: FeederDirection,
    ) -> bool {
        update_direction(self, network, terminal, |current| current - direction)
    }

    // Phase status

    fn get_phase_status(&self, network: &Network, terminal: &str) -> PhaseCode {
        network
            .terminal(terminal)
            .map_or(PhaseCode::NONE, |t| *self.terminal_phase_status(t))
    }

    fn set_phase_status(
        &self,
        network: &mut Network,
        terminal: &str,
        phases: PhaseCode,
    ) -> Result<()> {
        let terminal = network
            .terminal_mut(terminal)
            .ok_or_else(|| TraceError::not_found("terminal", terminal))?;
        *self.terminal_phase_status_mut(terminal) = phases;
        Ok(())
    }

    // Container membership, always updated on both sides

    /// Returns true if the association is new; unknown ids are ignored.
    fn associate_equipment_and_feeder(
        &self,
        network: &mut Network,
        equipment: &str,
        feeder: &str,
    ) -> bool {
        if network.equipment(equipment).is_none() || network.feeder(feeder).is_none() {
            return false;
        }
        let mut added = false;
        if let Some(eq) = network.equipment_mut(equipment) {
            added |= self.equipment_feeders_mut(eq).insert(feeder.to_string());
        }
        if let Some(f) = network.feeder_mut(feeder) {
            added |= self.feeder_equipment_mut(f).insert(equipment.to_string());
        }
        added
    }

    fn disassociate_equipment_and_feeder(
        &self,
        network: &mut Network,
        equipment: &str,
        feeder: &str,
    ) -> bool {
        let mut removed = false;
        if let Some(eq) = network.equipment_mut(equipment) {
            removed |= self.equipment_feeders_mut(eq).remove(feeder);
        }
        if let Some(f) = network.feeder_mut(feeder) {
            removed |= self.feeder_equipment_mut(f).remove(equipment);
        }
        removed
    }

    fn associate_equipment_and_lv_feeder(
        &self,
        network: &mut Network,
        equipment: &str,
        lv_feeder: &str,
    ) -> bool {
        if network.equipment(equipment).is_none() || network.lv_feeder(lv_feeder).is_none() {
            return false;
        }
        let mut added = false;
        if let Some(eq) = network.equipment_mut(equipment) {
            added |= self.equipment_lv_feeders_mut(eq).insert(lv_feeder.to_string());
        }
        if let Some(f) = network.lv_feeder_mut(lv_feeder) {
            added |= self.lv_feeder_equipment_mut(f).insert(equipment.to_string());
        }
        added
    }

    fn disassociate_equipment_and_lv_feeder(
        &self,
        network: &mut Network,
        equipment: &str,
        lv_feeder: &str,
    ) -> bool {
        let mut removed = false;
        if let Some(eq) = network.equipment_mut(equipment) {
            removed |= self.equipment_lv_feeders_mut(eq).remove(lv_feeder);
        }
        if let Some(f) = network.lv_feeder_mut(lv_feeder) {
            removed |= self.lv_feeder_equipment_mut(f).remove(equipment);
        }
        removed
    }

    /// Record that `feeder` energizes `lv_feeder`.
    fn associate_energizing_feeder(
        &self,
        network: &mut Network,
        feeder: &str,
        lv_feeder: &str,
    ) -> bool {
        if network.feeder(feeder).is_none() || network.lv_feeder(lv_feeder).is_none() {
            return false;
        }
        let mut added = false;
        if let Some(f) = network.feeder_mut(feeder) {
            added |= self.feeder_lv_feeders_mut(f).insert(lv_feeder.to_string());
        }
        if let Some(lv) = network.lv_feeder_mut(lv_feeder) {
            added |= self.lv_feeder_feeders_mut(lv).insert(feeder.to_string());
        }
        added
    }

    fn disassociate_energizing_feeder(
        &self,
        network: &mut Network,
        feeder: &str,
        lv_feeder: &str,
    ) -> bool {
        let mut removed = false;
        if let Some(f) = network.feeder_mut(feeder) {
            removed |= self.feeder_lv_feeders_mut(f).remove(lv_feeder);
        }
        if let Some(lv) = network.lv_feeder_mut(lv_feeder) {
            removed |= self.lv_feeder_feeders_mut(lv).remove(feeder);
        }
        removed
    }

    /// Drop every equipment and LV feeder association of a feeder.
    fn clear_feeder(&self, network: &mut Network, feeder: &str) {
        let Some(f) = network.feeder(feeder) else {
            return;
        };
        let equipment: Vec<String> = self.feeder_equipment(f).iter().cloned().collect();
        let lv_feeders: Vec<String> = self.feeder_lv_feeders(f).iter().cloned().collect();
        for eq in &equipment {
            self.disassociate_equipment_and_feeder(network, eq, feeder);
        }
        for lv in &lv_feeders {
            self.disassociate_energizing_feeder(network, feeder, lv);
        }
    }

    /// Drop every equipment and energizing feeder association of an LV feeder.
    fn clear_lv_feeder(&self, network: &mut Network, lv_feeder: &str) {
        let Some(f) = network.lv_feeder(lv_feeder) else {
            return;
        };
        let equipment: Vec<String> = self.lv_feeder_equipment(f).iter().cloned().collect();
        let feeders: Vec<String> = self.lv_feeder_feeders(f).iter().cloned().collect();
        for eq in &equipment {
            self.disassociate_equipment_and_lv_feeder(network, eq, lv_feeder);
        }
        for feeder in &feeders {
            self.disassociate_energizing_feeder(network, feeder, lv_feeder);
        }
    }

    // Adjacency

    /// Paths leaving the end of `path`.
    ///
    /// After an internal path the trace crosses the connectivity node to every
    /// in-service equipment on it. After an external path it crosses the
    /// equipment to its other terminals, minus any open switch phases. Phases
    /// narrow to each terminal's own phases and paths left with none are
    /// dropped.
    fn next_paths(&self, network: &Network, path: &Path) -> Vec<Path> {
        if path.traced_internally() {
            next_external_paths(self, network, path)
        } else {
            next_internal_paths(self, network, path)
        }
    }
}

fn update_direction<O: NetworkStateOperators + ?Sized>(
    ops: &O,
    network: &mut Network,
    terminal: &str,
    update: impl FnOnce(FeederDirection) -> FeederDirection,
) -> bool {
    let Some(terminal) = network.terminal_mut(terminal) else {
        return false;
    };
    let direction = ops.terminal_direction_mut(terminal);
    let updated = update(*direction);
    if updated == *direction {
        return false;
    }
    *direction = updated;
    true
}

fn next_external_paths<O: NetworkStateOperators + ?Sized>(
    ops: &O,
    network: &Network,
    path: &Path,
) -> Vec<Path> {
    network
        .connected_terminals(&path.to_terminal)
        .into_iter()
        .filter(|t| {
            t.equipment
                .as_deref()
                .and_then(|eq| network.equipment(eq))
                .map_or(true, |eq| ops.is_in_service(eq))
        })
        .filter_map(|t| {
            let phases = path.phases.intersection(t.phases);
            (!phases.is_empty()).then(|| Path {
                from_terminal: path.to_terminal.clone(),
                to_terminal: t.mrid.clone(),
                to_equipment: t.equipment.clone(),
                phases,
                traversed_segment: None,
                traced_externally: true,
            })
        })
        .collect()
}

fn next_internal_paths<O: NetworkStateOperators + ?Sized>(
    ops: &O,
    network: &Network,
    path: &Path,
) -> Vec<Path> {
    let Some(equipment) = network.equipment_of(&path.to_terminal) else {
        return Vec::new();
    };
    let open = ops.open_phases(equipment);
    let segment = (equipment.kind == EquipmentKind::AcLineSegment && equipment.terminals.len() > 2)
        .then(|| equipment.mrid.clone());

    network
        .sibling_terminals(&path.to_terminal)
        .into_iter()
        .filter_map(|t| {
            let phases = path.phases.intersection(t.phases).difference(open);
            (!phases.is_empty()).then(|| Path {
                from_terminal: path.to_terminal.clone(),
                to_terminal: t.mrid.clone(),
                to_equipment: Some(equipment.mrid.clone()),
                phases,
                traversed_segment: segment.clone(),
                traced_externally: false,
            })
        })
        .collect()
}

/// Declares a unit-struct operator set mapping each accessor to the field
/// with the given prefix.
macro_rules! state_operators {
    (
        $(#[$meta:meta])*
        $name:ident => $state:expr, {
            open: $open:ident,
            in_service: $in_service:ident,
            direction: $direction:ident,
            phase_status: $phase_status:ident,
            feeders: $feeders:ident,
            lv_feeders: $lv_feeders:ident,
            equipment: $equipment:ident,
            energized: $energized:ident,
            energizing: $energizing:ident $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, Default)]
        pub struct $name;

        impl NetworkStateOperators for $name {
            fn state(&self) -> NetworkState {
                $state
            }

            fn switch_open<'a>(&self, switch: &'a SwitchState) -> &'a PhaseCode {
                &switch.$open
            }

            fn switch_open_mut<'a>(&self, switch: &'a mut SwitchState) -> &'a mut PhaseCode {
                &mut switch.$open
            }

            fn in_service_flag<'a>(&self, equipment: &'a ConductingEquipment) -> &'a bool {
                &equipment.$in_service
            }

            fn in_service_flag_mut<'a>(
                &self,
                equipment: &'a mut ConductingEquipment,
            ) -> &'a mut bool {
                &mut equipment.$in_service
            }

            fn terminal_direction<'a>(&self, terminal: &'a Terminal) -> &'a FeederDirection {
                &terminal.$direction
            }

            fn terminal_direction_mut<'a>(
                &self,
                terminal: &'a mut Terminal,
            ) -> &'a mut FeederDirection {
                &mut terminal.$direction
            }

            fn terminal_phase_status<'a>(&self, terminal: &'a Terminal) -> &'a PhaseCode {
                &terminal.$phase_status
            }

            fn terminal_phase_status_mut<'a>(
                &self,
                terminal: &'a mut Terminal,
            ) -> &'a mut PhaseCode {
                &mut terminal.$phase_status
            }

            fn equipment_feeders<'a>(
                &self,
                equipment: &'a ConductingEquipment,
            ) -> &'a BTreeSet<String> {
                &equipment.$feeders
            }

            fn equipment_feeders_mut<'a>(
                &self,
                equipment: &'a mut ConductingEquipment,
            ) -> &'a mut BTreeSet<String> {
                &mut equipment.$feeders
            }

            fn equipment_lv_feeders<'a>(
                &self,
                equipment: &'a ConductingEquipment,
            ) -> &'a BTreeSet<String> {
                &equipment.$lv_feeders
            }

            fn equipment_lv_feeders_mut<'a>(
                &self,
                equipment: &'a mut ConductingEquipment,
            ) -> &'a mut BTreeSet<String> {
                &mut equipment.$lv_feeders
            }

            fn feeder_equipment<'a>(&self, feeder: &'a Feeder) -> &'a BTreeSet<String> {
                &feeder.$equipment
            }

            fn feeder_equipment_mut<'a>(&self, feeder: &'a mut Feeder) -> &'a mut BTreeSet<String> {
                &mut feeder.$equipment
            }

            fn feeder_lv_feeders<'a>(&self, feeder: &'a Feeder) -> &'a BTreeSet<String> {
                &feeder.$energized
            }

            fn feeder_lv_feeders_mut<'a>(
                &self,
                feeder: &'a mut Feeder,
            ) -> &'a mut BTreeSet<String> {
                &mut feeder.$energized
            }

            fn lv_feeder_equipment<'a>(&self, lv_feeder: &'a LvFeeder) -> &'a BTreeSet<String> {
                &lv_feeder.$equipment
            }

            fn lv_feeder_equipment_mut<'a>(
                &self,
                lv_feeder: &'a mut LvFeeder,
            ) -> &'a mut BTreeSet<String> {
                &mut lv_feeder.$equipment
            }

            fn lv_feeder_feeders<'a>(&self, lv_feeder: &'a LvFeeder) -> &'a BTreeSet<String> {
                &lv_feeder.$energizing
            }

            fn lv_feeder_feeders_mut<'a>(
                &self,
                lv_feeder: &'a mut LvFeeder,
            ) -> &'a mut BTreeSet<String> {
                &mut lv_feeder.$energizing
            }
        }
    };
}

state_operators! {
    /// The network as planned
    NormalOperators => NetworkState::Normal, {
        open: normal_open,
        in_service: normally_in_service,
        direction: normal_feeder_direction,
        phase_status: normal_phase_status,
        feeders: normal_feeders,
        lv_feeders: normal_lv_feeders,
        equipment: normal_equipment,
        energized: normal_energized_lv_feeders,
        energizing: normal_energizing_feeders,
    }
}

state_operators! {
    /// The network as currently switched
    CurrentOperators => NetworkState::Current, {
        open: current_open,
        in_service: in_service,
        direction: current_feeder_direction,
        phase_status: current_phase_status,
        feeders: current_feeders,
        lv_feeders: current_lv_feeders,
        equipment: current_equipment,
        energized: current_energized_lv_feeders,
        energizing: current_energizing_feeders,
    }
}

pub const NORMAL: &dyn NetworkStateOperators = &NormalOperators;
pub const CURRENT: &dyn NetworkStateOperators = &CurrentOperators;
