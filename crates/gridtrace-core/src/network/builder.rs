//! Fluent construction of fully-linked networks
//!
//! Terminals are named `<equipment>-t<n>` with `n` starting at 1. Reference
//! errors (unknown equipment or terminals) are collected and the first one is
//! returned from [`NetworkBuilder::build`].

use super::model::{
    ConductingEquipment, ConnectivityNode, EquipmentKind, Feeder, LvFeeder, Substation, Terminal,
};
use super::phase::PhaseCode;
use super::Network;
use crate::error::{Result, TraceError};
use crate::trace::NetworkState;

#[derive(Debug, Default)]
pub struct NetworkBuilder {
    network: Network,
    next_node: usize,
    errors: Vec<TraceError>,
}

impl NetworkBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add equipment with `num_terminals` terminals carrying ABC phases
    pub fn equipment(mut self, mrid: &str, kind: EquipmentKind, num_terminals: u32) -> Self {
        if self.network.equipment.contains_key(mrid) {
            self.errors
                .push(TraceError::invalid_value("duplicate equipment", mrid));
            return self;
        }

        let mut equipment = ConductingEquipment::new(mrid, kind);
        for sequence in 1..=num_terminals {
            let terminal_id = format!("{mrid}-t{sequence}");
            self.network.terminals.insert(
                terminal_id.clone(),
                Terminal::new(terminal_id.clone(), Some(mrid.to_string()), sequence),
            );
            equipment.terminals.push(terminal_id);
        }
        self.network.equipment.insert(mrid.to_string(), equipment);
        self
    }

    /// Add a power transformer with one terminal per rated end voltage
    pub fn transformer(self, mrid: &str, end_voltages: &[u32]) -> Self {
        let mut builder = self.equipment(
            mrid,
            EquipmentKind::PowerTransformer,
            end_voltages.len() as u32,
        );
        if let Some(tx) = builder.network.equipment.get_mut(mrid) {
            tx.end_voltages = end_voltages.to_vec();
        }
        builder
    }

    pub fn name(mut self, equipment: &str, name: &str) -> Self {
        match self.network.equipment.get_mut(equipment) {
            Some(eq) => eq.name = name.to_string(),
            None => self.missing("equipment", equipment),
        }
        self
    }

    pub fn base_voltage(mut self, equipment: &str, volts: u32) -> Self {
        match self.network.equipment.get_mut(equipment) {
            Some(eq) => eq.base_voltage = Some(volts),
            None => self.missing("equipment", equipment),
        }
        self
    }

    pub fn phases(mut self, terminal: &str, phases: PhaseCode) -> Self {
        match self.network.terminals.get_mut(terminal) {
            Some(t) => t.phases = phases,
            None => self.missing("terminal", terminal),
        }
        self
    }

    /// Open every phase of a switch in one state
    pub fn open(self, equipment: &str, state: NetworkState) -> Self {
        self.open_phases(equipment, state, PhaseCode::ABCN)
    }

    pub fn open_phases(mut self, equipment: &str, state: NetworkState, phases: PhaseCode) -> Self {
        match self
            .network
            .equipment
            .get_mut(equipment)
            .and_then(|eq| eq.switch.as_mut())
        {
            Some(switch) => match state {
                NetworkState::Normal => switch.normal_open = phases,
                NetworkState::Current => switch.current_open = phases,
            },
            None => self.missing("switch", equipment),
        }
        self
    }

    pub fn out_of_service(mut self, equipment: &str, state: NetworkState) -> Self {
        match self.network.equipment.get_mut(equipment) {
            Some(eq) => match state {
                NetworkState::Normal => eq.normally_in_service = false,
                NetworkState::Current => eq.in_service = false,
            },
            None => self.missing("equipment", equipment),
        }
        self
    }

    /// A terminal without owning equipment, optionally placed on a node
    pub fn detached_terminal(mut self, mrid: &str, node: Option<&str>) -> Self {
        self.network
            .terminals
            .insert(mrid.to_string(), Terminal::new(mrid, None, 1));
        match node {
            Some(node) => self.connect_to_node(mrid, node),
            None => self,
        }
    }

    /// Join two terminals on a shared connectivity node, merging nodes if both
    /// are already connected.
    pub fn connect(mut self, a: &str, b: &str) -> Self {
        let (Some(node_a), Some(node_b)) = (self.node_of(a), self.node_of(b)) else {
            return self;
        };

        match (node_a, node_b) {
            (Some(na), Some(nb)) if na == nb => self,
            (Some(na), Some(nb)) => {
                self.merge_nodes(&na, &nb);
                self
            }
            (Some(na), None) => self.connect_to_node(b, &na),
            (None, Some(nb)) => self.connect_to_node(a, &nb),
            (None, None) => {
                self.next_node += 1;
                let node = format!("cn{}", self.next_node);
                self.connect_to_node(a, &node).connect_to_node(b, &node)
            }
        }
    }

    /// Place a terminal on a named connectivity node, creating it if needed
    pub fn connect_to_node(mut self, terminal: &str, node: &str) -> Self {
        let Some(t) = self.network.terminals.get_mut(terminal) else {
            self.missing("terminal", terminal);
            return self;
        };

        if let Some(previous) = t.connectivity_node.replace(node.to_string()) {
            if let Some(old) = self.network.nodes.get_mut(&previous) {
                old.terminals.retain(|m| m != terminal);
            }
        }

        let entry = self
            .network
            .nodes
            .entry(node.to_string())
            .or_insert_with(|| ConnectivityNode {
                mrid: node.to_string(),
                terminals: Vec::new(),
            });
        if !entry.terminals.iter().any(|m| m == terminal) {
            entry.terminals.push(terminal.to_string());
        }
        self
    }

    pub fn feeder(mut self, mrid: &str, head_terminal: &str) -> Self {
        if !self.network.terminals.contains_key(head_terminal) {
            self.missing("terminal", head_terminal);
        }
        self.network.feeders.insert(
            mrid.to_string(),
            Feeder {
                mrid: mrid.to_string(),
                name: mrid.to_string(),
                head_terminal: Some(head_terminal.to_string()),
                ..Default::default()
            },
        );
        self
    }

    pub fn lv_feeder(mut self, mrid: &str, head_terminal: &str) -> Self {
        if !self.network.terminals.contains_key(head_terminal) {
            self.missing("terminal", head_terminal);
        }
        self.network.lv_feeders.insert(
            mrid.to_string(),
            LvFeeder {
                mrid: mrid.to_string(),
                name: mrid.to_string(),
                head_terminal: Some(head_terminal.to_string()),
                ..Default::default()
            },
        );
        self
    }

    /// Add a substation containing the given equipment, linked both ways
    pub fn substation(mut self, mrid: &str, equipment: &[&str]) -> Self {
        let mut substation = Substation {
            mrid: mrid.to_string(),
            name: mrid.to_string(),
            ..Default::default()
        };
        for eq in equipment {
            match self.network.equipment.get_mut(*eq) {
                Some(e) => {
                    e.containers.insert(mrid.to_string());
                    substation.equipment.insert(eq.to_string());
                }
                None => self.missing("equipment", eq),
            }
        }
        self.network.substations.insert(mrid.to_string(), substation);
        self
    }

    pub fn build(mut self) -> Result<Network> {
        if !self.errors.is_empty() {
            return Err(self.errors.remove(0));
        }
        Ok(self.network)
    }

    /// Connectivity node of a terminal; `None` records an unknown terminal.
    fn node_of(&mut self, terminal: &str) -> Option<Option<String>> {
        match self.network.terminals.get(terminal) {
            Some(t) => Some(t.connectivity_node.clone()),
            None => {
                self.missing("terminal", terminal);
                None
            }
        }
    }

    fn merge_nodes(&mut self, keep: &str, absorb: &str) {
        let Some(absorbed) = self.network.nodes.remove(absorb) else {
            return;
        };
        for terminal in &absorbed.terminals {
            if let Some(t) = self.network.terminals.get_mut(terminal) {
                t.connectivity_node = Some(keep.to_string());
            }
        }
        if let Some(kept) = self.network.nodes.get_mut(keep) {
            kept.terminals.extend(absorbed.terminals);
        }
    }

    fn missing(&mut self, context: &str, value: &str) {
        self.errors.push(TraceError::not_found(context, value));
    }
}
