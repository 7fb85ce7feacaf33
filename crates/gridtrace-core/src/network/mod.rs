//! In-memory network graph
//!
//! The network is an arena of entities keyed by mRID. Terminals point at their
//! owning equipment and connectivity node by id, nodes list their terminals,
//! and containers (feeders, LV feeders, substations) list their equipment.
//! Ordered maps keep iteration, and therefore every trace, deterministic.

pub mod builder;
pub mod direction;
pub mod model;
pub mod phase;

use std::collections::BTreeMap;

pub use builder::NetworkBuilder;
pub use direction::FeederDirection;
pub use model::{
    ConductingEquipment, ConnectivityNode, EquipmentKind, Feeder, LvFeeder, Substation,
    SwitchState, Terminal,
};
pub use phase::PhaseCode;

#[derive(Debug, Clone, Default)]
pub struct Network {
    pub(crate) equipment: BTreeMap<String, ConductingEquipment>,
    pub(crate) terminals: BTreeMap<String, Terminal>,
    pub(crate) nodes: BTreeMap<String, ConnectivityNode>,
    pub(crate) feeders: BTreeMap<String, Feeder>,
    pub(crate) lv_feeders: BTreeMap<String, LvFeeder>,
    pub(crate) substations: BTreeMap<String, Substation>,
}

impl Network {
    pub fn equipment(&self, mrid: &str) -> Option<&ConductingEquipment> {
        self.equipment.get(mrid)
    }

    pub fn equipment_mut(&mut self, mrid: &str) -> Option<&mut ConductingEquipment> {
        self.equipment.get_mut(mrid)
    }

    pub fn terminal(&self, mrid: &str) -> Option<&Terminal> {
        self.terminals.get(mrid)
    }

    pub fn terminal_mut(&mut self, mrid: &str) -> Option<&mut Terminal> {
        self.terminals.get_mut(mrid)
    }

    pub fn connectivity_node(&self, mrid: &str) -> Option<&ConnectivityNode> {
        self.nodes.get(mrid)
    }

    pub fn feeder(&self, mrid: &str) -> Option<&Feeder> {
        self.feeders.get(mrid)
    }

    pub fn feeder_mut(&mut self, mrid: &str) -> Option<&mut Feeder> {
        self.feeders.get_mut(mrid)
    }

    pub fn lv_feeder(&self, mrid: &str) -> Option<&LvFeeder> {
        self.lv_feeders.get(mrid)
    }

    pub fn lv_feeder_mut(&mut self, mrid: &str) -> Option<&mut LvFeeder> {
        self.lv_feeders.get_mut(mrid)
    }

    pub fn substation(&self, mrid: &str) -> Option<&Substation> {
        self.substations.get(mrid)
    }

    pub fn all_equipment(&self) -> impl Iterator<Item = &ConductingEquipment> {
        self.equipment.values()
    }

    pub fn all_terminals(&self) -> impl Iterator<Item = &Terminal> {
        self.terminals.values()
    }

    pub fn feeders(&self) -> impl Iterator<Item = &Feeder> {
        self.feeders.values()
    }

    pub fn lv_feeders(&self) -> impl Iterator<Item = &LvFeeder> {
        self.lv_feeders.values()
    }

    /// Owning equipment of a terminal
    pub fn equipment_of(&self, terminal: &str) -> Option<&ConductingEquipment> {
        self.terminal(terminal)
            .and_then(|t| t.equipment.as_deref())
            .and_then(|eq| self.equipment(eq))
    }

    /// Terminals sharing the connectivity node of `terminal`, excluding itself.
    ///
    /// A terminal without a connectivity node has no neighbours.
    pub fn connected_terminals(&self, terminal: &str) -> Vec<&Terminal> {
        let Some(node) = self
            .terminal(terminal)
            .and_then(|t| t.connectivity_node.as_deref())
            .and_then(|cn| self.connectivity_node(cn))
        else {
            return Vec::new();
        };

        node.terminals
            .iter()
            .filter(|t| t.as_str() != terminal)
            .filter_map(|t| self.terminal(t))
            .collect()
    }

    /// Other terminals of the equipment owning `terminal`.
    pub fn sibling_terminals(&self, terminal: &str) -> Vec<&Terminal> {
        let Some(equipment) = self.equipment_of(terminal) else {
            return Vec::new();
        };

        equipment
            .terminals
            .iter()
            .filter(|t| t.as_str() != terminal)
            .filter_map(|t| self.terminal(t))
            .collect()
    }

    pub fn is_feeder_head_terminal(&self, terminal: &str) -> bool {
        self.feeders
            .values()
            .any(|f| f.head_terminal.as_deref() == Some(terminal))
    }

    /// LV feeders whose head terminal belongs to `equipment`
    pub fn lv_feeders_headed_on(&self, equipment: &str) -> Vec<String> {
        self.lv_feeders
            .values()
            .filter(|f| {
                f.head_terminal
                    .as_deref()
                    .and_then(|t| self.equipment_of(t))
                    .is_some_and(|owner| owner.mrid == equipment)
            })
            .map(|f| f.mrid.clone())
            .collect()
    }

    /// Feeder head terminals, ordered by feeder mRID
    pub fn feeder_head_terminals(&self) -> Vec<&str> {
        self.feeders
            .values()
            .filter_map(|f| f.head_terminal.as_deref())
            .collect()
    }

    /// A power transformer contained in a substation
    pub fn is_substation_transformer(&self, equipment: &str) -> bool {
        self.equipment(equipment).is_some_and(|eq| {
            eq.kind == EquipmentKind::PowerTransformer
                && eq
                    .containers
                    .iter()
                    .any(|c| self.substations.contains_key(c))
        })
    }
}
