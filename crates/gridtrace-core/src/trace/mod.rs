//! Network traces over terminals
//!
//! A [`NetworkTrace`] binds the generic traversal engine to [`Path`] steps
//! through the network, expanded by one [`NetworkStateOperators`] set. Picking
//! [`NORMAL`] or [`CURRENT`] points every algorithm built on top at the planned
//! or the live-switched view of the network.

pub mod conditions;
pub mod network_trace;
pub mod operators;
pub mod step;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TraceError;

pub use network_trace::{NetworkTrace, Visitation};
pub use operators::{CurrentOperators, NetworkStateOperators, NormalOperators, CURRENT, NORMAL};
pub use step::{NetworkTraceStep, Path};

/// One of the two parallel views of the network
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NetworkState {
    /// As planned
    Normal,
    /// As currently switched
    Current,
}

impl NetworkState {
    pub const ALL: [NetworkState; 2] = [NetworkState::Normal, NetworkState::Current];

    /// Operators reading and writing this state's fields
    pub fn operators(self) -> &'static dyn NetworkStateOperators {
        match self {
            NetworkState::Normal => NORMAL,
            NetworkState::Current => CURRENT,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            NetworkState::Normal => "normal",
            NetworkState::Current => "current",
        }
    }
}

impl fmt::Display for NetworkState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NetworkState {
    type Err = TraceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "normal" => Ok(NetworkState::Normal),
            "current" => Ok(NetworkState::Current),
            other => Err(TraceError::invalid_value("network state", other)),
        }
    }
}
