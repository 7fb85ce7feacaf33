//! Tracing configuration for gridtrace
//!
//! Configuration is read from a TOML file, e.g.:
//!
//! ```toml
//! lv_threshold_volts = 1000
//! states = ["normal", "current"]
//! ```

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::bail_invalid;
use crate::error::Result;
use crate::trace::NetworkState;

/// Default boundary between HV and LV equipment, in volts
pub const DEFAULT_LV_THRESHOLD_VOLTS: u32 = 1000;

/// Configuration for the post-load processing sequence
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TraceConfig {
    /// Equipment below this nominal voltage is low voltage
    #[serde(default = "default_lv_threshold")]
    pub lv_threshold_volts: u32,

    /// Network states processed by the post-load sequence, in order
    #[serde(default = "default_states")]
    pub states: Vec<NetworkState>,
}

fn default_lv_threshold() -> u32 {
    DEFAULT_LV_THRESHOLD_VOLTS
}

fn default_states() -> Vec<NetworkState> {
    vec![NetworkState::Normal, NetworkState::Current]
}

impl Default for TraceConfig {
    fn default() -> Self {
        Self {
            lv_threshold_volts: default_lv_threshold(),
            states: default_states(),
        }
    }
}

impl TraceConfig {
    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// Parse configuration from TOML text
    pub fn parse(content: &str) -> Result<Self> {
        let config: TraceConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.lv_threshold_volts == 0 {
            bail_invalid!("lv_threshold_volts", self.lv_threshold_volts);
        }
        if self.states.is_empty() {
            bail_invalid!("states", "[] (at least one state is required)");
        }
        Ok(())
    }
}
