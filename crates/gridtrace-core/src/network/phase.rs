//! Phase sets carried by terminals and trace paths

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TraceError;

/// A set of single phases (A, B, C, N).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PhaseCode(u8);

const PHASE_LETTERS: [(char, u8); 4] = [('A', 0b0001), ('B', 0b0010), ('C', 0b0100), ('N', 0b1000)];

impl PhaseCode {
    pub const NONE: PhaseCode = PhaseCode(0);
    pub const A: PhaseCode = PhaseCode(0b0001);
    pub const B: PhaseCode = PhaseCode(0b0010);
    pub const C: PhaseCode = PhaseCode(0b0100);
    pub const N: PhaseCode = PhaseCode(0b1000);
    pub const ABC: PhaseCode = PhaseCode(0b0111);
    pub const ABCN: PhaseCode = PhaseCode(0b1111);

    /// Number of phases in the set
    pub fn num_phases(self) -> u32 {
        self.0.count_ones()
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn contains(self, other: PhaseCode) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn intersection(self, other: PhaseCode) -> PhaseCode {
        PhaseCode(self.0 & other.0)
    }

    pub fn union(self, other: PhaseCode) -> PhaseCode {
        PhaseCode(self.0 | other.0)
    }

    pub fn difference(self, other: PhaseCode) -> PhaseCode {
        PhaseCode(self.0 & !other.0)
    }
}

impl fmt::Display for PhaseCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return f.write_str("NONE");
        }
        for (letter, bit) in PHASE_LETTERS {
            if self.0 & bit != 0 {
                write!(f, "{letter}")?;
            }
        }
        Ok(())
    }
}

impl FromStr for PhaseCode {
    type Err = TraceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_uppercase();
        if upper == "NONE" || upper.is_empty() {
            return Ok(PhaseCode::NONE);
        }

        let mut bits = 0;
        for ch in upper.chars() {
            match PHASE_LETTERS.iter().find(|(letter, _)| *letter == ch) {
                Some((_, bit)) => bits |= bit,
                None => return Err(TraceError::invalid_value("phase code", s)),
            }
        }
        Ok(PhaseCode(bits))
    }
}

impl TryFrom<String> for PhaseCode {
    type Error = TraceError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<PhaseCode> for String {
    fn from(code: PhaseCode) -> String {
        code.to_string()
    }
}
