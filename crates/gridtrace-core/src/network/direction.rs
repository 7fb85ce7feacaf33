//! Feeder direction lattice

use std::fmt;
use std::ops::{Add, AddAssign, Sub, SubAssign};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TraceError;

/// Direction of power flow through a terminal, relative to its feeder head.
///
/// `UPSTREAM` means the feeder head lies through the terminal, `DOWNSTREAM`
/// means load lies through it. The four values form a lattice where `+` is
/// union and `-` is difference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FeederDirection {
    #[default]
    None,
    Upstream,
    Downstream,
    Both,
}

impl FeederDirection {
    const fn bits(self) -> u8 {
        match self {
            FeederDirection::None => 0b00,
            FeederDirection::Upstream => 0b01,
            FeederDirection::Downstream => 0b10,
            FeederDirection::Both => 0b11,
        }
    }

    const fn from_bits(bits: u8) -> Self {
        match bits & 0b11 {
            0b01 => FeederDirection::Upstream,
            0b10 => FeederDirection::Downstream,
            0b11 => FeederDirection::Both,
            _ => FeederDirection::None,
        }
    }

    /// Lattice inclusion: `BOTH` contains everything, everything contains `NONE`.
    pub fn contains(self, other: FeederDirection) -> bool {
        self.bits() & other.bits() == other.bits()
    }

    /// True if the two directions share any component.
    pub fn intersects(self, other: FeederDirection) -> bool {
        self.bits() & other.bits() != 0
    }

    /// The shared components of both directions.
    pub fn intersection(self, other: FeederDirection) -> FeederDirection {
        Self::from_bits(self.bits() & other.bits())
    }

    /// Swaps `UPSTREAM` and `DOWNSTREAM`; `BOTH` and `NONE` map to themselves.
    pub fn opposite(self) -> FeederDirection {
        match self {
            FeederDirection::Upstream => FeederDirection::Downstream,
            FeederDirection::Downstream => FeederDirection::Upstream,
            other => other,
        }
    }

    pub fn is_none(self) -> bool {
        self == FeederDirection::None
    }

    /// The single-valued components making up this direction.
    pub fn components(self) -> impl Iterator<Item = FeederDirection> {
        [FeederDirection::Upstream, FeederDirection::Downstream]
            .into_iter()
            .filter(move |c| self.contains(*c))
    }
}

impl Add for FeederDirection {
    type Output = FeederDirection;

    fn add(self, rhs: FeederDirection) -> FeederDirection {
        Self::from_bits(self.bits() | rhs.bits())
    }
}

impl AddAssign for FeederDirection {
    fn add_assign(&mut self, rhs: FeederDirection) {
        *self = *self + rhs;
    }
}

impl Sub for FeederDirection {
    type Output = FeederDirection;

    fn sub(self, rhs: FeederDirection) -> FeederDirection {
        Self::from_bits(self.bits() & !rhs.bits())
    }
}

impl SubAssign for FeederDirection {
    fn sub_assign(&mut self, rhs: FeederDirection) {
        *self = *self - rhs;
    }
}

impl fmt::Display for FeederDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            FeederDirection::None => "NONE",
            FeederDirection::Upstream => "UPSTREAM",
            FeederDirection::Downstream => "DOWNSTREAM",
            FeederDirection::Both => "BOTH",
        };
        f.write_str(s)
    }
}

impl FromStr for FeederDirection {
    type Err = TraceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "none" => Ok(FeederDirection::None),
            "upstream" => Ok(FeederDirection::Upstream),
            "downstream" => Ok(FeederDirection::Downstream),
            "both" => Ok(FeederDirection::Both),
            other => Err(TraceError::invalid_value("feeder direction", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::FeederDirection::{self, *};

    const ALL: [FeederDirection; 4] = [None, Upstream, Downstream, Both];

    #[test]
    fn test_union_is_idempotent() {
        for d in ALL {
            assert_eq!(d + d, d);
        }
    }

    #[test]
    fn test_none_is_identity() {
        for d in ALL {
            assert_eq!(d + None, d);
            assert_eq!(None + d, d);
            assert_eq!(d - None, d);
        }
    }

    #[test]
    fn test_union_and_difference() {
        assert_eq!(Upstream + Downstream, Both);
        assert_eq!(Both - Upstream, Downstream);
        assert_eq!(Both - Downstream, Upstream);
        assert_eq!(Upstream - Upstream, None);
        assert_eq!(Upstream - Downstream, Upstream);
        assert_eq!(Both - Both, None);
    }

    #[test]
    fn test_assign_operators() {
        let mut d = None;
        d += Upstream;
        d += Downstream;
        assert_eq!(d, Both);
        d -= Downstream;
        assert_eq!(d, Upstream);
    }

    #[test]
    fn test_contains() {
        assert!(Both.contains(Upstream));
        assert!(Both.contains(Downstream));
        assert!(Upstream.contains(None));
        assert!(!Upstream.contains(Downstream));
        assert!(!None.contains(Upstream));
        assert!(!Downstream.contains(Both));
    }

    #[test]
    fn test_opposite() {
        assert_eq!(Upstream.opposite(), Downstream);
        assert_eq!(Downstream.opposite(), Upstream);
        assert_eq!(Both.opposite(), Both);
        assert_eq!(None.opposite(), None);
    }

    #[test]
    fn test_components() {
        assert_eq!(Both.components().collect::<Vec<_>>(), vec![Upstream, Downstream]);
        assert_eq!(Downstream.components().collect::<Vec<_>>(), vec![Downstream]);
        assert_eq!(None.components().count(), 0);
    }

    #[test]
    fn test_parse_and_display() {
        assert_eq!("downstream".parse::<FeederDirection>().unwrap(), Downstream);
        assert_eq!("BOTH".parse::<FeederDirection>().unwrap(), Both);
        assert!("sideways".parse::<FeederDirection>().is_err());
        assert_eq!(Upstream.to_string(), "UPSTREAM");
    }
}
