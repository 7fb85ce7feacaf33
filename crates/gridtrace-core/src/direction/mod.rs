//! Feeder direction assignment and retraction
//!
//! [`SetDirection`] floods directions outward from feeder heads.
//! [`RemoveDirection`] retracts one head's contribution while keeping
//! dual-fed equipment directed. [`ClearDirection`] wipes a region bounded by
//! feeder heads and reports the heads to re-run [`SetDirection`] from.

pub mod clear;
pub mod remove;
pub mod set;

pub use clear::ClearDirection;
pub use remove::RemoveDirection;
pub use set::SetDirection;
