//! Gridtrace Core Library
//!
//! Network tracing for electrical distribution networks: a generic traversal
//! engine, per-state network traces, feeder direction maintenance and feeder
//! membership assignment.

pub mod config;
pub mod direction;
pub mod error;
pub mod feeder;
pub mod logging;
pub mod network;
pub mod processing;
pub mod trace;
pub mod traversal;
