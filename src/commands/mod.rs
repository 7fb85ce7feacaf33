//! CLI commands for gridtrace

pub mod direction;
pub mod dispatch;
pub mod process;
pub mod trace;
