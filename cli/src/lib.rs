//! regsweep CLI - batch retention for container registries.

pub mod commands;
pub mod output;
