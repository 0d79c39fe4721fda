//! regsweep core - retention data model.
//!
//! This crate provides the types shared by the registry engine and the
//! CLI: the error enum, the retention policy with its decision logic, and
//! the per-tag record types.

pub mod error;
pub mod policy;
pub mod record;

// Re-export commonly used types
pub use error::{Result, SweepError};
pub use policy::{Decision, RetentionPolicy};
pub use record::{DeletionOutcome, OutcomeKind, TagDescriptor, TagRecord};

/// regsweep version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
