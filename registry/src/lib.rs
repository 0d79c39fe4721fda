//! regsweep registry - Docker Registry HTTP API V2 access.
//!
//! This crate talks to a V2 registry (catalog, tag lists, manifests,
//! blobs, deletion) and drives retention sweeps over it. The HTTP
//! client lives behind the [`RegistryBackend`] trait so the sweep
//! engine can be exercised against an in-memory registry in tests.

pub mod backend;
pub mod catalog;
pub mod client;
pub mod manifest;
pub mod sweep;

#[cfg(test)]
mod fake;

pub use backend::{CatalogPage, RegistryBackend};
pub use catalog::CatalogWalker;
pub use client::{ClientConfig, RegistryAuth, RegistryClient};
pub use manifest::resolve_created;
pub use sweep::{resolve_repository, RepositoryScan, SweepReport, Sweeper};
