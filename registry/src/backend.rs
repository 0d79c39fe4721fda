//! RegistryBackend - trait abstracting the registry wire protocol.

use async_trait::async_trait;

use regsweep_core::error::Result;
use regsweep_core::record::TagDescriptor;

/// One page of the repository catalog.
#[derive(Debug, Clone, Default)]
pub struct CatalogPage {
    /// Repository names in catalog order. Some registries pad the page
    /// with empty strings; callers must be prepared to filter them.
    pub repositories: Vec<String>,
    /// Whether the registry advertises another page after this one
    pub more: bool,
}

/// Operations the sweep engine needs from a registry.
///
/// Implemented over HTTP by [`RegistryClient`](crate::client::RegistryClient)
/// and by an in-memory fake in unit tests.
#[async_trait]
pub trait RegistryBackend: Send + Sync {
    /// Fetch one catalog page: up to `limit` names after `last`.
    async fn catalog_page(&self, limit: usize, last: Option<&str>) -> Result<CatalogPage>;

    /// List every tag in a repository.
    async fn list_tags(&self, repository: &str) -> Result<Vec<String>>;

    /// Resolve a tag to its manifest descriptor.
    async fn tag_descriptor(&self, repository: &str, tag: &str) -> Result<TagDescriptor>;

    /// Fetch a manifest payload by digest.
    async fn manifest(&self, repository: &str, digest: &str) -> Result<Vec<u8>>;

    /// Fetch a blob payload by digest.
    async fn blob(&self, repository: &str, digest: &str) -> Result<Vec<u8>>;

    /// Delete a manifest by digest.
    async fn delete_manifest(&self, repository: &str, digest: &str) -> Result<()>;
}
