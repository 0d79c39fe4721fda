//! In-memory registry used by the crate's tests.
//!
//! Catalog pages are scripted: the n-th `catalog_page` call returns the
//! n-th page and records the cursor it was asked for, so pagination
//! behaviour can be asserted without a live registry.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;

use regsweep_core::error::{Result, SweepError};
use regsweep_core::record::TagDescriptor;

use crate::backend::{CatalogPage, RegistryBackend};
use crate::manifest::media_types;

#[derive(Default)]
pub(crate) struct FakeRegistry {
    pages: Vec<CatalogPage>,
    page_calls: Mutex<Vec<Option<String>>>,
    tags: HashMap<String, Vec<String>>,
    descriptors: HashMap<(String, String), TagDescriptor>,
    manifests: HashMap<String, Vec<u8>>,
    blobs: HashMap<String, Vec<u8>>,
    fail_tags: HashSet<String>,
    fail_descriptors: HashSet<(String, String)>,
    fail_deletes: HashSet<String>,
    deleted: Mutex<Vec<(String, String)>>,
}

impl FakeRegistry {
    /// A registry whose whole catalog fits on one page.
    pub(crate) fn with_repositories(names: &[&str]) -> Self {
        Self::with_pages(vec![CatalogPage {
            repositories: names.iter().map(|s| s.to_string()).collect(),
            more: false,
        }])
    }

    pub(crate) fn with_pages(pages: Vec<CatalogPage>) -> Self {
        Self {
            pages,
            ..Self::default()
        }
    }

    /// Register a tag backed by a schema2 manifest whose config blob
    /// carries the given `created` timestamp.
    pub(crate) fn add_schema2_tag(
        &mut self,
        repository: &str,
        tag: &str,
        digest: &str,
        created: &str,
    ) {
        let config_digest = format!("{digest}-config");
        let manifest = serde_json::json!({
            "schemaVersion": 2,
            "mediaType": media_types::MANIFEST_V2,
            "config": {
                "mediaType": "application/vnd.docker.container.image.v1+json",
                "digest": config_digest,
                "size": 0,
            },
            "layers": [],
        });
        let config = serde_json::json!({
            "architecture": "amd64",
            "created": created,
        });

        self.add_raw_tag(
            repository,
            tag,
            digest,
            media_types::MANIFEST_V2,
            serde_json::to_vec(&manifest).unwrap(),
        );
        self.add_blob(&config_digest, serde_json::to_vec(&config).unwrap());
    }

    /// Register a tag backed by a schema1 manifest with one history entry
    /// per timestamp, in order.
    pub(crate) fn add_schema1_tag(
        &mut self,
        repository: &str,
        tag: &str,
        digest: &str,
        created: &[&str],
    ) {
        let history: Vec<serde_json::Value> = created
            .iter()
            .map(|ts| {
                let compat = serde_json::json!({ "id": "deadbeef", "created": ts });
                serde_json::json!({ "v1Compatibility": compat.to_string() })
            })
            .collect();
        let manifest = serde_json::json!({
            "schemaVersion": 1,
            "name": repository,
            "tag": tag,
            "history": history,
        });

        self.add_raw_tag(
            repository,
            tag,
            digest,
            media_types::MANIFEST_V1,
            serde_json::to_vec(&manifest).unwrap(),
        );
    }

    /// Register a tag with an arbitrary manifest payload.
    pub(crate) fn add_raw_tag(
        &mut self,
        repository: &str,
        tag: &str,
        digest: &str,
        media_type: &str,
        manifest: Vec<u8>,
    ) {
        self.register(repository, tag, digest, media_type);
        self.manifests.insert(digest.to_string(), manifest);
    }

    /// Register a tag whose manifest the registry cannot serve.
    pub(crate) fn add_bare_tag(&mut self, repository: &str, tag: &str, digest: &str) {
        self.register(repository, tag, digest, media_types::MANIFEST_V2);
    }

    pub(crate) fn add_blob(&mut self, digest: &str, bytes: Vec<u8>) {
        self.blobs.insert(digest.to_string(), bytes);
    }

    pub(crate) fn fail_tags_for(&mut self, repository: &str) {
        self.fail_tags.insert(repository.to_string());
    }

    pub(crate) fn fail_descriptor_for(&mut self, repository: &str, tag: &str) {
        self.fail_descriptors
            .insert((repository.to_string(), tag.to_string()));
    }

    pub(crate) fn fail_delete(&mut self, digest: &str) {
        self.fail_deletes.insert(digest.to_string());
    }

    /// Cursors seen by `catalog_page`, one entry per call.
    pub(crate) fn catalog_calls(&self) -> Vec<Option<String>> {
        self.page_calls.lock().unwrap().clone()
    }

    /// Successful deletions, in order, as (repository, digest).
    pub(crate) fn delete_calls(&self) -> Vec<(String, String)> {
        self.deleted.lock().unwrap().clone()
    }

    fn register(&mut self, repository: &str, tag: &str, digest: &str, media_type: &str) {
        self.tags
            .entry(repository.to_string())
            .or_default()
            .push(tag.to_string());
        self.descriptors.insert(
            (repository.to_string(), tag.to_string()),
            TagDescriptor {
                tag: tag.to_string(),
                digest: digest.to_string(),
                media_type: media_type.to_string(),
            },
        );
    }
}

fn fake_error(message: impl Into<String>) -> SweepError {
    SweepError::Registry {
        registry: "fake".to_string(),
        message: message.into(),
    }
}

#[async_trait]
impl RegistryBackend for FakeRegistry {
    async fn catalog_page(&self, _limit: usize, last: Option<&str>) -> Result<CatalogPage> {
        let mut calls = self.page_calls.lock().unwrap();
        calls.push(last.map(ToString::to_string));
        let index = calls.len() - 1;
        match self.pages.get(index) {
            Some(page) => Ok(page.clone()),
            None => Err(fake_error(format!("no page scripted for request {index}"))),
        }
    }

    async fn list_tags(&self, repository: &str) -> Result<Vec<String>> {
        if self.fail_tags.contains(repository) {
            return Err(fake_error(format!("tag list for {repository} unavailable")));
        }
        Ok(self.tags.get(repository).cloned().unwrap_or_default())
    }

    async fn tag_descriptor(&self, repository: &str, tag: &str) -> Result<TagDescriptor> {
        let key = (repository.to_string(), tag.to_string());
        if self.fail_descriptors.contains(&key) {
            return Err(fake_error(format!("HEAD {repository}:{tag} failed")));
        }
        self.descriptors
            .get(&key)
            .cloned()
            .ok_or_else(|| fake_error(format!("unknown tag {repository}:{tag}")))
    }

    async fn manifest(&self, _repository: &str, digest: &str) -> Result<Vec<u8>> {
        self.manifests
            .get(digest)
            .cloned()
            .ok_or_else(|| fake_error(format!("manifest {digest} unknown")))
    }

    async fn blob(&self, _repository: &str, digest: &str) -> Result<Vec<u8>> {
        self.blobs
            .get(digest)
            .cloned()
            .ok_or_else(|| fake_error(format!("blob {digest} unknown")))
    }

    async fn delete_manifest(&self, repository: &str, digest: &str) -> Result<()> {
        if self.fail_deletes.contains(digest) {
            return Err(fake_error(format!("delete of {digest} rejected")));
        }
        self.deleted
            .lock()
            .unwrap()
            .push((repository.to_string(), digest.to_string()));
        Ok(())
    }
}
