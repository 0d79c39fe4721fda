//! HTTP client for the registry API.

use async_trait::async_trait;
use reqwest::header::{ACCEPT, CONTENT_TYPE, LINK};
use reqwest::{RequestBuilder, Response};
use serde::Deserialize;

use regsweep_core::error::{Result, SweepError};
use regsweep_core::record::TagDescriptor;

use crate::backend::{CatalogPage, RegistryBackend};
use crate::manifest::media_types;

/// Authentication credentials for a registry.
#[derive(Debug, Clone)]
pub struct RegistryAuth {
    username: Option<String>,
    password: Option<String>,
}

impl RegistryAuth {
    /// Create anonymous authentication (no credentials).
    pub fn anonymous() -> Self {
        Self {
            username: None,
            password: None,
        }
    }

    /// Create basic authentication with username and password.
    pub fn basic(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: Some(username.into()),
            password: Some(password.into()),
        }
    }

    /// Create authentication from environment variables.
    ///
    /// Reads `REGISTRY_USERNAME` and `REGISTRY_PASSWORD`.
    /// Falls back to anonymous if not set.
    pub fn from_env() -> Self {
        let username = std::env::var("REGISTRY_USERNAME").ok();
        let password = std::env::var("REGISTRY_PASSWORD").ok();

        if username.is_some() && password.is_some() {
            Self { username, password }
        } else {
            Self::anonymous()
        }
    }

    pub fn is_anonymous(&self) -> bool {
        self.username.is_none() || self.password.is_none()
    }

    /// Attach these credentials to a request.
    fn apply(&self, request: RequestBuilder) -> RequestBuilder {
        match (&self.username, &self.password) {
            (Some(u), Some(p)) => request.basic_auth(u, Some(p)),
            _ => request,
        }
    }
}

/// Connection settings for one registry.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL including scheme, e.g. `https://registry.example.com`
    pub endpoint: String,
    pub auth: RegistryAuth,
    /// Skip TLS certificate verification
    pub accept_invalid_certs: bool,
}

impl ClientConfig {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            auth: RegistryAuth::anonymous(),
            accept_invalid_certs: false,
        }
    }

    pub fn with_auth(mut self, auth: RegistryAuth) -> Self {
        self.auth = auth;
        self
    }

    pub fn with_accept_invalid_certs(mut self, accept: bool) -> Self {
        self.accept_invalid_certs = accept;
        self
    }
}

/// Body of `GET /v2/_catalog`.
#[derive(Debug, Deserialize)]
struct CatalogBody {
    #[serde(default)]
    repositories: Vec<String>,
}

/// Body of `GET /v2/<name>/tags/list`.
#[derive(Debug, Deserialize)]
struct TagListBody {
    #[serde(default)]
    tags: Option<Vec<String>>,
}

/// Registry HTTP API V2 client.
///
/// Requests are issued one at a time with no retries; callers decide
/// which failures abort a sweep and which only skip a tag.
pub struct RegistryClient {
    http: reqwest::Client,
    endpoint: String,
    auth: RegistryAuth,
}

impl RegistryClient {
    /// Build a client for the configured endpoint.
    pub fn new(config: ClientConfig) -> Result<Self> {
        let endpoint = normalize_endpoint(&config.endpoint)?;
        let http = reqwest::Client::builder()
            .danger_accept_invalid_certs(config.accept_invalid_certs)
            .build()
            .map_err(|e| SweepError::Config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            endpoint,
            auth: config.auth,
        })
    }

    /// The normalized endpoint this client talks to.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn url(&self, path: &str) -> String {
        format!("{}/v2/{}", self.endpoint, path)
    }

    fn err(&self, message: String) -> SweepError {
        SweepError::Registry {
            registry: self.endpoint.clone(),
            message,
        }
    }

    /// Send a request and require a 2xx response.
    async fn send(&self, request: RequestBuilder, what: &str) -> Result<Response> {
        let response = self
            .auth
            .apply(request)
            .send()
            .await
            .map_err(|e| self.err(format!("{what}: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(self.err(format!("{what}: HTTP {status}")));
        }
        Ok(response)
    }
}

#[async_trait]
impl RegistryBackend for RegistryClient {
    async fn catalog_page(&self, limit: usize, last: Option<&str>) -> Result<CatalogPage> {
        let mut request = self
            .http
            .get(self.url("_catalog"))
            .query(&[("n", limit.to_string())]);
        if let Some(last) = last {
            request = request.query(&[("last", last)]);
        }

        let response = self.send(request, "catalog request failed").await?;
        // More pages exist while the registry keeps returning a Link
        // header; its absence is the end-of-catalog signal.
        let more = response.headers().contains_key(LINK);
        let body: CatalogBody = response
            .json()
            .await
            .map_err(|e| self.err(format!("catalog response: {e}")))?;

        Ok(CatalogPage {
            repositories: body.repositories,
            more,
        })
    }

    async fn list_tags(&self, repository: &str) -> Result<Vec<String>> {
        let request = self.http.get(self.url(&format!("{repository}/tags/list")));
        let response = self
            .send(request, &format!("tags list for '{repository}' failed"))
            .await?;
        let body: TagListBody = response
            .json()
            .await
            .map_err(|e| self.err(format!("tags response for '{repository}': {e}")))?;

        // Registries report "tags": null for a repository whose tags were
        // all deleted.
        Ok(body.tags.unwrap_or_default())
    }

    async fn tag_descriptor(&self, repository: &str, tag: &str) -> Result<TagDescriptor> {
        let request = self
            .http
            .head(self.url(&format!("{repository}/manifests/{tag}")))
            .header(ACCEPT, manifest_accept());
        let response = self
            .send(
                request,
                &format!("descriptor for '{repository}:{tag}' failed"),
            )
            .await?;

        let digest = response
            .headers()
            .get("docker-content-digest")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
            .ok_or_else(|| {
                self.err(format!(
                    "no Docker-Content-Digest header for '{repository}:{tag}'"
                ))
            })?;

        let media_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("application/octet-stream")
            .to_string();

        Ok(TagDescriptor {
            tag: tag.to_string(),
            digest,
            media_type,
        })
    }

    async fn manifest(&self, repository: &str, digest: &str) -> Result<Vec<u8>> {
        let request = self
            .http
            .get(self.url(&format!("{repository}/manifests/{digest}")))
            .header(ACCEPT, manifest_accept());
        let response = self
            .send(
                request,
                &format!("manifest fetch for '{repository}@{digest}' failed"),
            )
            .await?;

        let bytes = response
            .bytes()
            .await
            .map_err(|e| self.err(format!("manifest body for '{repository}@{digest}': {e}")))?;
        Ok(bytes.to_vec())
    }

    async fn blob(&self, repository: &str, digest: &str) -> Result<Vec<u8>> {
        let request = self
            .http
            .get(self.url(&format!("{repository}/blobs/{digest}")));
        let response = self
            .send(
                request,
                &format!("blob fetch for '{repository}@{digest}' failed"),
            )
            .await?;

        let bytes = response
            .bytes()
            .await
            .map_err(|e| self.err(format!("blob body for '{repository}@{digest}': {e}")))?;
        Ok(bytes.to_vec())
    }

    async fn delete_manifest(&self, repository: &str, digest: &str) -> Result<()> {
        let request = self
            .http
            .delete(self.url(&format!("{repository}/manifests/{digest}")));
        self.send(request, &format!("delete of '{repository}@{digest}' failed"))
            .await?;
        Ok(())
    }
}

/// Accept list sent with manifest requests: both Docker schema
/// generations plus OCI.
fn manifest_accept() -> String {
    [
        media_types::MANIFEST_V2,
        media_types::MANIFEST_V1,
        media_types::MANIFEST_V1_SIGNED,
        media_types::OCI_MANIFEST,
    ]
    .join(", ")
}

/// Validate a registry endpoint URL and strip trailing slashes.
fn normalize_endpoint(endpoint: &str) -> Result<String> {
    let trimmed = endpoint.trim().trim_end_matches('/');
    let host = trimmed
        .strip_prefix("https://")
        .or_else(|| trimmed.strip_prefix("http://"));

    match host {
        Some(host) if !host.is_empty() => Ok(trimmed.to_string()),
        _ => Err(SweepError::Config(format!(
            "invalid registry endpoint '{endpoint}': expected an http:// or https:// URL"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_auth_anonymous() {
        let auth = RegistryAuth::anonymous();
        assert!(auth.username.is_none());
        assert!(auth.password.is_none());
        assert!(auth.is_anonymous());
    }

    #[test]
    fn test_registry_auth_basic() {
        let auth = RegistryAuth::basic("user", "pass");
        assert_eq!(auth.username, Some("user".to_string()));
        assert_eq!(auth.password, Some("pass".to_string()));
        assert!(!auth.is_anonymous());
    }

    #[test]
    fn test_normalize_endpoint_strips_trailing_slash() {
        assert_eq!(
            normalize_endpoint("https://registry.example.com/").unwrap(),
            "https://registry.example.com"
        );
        assert_eq!(
            normalize_endpoint("  http://localhost:5000  ").unwrap(),
            "http://localhost:5000"
        );
    }

    #[test]
    fn test_normalize_endpoint_requires_scheme() {
        assert!(normalize_endpoint("registry.example.com").is_err());
        assert!(normalize_endpoint("ftp://registry.example.com").is_err());
        assert!(normalize_endpoint("https://").is_err());
        assert!(normalize_endpoint("").is_err());
    }

    #[test]
    fn test_client_rejects_bad_endpoint() {
        let result = RegistryClient::new(ClientConfig::new("registry.example.com"));
        assert!(matches!(result, Err(SweepError::Config(_))));
    }

    #[test]
    fn test_client_url_layout() {
        let client = RegistryClient::new(ClientConfig::new("https://registry.example.com/"))
            .unwrap();
        assert_eq!(client.endpoint(), "https://registry.example.com");
        assert_eq!(
            client.url("_catalog"),
            "https://registry.example.com/v2/_catalog"
        );
        assert_eq!(
            client.url("team/app/manifests/sha256:abc"),
            "https://registry.example.com/v2/team/app/manifests/sha256:abc"
        );
    }

    #[test]
    fn test_manifest_accept_lists_both_generations() {
        let accept = manifest_accept();
        assert!(accept.contains(media_types::MANIFEST_V2));
        assert!(accept.contains(media_types::MANIFEST_V1));
        assert!(accept.contains(media_types::MANIFEST_V1_SIGNED));
        assert!(accept.contains(media_types::OCI_MANIFEST));
    }

    #[test]
    fn test_client_config_builder() {
        let config = ClientConfig::new("https://registry.example.com")
            .with_auth(RegistryAuth::basic("user", "pass"))
            .with_accept_invalid_certs(true);
        assert!(config.accept_invalid_certs);
        assert!(!config.auth.is_anonymous());
    }
}
