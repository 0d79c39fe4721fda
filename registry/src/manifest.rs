//! Manifest decoding and creation-time resolution.
//!
//! Two manifest generations are in the wild. Schema 2 (and OCI) manifests
//! name a separate config blob whose payload holds the `created` timestamp.
//! Legacy schema 1 manifests embed it directly: the `history` array's first
//! entry has a `v1Compatibility` value that is a JSON document nested inside
//! a JSON string, decoded in two stages. Payloads are probed as generic
//! documents; only the fields needed here are decoded.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;

use regsweep_core::error::{Result, SweepError};

use crate::backend::RegistryBackend;

/// Media types requested when fetching manifests.
pub mod media_types {
    pub const MANIFEST_V2: &str = "application/vnd.docker.distribution.manifest.v2+json";
    pub const MANIFEST_V1: &str = "application/vnd.docker.distribution.manifest.v1+json";
    pub const MANIFEST_V1_SIGNED: &str =
        "application/vnd.docker.distribution.manifest.v1+prettyjws";
    pub const OCI_MANIFEST: &str = "application/vnd.oci.image.manifest.v1+json";
}

/// `config` descriptor of a schema 2 manifest.
#[derive(Debug, Deserialize)]
struct ConfigDescriptor {
    digest: String,
}

/// One entry of a schema 1 `history` array.
#[derive(Debug, Deserialize)]
struct HistoryEntry {
    #[serde(rename = "v1Compatibility")]
    v1_compatibility: Option<String>,
}

/// Manifest metadata, discriminated by payload shape.
///
/// The schema is chosen by field presence: `config` means schema 2,
/// otherwise `history` means schema 1. A payload with neither (an image
/// index, for example) carries no creation time at all.
#[derive(Debug)]
pub enum ManifestMetadata {
    /// Schema 2: the creation time lives in the config blob named here
    Schema2 { config_digest: String },
    /// Schema 1: the creation time lives in this nested JSON document
    Schema1 { v1_compatibility: String },
}

impl ManifestMetadata {
    /// Decode a manifest payload. `digest` is used for error context only.
    pub fn decode(digest: &str, payload: &[u8]) -> Result<Self> {
        let doc: Value =
            serde_json::from_slice(payload).map_err(|e| SweepError::MalformedPayload {
                digest: digest.to_string(),
                detail: format!("manifest is not valid JSON: {e}"),
            })?;

        if let Some(config) = doc.get("config") {
            let config: ConfigDescriptor = serde_json::from_value(config.clone()).map_err(
                |e| SweepError::MalformedPayload {
                    digest: digest.to_string(),
                    detail: format!("config descriptor: {e}"),
                },
            )?;
            return Ok(Self::Schema2 {
                config_digest: config.digest,
            });
        }

        match doc.get("history") {
            Some(Value::Array(entries)) => {
                // Only the first history entry is consulted; it describes
                // the image's top layer and carries its creation time.
                let first = entries.first().ok_or_else(|| SweepError::MissingMetadata {
                    digest: digest.to_string(),
                    detail: "history is empty".to_string(),
                })?;
                let entry: HistoryEntry = serde_json::from_value(first.clone()).map_err(|e| {
                    SweepError::MalformedPayload {
                        digest: digest.to_string(),
                        detail: format!("history entry: {e}"),
                    }
                })?;
                let v1_compatibility =
                    entry
                        .v1_compatibility
                        .ok_or_else(|| SweepError::MalformedPayload {
                            digest: digest.to_string(),
                            detail: "history entry has no v1Compatibility".to_string(),
                        })?;
                Ok(Self::Schema1 { v1_compatibility })
            }
            Some(_) => Err(SweepError::MalformedPayload {
                digest: digest.to_string(),
                detail: "history is not an array".to_string(),
            }),
            None => Err(SweepError::MissingMetadata {
                digest: digest.to_string(),
                detail: "manifest has neither config nor history".to_string(),
            }),
        }
    }
}

/// Resolve the creation time of the manifest at `digest`.
pub async fn resolve_created<B>(
    backend: &B,
    repository: &str,
    digest: &str,
) -> Result<DateTime<Utc>>
where
    B: RegistryBackend + ?Sized,
{
    let payload = backend.manifest(repository, digest).await?;

    match ManifestMetadata::decode(digest, &payload)? {
        ManifestMetadata::Schema2 { config_digest } => {
            let blob = backend.blob(repository, &config_digest).await?;
            let doc: Value =
                serde_json::from_slice(&blob).map_err(|e| SweepError::MalformedPayload {
                    digest: config_digest.clone(),
                    detail: format!("config blob is not valid JSON: {e}"),
                })?;
            created_field(&config_digest, &doc)
        }
        ManifestMetadata::Schema1 { v1_compatibility } => {
            // Second decode stage: the compatibility document is JSON
            // nested inside a JSON string.
            let doc: Value = serde_json::from_str(&v1_compatibility).map_err(|e| {
                SweepError::MissingMetadata {
                    digest: digest.to_string(),
                    detail: format!("v1Compatibility is not a JSON document: {e}"),
                }
            })?;
            created_field(digest, &doc)
        }
    }
}

/// Read the `created` field out of a config-style document.
fn created_field(digest: &str, doc: &Value) -> Result<DateTime<Utc>> {
    match doc.get("created") {
        Some(Value::String(value)) => parse_created(digest, value),
        Some(_) => Err(SweepError::MalformedPayload {
            digest: digest.to_string(),
            detail: "created is not a string".to_string(),
        }),
        None => Err(SweepError::MissingMetadata {
            digest: digest.to_string(),
            detail: "document has no created field".to_string(),
        }),
    }
}

/// Parse an RFC 3339 timestamp with up to nanosecond precision.
fn parse_created(digest: &str, value: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| SweepError::MalformedPayload {
            digest: digest.to_string(),
            detail: format!("created '{value}' is not RFC 3339: {e}"),
        })
}
