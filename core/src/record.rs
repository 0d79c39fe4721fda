//! Tag-level data passed between the sweep stages.

use chrono::{DateTime, SecondsFormat, Utc};

/// Descriptor for a tagged manifest, as reported by the registry.
#[derive(Debug, Clone)]
pub struct TagDescriptor {
    /// Tag name
    pub tag: String,
    /// Content-addressed manifest digest, e.g. `sha256:...`
    pub digest: String,
    /// Manifest media type from the Content-Type header
    pub media_type: String,
}

/// A fully resolved tag: identity plus creation time.
///
/// Only constructed once the creation timestamp is known. A tag whose
/// metadata cannot be resolved never becomes a record; it is logged and
/// skipped instead.
#[derive(Debug, Clone)]
pub struct TagRecord {
    pub repository: String,
    pub tag: String,
    pub digest: String,
    pub created: DateTime<Utc>,
}

impl TagRecord {
    /// Name used for pattern matching: `repository:tag`.
    pub fn qualified_name(&self) -> String {
        format!("{}:{}", self.repository, self.tag)
    }

    /// Creation time formatted for log lines (RFC 3339, seconds precision).
    pub fn created_display(&self) -> String {
        self.created.to_rfc3339_opts(SecondsFormat::Secs, true)
    }
}

/// What the executor did with a report or delete decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutcomeKind {
    /// Report-only mode: the candidate was listed, nothing was touched
    Reported,
    /// Dry run: the deletion was simulated
    DryRun,
    /// A deletion was issued against the registry
    Deleted,
}

/// Result of acting on a single record.
///
/// Kept tags produce no outcome; only reported, simulated, and attempted
/// deletions are recorded.
#[derive(Debug, Clone)]
pub struct DeletionOutcome {
    /// `repository:tag` the outcome refers to
    pub target: String,
    /// Manifest digest the action was addressed to
    pub digest: String,
    pub kind: OutcomeKind,
    /// Set when a real deletion failed; the sweep continues regardless
    pub error: Option<String>,
}

impl DeletionOutcome {
    pub fn succeeded(&self) -> bool {
        self.error.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn record() -> TagRecord {
        TagRecord {
            repository: "team/app".to_string(),
            tag: "v1.2.3".to_string(),
            digest: "sha256:abc123".to_string(),
            created: Utc.with_ymd_and_hms(2022, 1, 1, 0, 0, 0).unwrap(),
        }
    }

    #[test]
    fn test_qualified_name() {
        assert_eq!(record().qualified_name(), "team/app:v1.2.3");
    }

    #[test]
    fn test_created_display_seconds_precision() {
        assert_eq!(record().created_display(), "2022-01-01T00:00:00Z");
    }

    #[test]
    fn test_created_display_drops_nanoseconds() {
        let mut rec = record();
        rec.created = DateTime::parse_from_rfc3339("2016-10-07T21:03:58.469954392Z")
            .unwrap()
            .with_timezone(&Utc);
        assert_eq!(rec.created_display(), "2016-10-07T21:03:58Z");
    }

    #[test]
    fn test_outcome_succeeded() {
        let outcome = DeletionOutcome {
            target: "team/app:v1".to_string(),
            digest: "sha256:abc".to_string(),
            kind: OutcomeKind::Deleted,
            error: None,
        };
        assert!(outcome.succeeded());

        let failed = DeletionOutcome {
            error: Some("HTTP 500".to_string()),
            ..outcome
        };
        assert!(!failed.succeeded());
    }
}
