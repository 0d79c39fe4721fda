//! The sweep engine: walk the catalog, resolve tags, evaluate the policy,
//! and act on the decisions.
//!
//! Failure handling is two-tier: catalog page and tag list errors abort
//! the run; everything below one tag (descriptor, manifest, config blob,
//! timestamp, deletion) is logged with context and skipped.

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use regsweep_core::error::Result;
use regsweep_core::policy::{Decision, RetentionPolicy};
use regsweep_core::record::{DeletionOutcome, OutcomeKind, TagRecord};

use crate::backend::RegistryBackend;
use crate::catalog::CatalogWalker;
use crate::manifest;

/// Tags resolved from one repository.
#[derive(Debug, Default)]
pub struct RepositoryScan {
    /// Records for every tag whose creation time could be resolved
    pub records: Vec<TagRecord>,
    /// Tags seen in the repository, resolved or not
    pub tags: usize,
    /// Tags skipped because their metadata could not be resolved
    pub skipped: usize,
}

/// Totals and outcomes for one sweep run.
#[derive(Debug, Default)]
pub struct SweepReport {
    /// Repositories walked
    pub repositories: usize,
    /// Tags seen across all repositories
    pub tags: usize,
    /// Tags skipped because their metadata could not be resolved
    pub skipped: usize,
    /// Tags the policy kept
    pub kept: usize,
    /// Outcome of every report and delete decision, in walk order
    pub outcomes: Vec<DeletionOutcome>,
}

impl SweepReport {
    /// Candidates listed in report-only mode.
    pub fn reported(&self) -> usize {
        self.count(OutcomeKind::Reported)
    }

    /// Deletions simulated by a dry run.
    pub fn simulated(&self) -> usize {
        self.count(OutcomeKind::DryRun)
    }

    /// Deletions the registry accepted.
    pub fn deleted(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| o.kind == OutcomeKind::Deleted && o.succeeded())
            .count()
    }

    /// Deletions the registry rejected.
    pub fn failed(&self) -> usize {
        self.outcomes.iter().filter(|o| !o.succeeded()).count()
    }

    fn count(&self, kind: OutcomeKind) -> usize {
        self.outcomes.iter().filter(|o| o.kind == kind).count()
    }
}

/// Enumerate and resolve every tag in one repository.
///
/// A tag whose descriptor or metadata cannot be resolved is logged and
/// skipped. A failure to list the tags at all is returned to the caller.
pub async fn resolve_repository<B>(backend: &B, repository: &str) -> Result<RepositoryScan>
where
    B: RegistryBackend + ?Sized,
{
    let tags = backend.list_tags(repository).await?;
    let mut scan = RepositoryScan {
        records: Vec::with_capacity(tags.len()),
        ..Default::default()
    };

    for tag in tags {
        scan.tags += 1;

        let descriptor = match backend.tag_descriptor(repository, &tag).await {
            Ok(descriptor) => descriptor,
            Err(e) => {
                warn!(
                    repository = %repository,
                    tag = %tag,
                    error = %e,
                    "cannot resolve tag descriptor, skipping"
                );
                scan.skipped += 1;
                continue;
            }
        };

        let created =
            match manifest::resolve_created(backend, repository, &descriptor.digest).await {
                Ok(created) => created,
                Err(e) => {
                    warn!(
                        repository = %repository,
                        tag = %tag,
                        digest = %descriptor.digest,
                        error = %e,
                        "cannot resolve creation time, skipping"
                    );
                    scan.skipped += 1;
                    continue;
                }
            };

        scan.records.push(TagRecord {
            repository: repository.to_string(),
            tag: descriptor.tag,
            digest: descriptor.digest,
            created,
        });
    }

    Ok(scan)
}

/// Drives a full retention sweep over one registry.
pub struct Sweeper<B> {
    backend: B,
    policy: RetentionPolicy,
}

impl<B: RegistryBackend> Sweeper<B> {
    pub fn new(backend: B, policy: RetentionPolicy) -> Self {
        Self { backend, policy }
    }

    /// Run the sweep, evaluating ages against the current time.
    pub async fn run(&self) -> Result<SweepReport> {
        self.run_at(Utc::now()).await
    }

    /// Run the sweep, evaluating ages against `now`.
    pub async fn run_at(&self, now: DateTime<Utc>) -> Result<SweepReport> {
        let mut report = SweepReport::default();
        let mut walker = CatalogWalker::new(&self.backend);

        while let Some(repository) = walker.next().await? {
            report.repositories += 1;

            let scan = resolve_repository(&self.backend, &repository).await?;
            report.tags += scan.tags;
            report.skipped += scan.skipped;

            for record in &scan.records {
                let decision = self.policy.decide(record, now);
                match self.execute(record, decision).await {
                    Some(outcome) => report.outcomes.push(outcome),
                    None => report.kept += 1,
                }
            }
        }

        Ok(report)
    }

    /// Act on the decision for one record. Kept tags produce no outcome.
    async fn execute(&self, record: &TagRecord, decision: Decision) -> Option<DeletionOutcome> {
        let created = record.created_display();

        match decision {
            Decision::Keep => {
                debug!(
                    repository = %record.repository,
                    tag = %record.tag,
                    "keeping tag"
                );
                None
            }
            Decision::Report => {
                info!(
                    "FOUND: repo:{}:{}, digest: {}, created: {}",
                    record.repository, record.tag, record.digest, created
                );
                Some(self.outcome(record, OutcomeKind::Reported, None))
            }
            Decision::Delete if self.policy.dry_run() => {
                info!(
                    "DRY: repo:{}:{}, digest: {}, created: {}",
                    record.repository, record.tag, record.digest, created
                );
                Some(self.outcome(record, OutcomeKind::DryRun, None))
            }
            Decision::Delete => {
                info!(
                    "repo:{}:{}, digest: {}, created: {}",
                    record.repository, record.tag, record.digest, created
                );
                let error = match self
                    .backend
                    .delete_manifest(&record.repository, &record.digest)
                    .await
                {
                    Ok(()) => None,
                    Err(e) => {
                        warn!(
                            repository = %record.repository,
                            tag = %record.tag,
                            digest = %record.digest,
                            error = %e,
                            "delete failed"
                        );
                        Some(e.to_string())
                    }
                };
                Some(self.outcome(record, OutcomeKind::Deleted, error))
            }
        }
    }

    fn outcome(
        &self,
        record: &TagRecord,
        kind: OutcomeKind,
        error: Option<String>,
    ) -> DeletionOutcome {
        DeletionOutcome {
            target: record.qualified_name(),
            digest: record.digest.clone(),
            kind,
            error,
        }
    }
}
