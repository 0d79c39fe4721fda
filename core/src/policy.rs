//! Retention policy and the keep/delete decision logic.
//!
//! A policy carries an optional age threshold in days plus optional keep
//! and remove patterns matched against the `repository:tag` name. Without
//! a threshold the policy is report-only: every record is listed and
//! nothing is ever deleted.

use chrono::{DateTime, Duration, Utc};
use regex::Regex;

use crate::error::{Result, SweepError};
use crate::record::TagRecord;

/// Verdict for a single tag record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Tag stays: too young, protected by the keep pattern, or outside
    /// the remove pattern
    Keep,
    /// Tag is old enough and unprotected
    Delete,
    /// Report-only mode: the record is listed, never deleted
    Report,
}

/// Retention rules for one sweep run.
#[derive(Debug, Clone)]
pub struct RetentionPolicy {
    threshold_days: Option<u32>,
    keep: Option<Regex>,
    remove: Option<Regex>,
    dry_run: bool,
}

impl RetentionPolicy {
    /// Report-only policy: every record is listed, nothing is deleted.
    pub fn report_only() -> Self {
        Self {
            threshold_days: None,
            keep: None,
            remove: None,
            dry_run: true,
        }
    }

    /// Policy selecting tags created more than `days` days ago.
    ///
    /// Deletions are simulated until [`with_dry_run`](Self::with_dry_run)
    /// turns the dry run off.
    pub fn max_age_days(days: u32) -> Self {
        Self {
            threshold_days: Some(days),
            keep: None,
            remove: None,
            dry_run: true,
        }
    }

    /// Protect tags whose `repository:tag` matches `pattern`.
    ///
    /// A keep match overrides the age threshold and the remove pattern.
    pub fn with_keep_pattern(mut self, pattern: &str) -> Result<Self> {
        self.keep = Some(compile(pattern, "keep")?);
        Ok(self)
    }

    /// Restrict deletion to tags whose `repository:tag` matches `pattern`.
    pub fn with_remove_pattern(mut self, pattern: &str) -> Result<Self> {
        self.remove = Some(compile(pattern, "remove")?);
        Ok(self)
    }

    /// Simulate deletions (`true`, the default) or perform them (`false`).
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn dry_run(&self) -> bool {
        self.dry_run
    }

    pub fn is_report_only(&self) -> bool {
        self.threshold_days.is_none()
    }

    pub fn threshold_days(&self) -> Option<u32> {
        self.threshold_days
    }

    /// Decide what to do with `record` as of `now`.
    ///
    /// Precedence: keep pattern first, then age, then remove pattern.
    /// A record qualifies on age only when it was created strictly before
    /// `now - threshold` days; exact equality counts as not old enough.
    pub fn decide(&self, record: &TagRecord, now: DateTime<Utc>) -> Decision {
        let days = match self.threshold_days {
            Some(days) => days,
            None => return Decision::Report,
        };

        let name = record.qualified_name();
        if let Some(keep) = &self.keep {
            if keep.is_match(&name) {
                return Decision::Keep;
            }
        }

        let cutoff = now - Duration::days(i64::from(days));
        if record.created >= cutoff {
            return Decision::Keep;
        }

        match &self.remove {
            Some(remove) if !remove.is_match(&name) => Decision::Keep,
            _ => Decision::Delete,
        }
    }
}

fn compile(pattern: &str, which: &str) -> Result<Regex> {
    Regex::new(pattern)
        .map_err(|e| SweepError::Config(format!("invalid {which} pattern '{pattern}': {e}")))
}
