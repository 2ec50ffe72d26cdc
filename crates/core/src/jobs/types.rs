//! Types for background jobs.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::catalog::{CatalogError, Game};

/// Upper bound on error messages kept in a job summary.
pub const MAX_REPORTED_ERRORS: usize = 100;

/// What a job does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobKind {
    Scan,
    BulkResolve,
}

impl JobKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobKind::Scan => "scan",
            JobKind::BulkResolve => "bulk_resolve",
        }
    }
}

impl fmt::Display for JobKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle of a job run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobState {
    Running,
    Completed,
    /// Stopped early by a cancellation request. Work done before the
    /// signal is kept.
    Cancelled,
    /// Aborted by a storage failure.
    Failed,
}

impl JobState {
    pub const ALL: [JobState; 4] = [
        JobState::Running,
        JobState::Completed,
        JobState::Cancelled,
        JobState::Failed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            JobState::Running => "running",
            JobState::Completed => "completed",
            JobState::Cancelled => "cancelled",
            JobState::Failed => "failed",
        }
    }

    pub fn is_finished(&self) -> bool {
        !matches!(self, JobState::Running)
    }
}

/// Outcome of one ingestion run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestSummary {
    /// Roots actually read (including ones that failed to read).
    pub roots_scanned: u32,
    /// Roots skipped because they are on the ignore list.
    pub roots_ignored: u32,
    /// Candidates discovered across all scanned roots.
    pub candidates: u32,
    /// New catalog entries.
    pub created: u32,
    /// Candidates on the ignore list.
    pub skipped_ignored: u32,
    /// Candidates whose path was already catalogued.
    pub skipped_existing: u32,
    /// The run stopped before visiting every root.
    pub cancelled: bool,
    /// Per-root failures.
    pub errors: Vec<String>,
}

/// Outcome of one bulk resolution run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolveSummary {
    /// Entries looked up.
    pub attempted: u32,
    /// Entries moved to `RESOLVED`.
    pub resolved: u32,
    /// Lookups with no match; the entry stays eligible.
    pub not_found: u32,
    /// Lookups or writes that failed; the entry stays unchanged.
    pub failed: u32,
    /// Entries that changed status or were deleted while the run was in
    /// flight.
    pub skipped: u32,
    pub cancelled: bool,
    pub errors: Vec<String>,
}

/// Terminal summary of a job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum JobSummary {
    Scan(IngestSummary),
    BulkResolve(ResolveSummary),
}

impl JobSummary {
    pub fn was_cancelled(&self) -> bool {
        match self {
            JobSummary::Scan(s) => s.cancelled,
            JobSummary::BulkResolve(s) => s.cancelled,
        }
    }
}

/// A tracked job run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobRecord {
    pub id: String,
    pub kind: JobKind,
    pub state: JobState,
    pub started_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<JobSummary>,
    /// Failure reason for `Failed` jobs.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Result of resolving a single entry on request.
#[derive(Debug, Clone, PartialEq)]
pub enum ResolveOutcome {
    /// Metadata applied.
    Resolved(Game),
    /// No match; the entry is unchanged.
    NoMatch(Game),
}

/// Errors for job operations.
#[derive(Debug, Error)]
pub enum JobError {
    #[error("Job not found: {0}")]
    NotFound(String),

    #[error(transparent)]
    Catalog(#[from] CatalogError),
}

/// Append an error message unless the summary already holds the maximum.
pub(crate) fn push_error(errors: &mut Vec<String>, message: String) {
    if errors.len() < MAX_REPORTED_ERRORS {
        errors.push(message);
    }
}
