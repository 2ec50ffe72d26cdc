//! Background job runner.
//!
//! Jobs are fire-and-forget from the caller's point of view: spawning
//! returns the job record immediately. Each job works on its own store
//! session and can be cancelled between units of work.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use uuid::Uuid;

use super::bulk_resolve::BulkResolver;
use super::reconcile::Reconciler;
use super::types::{JobError, JobKind, JobRecord, JobState, JobSummary};
use crate::catalog::{CatalogError, CatalogStore};
use crate::metrics;
use crate::resolver::MetadataResolver;
use crate::scanner::PathScanner;

struct TrackedJob {
    record: JobRecord,
    cancel: CancellationToken,
}

/// Spawns and tracks scan and bulk-resolve jobs.
pub struct JobManager {
    store: Arc<dyn CatalogStore>,
    scanner: Arc<PathScanner>,
    resolver: Arc<dyn MetadataResolver>,
    max_retained: usize,
    jobs: Arc<RwLock<HashMap<String, TrackedJob>>>,
    /// Parent of every job token; cancelled on shutdown.
    shutdown: CancellationToken,
}

impl JobManager {
    pub fn new(
        store: Arc<dyn CatalogStore>,
        scanner: Arc<PathScanner>,
        resolver: Arc<dyn MetadataResolver>,
        max_retained: usize,
    ) -> Self {
        Self {
            store,
            scanner,
            resolver,
            max_retained,
            jobs: Arc::new(RwLock::new(HashMap::new())),
            shutdown: CancellationToken::new(),
        }
    }

    /// Start a scan of every registered root.
    pub async fn spawn_scan(&self) -> Result<JobRecord, JobError> {
        let reconciler = Reconciler::new(self.store.open_session()?, self.scanner.clone());
        let (record, cancel) = self.register(JobKind::Scan).await;

        let jobs = self.jobs.clone();
        let max_retained = self.max_retained;
        let id = record.id.clone();
        tokio::spawn(async move {
            // Directory reads and SQLite writes block
            let result = tokio::task::spawn_blocking(move || reconciler.run(&cancel))
                .await
                .map_err(|e| CatalogError::Internal(format!("scan task panicked: {}", e)))
                .and_then(|r| r);
            let result = result.map(JobSummary::Scan);
            finish(&jobs, &id, result, max_retained).await;
        });

        Ok(record)
    }

    /// Start metadata resolution for every eligible entry.
    pub async fn spawn_bulk_resolve(&self) -> Result<JobRecord, JobError> {
        let bulk = BulkResolver::new(self.store.open_session()?, self.resolver.clone());
        let (record, cancel) = self.register(JobKind::BulkResolve).await;

        let jobs = self.jobs.clone();
        let max_retained = self.max_retained;
        let id = record.id.clone();
        tokio::spawn(async move {
            let result = bulk.resolve_all(&cancel).await.map(JobSummary::BulkResolve);
            finish(&jobs, &id, result, max_retained).await;
        });

        Ok(record)
    }

    async fn register(&self, kind: JobKind) -> (JobRecord, CancellationToken) {
        let record = JobRecord {
            id: Uuid::new_v4().to_string(),
            kind,
            state: JobState::Running,
            started_at: Utc::now(),
            finished_at: None,
            summary: None,
            error: None,
        };
        let cancel = self.shutdown.child_token();

        info!("Starting {} job {}", kind, record.id);

        self.jobs.write().await.insert(
            record.id.clone(),
            TrackedJob {
                record: record.clone(),
                cancel: cancel.clone(),
            },
        );

        (record, cancel)
    }

    /// All tracked jobs, newest first.
    pub async fn list(&self) -> Vec<JobRecord> {
        let mut records: Vec<JobRecord> = self
            .jobs
            .read()
            .await
            .values()
            .map(|job| job.record.clone())
            .collect();
        records.sort_by(|a, b| b.started_at.cmp(&a.started_at));
        records
    }

    pub async fn get(&self, id: &str) -> Result<JobRecord, JobError> {
        self.jobs
            .read()
            .await
            .get(id)
            .map(|job| job.record.clone())
            .ok_or_else(|| JobError::NotFound(id.to_string()))
    }

    /// Request cancellation. The job stops at its next checkpoint; cancelling
    /// a finished job is a no-op.
    pub async fn cancel(&self, id: &str) -> Result<JobRecord, JobError> {
        let jobs = self.jobs.read().await;
        let job = jobs
            .get(id)
            .ok_or_else(|| JobError::NotFound(id.to_string()))?;

        if !job.record.state.is_finished() {
            info!("Cancelling job {}", id);
            job.cancel.cancel();
        }

        Ok(job.record.clone())
    }

    /// Job counts per state.
    pub async fn counts_by_state(&self) -> HashMap<JobState, usize> {
        let mut counts: HashMap<JobState, usize> =
            JobState::ALL.iter().map(|state| (*state, 0)).collect();
        for job in self.jobs.read().await.values() {
            *counts.entry(job.record.state).or_default() += 1;
        }
        counts
    }

    /// Cancel every running job.
    pub fn shutdown(&self) {
        self.shutdown.cancel();
    }
}

async fn finish(
    jobs: &RwLock<HashMap<String, TrackedJob>>,
    id: &str,
    result: Result<JobSummary, CatalogError>,
    max_retained: usize,
) {
    let mut jobs = jobs.write().await;

    if let Some(job) = jobs.get_mut(id) {
        let record = &mut job.record;
        match result {
            Ok(summary) => {
                record.state = if summary.was_cancelled() {
                    JobState::Cancelled
                } else {
                    JobState::Completed
                };
                record.summary = Some(summary);
            }
            Err(e) => {
                error!("Job {} failed: {}", id, e);
                record.state = JobState::Failed;
                record.error = Some(e.to_string());
            }
        }

        let finished_at = Utc::now();
        record.finished_at = Some(finished_at);

        let elapsed = (finished_at - record.started_at).num_milliseconds() as f64 / 1000.0;
        metrics::JOB_DURATION
            .with_label_values(&[record.kind.as_str()])
            .observe(elapsed);
        metrics::JOBS_FINISHED
            .with_label_values(&[record.kind.as_str(), record.state.as_str()])
            .inc();

        info!("{} job {} finished: {}", record.kind, id, record.state.as_str());
    }

    evict_finished(&mut jobs, max_retained);
}

/// Drop the oldest finished records beyond `max_retained`. Running jobs are
/// always kept.
fn evict_finished(jobs: &mut HashMap<String, TrackedJob>, max_retained: usize) {
    let mut finished: Vec<(String, chrono::DateTime<Utc>)> = jobs
        .values()
        .filter_map(|job| {
            job.record
                .finished_at
                .map(|at| (job.record.id.clone(), at))
        })
        .collect();

    if finished.len() <= max_retained {
        return;
    }

    finished.sort_by(|a, b| a.1.cmp(&b.1));
    let excess = finished.len() - max_retained;
    for (id, _) in finished.into_iter().take(excess) {
        jobs.remove(&id);
    }
}
