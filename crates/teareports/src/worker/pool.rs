use std::path::PathBuf;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::error::JobError;
use crate::storage::ArtifactStore;
use crate::worker::extractor::{ExtractContext, RawArtifact};
use crate::worker::job::{Job, JobOutcome, JobStatus};

/// Aggregate result of one orchestrator run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionSummary {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub ended_at: DateTime<Utc>,
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub outcomes: Vec<JobOutcome>,
}

impl ExecutionSummary {
    fn from_outcomes(
        run_id: Uuid,
        started_at: DateTime<Utc>,
        outcomes: Vec<JobOutcome>,
    ) -> Self {
        let succeeded = outcomes.iter().filter(|o| o.is_success()).count();
        Self {
            run_id,
            started_at,
            ended_at: Utc::now(),
            total: outcomes.len(),
            succeeded,
            failed: outcomes.len() - succeeded,
            outcomes,
        }
    }

    /// Number of failed jobs whose final attempt hit the timeout.
    pub fn timed_out(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| o.status == JobStatus::Timeout)
            .count()
    }

    /// Conventional process exit code: 0 when at least one job succeeded.
    pub fn exit_code(&self) -> i32 {
        if self.succeeded > 0 {
            0
        } else {
            1
        }
    }

    pub fn outcome(&self, source_id: &str) -> Option<&JobOutcome> {
        self.outcomes.iter().find(|o| o.source_id == source_id)
    }
}

/// Runs extraction jobs with bounded parallelism, per-attempt timeouts and retries.
///
/// `run` never fails: every job ends up as exactly one [`JobOutcome`].
pub struct Orchestrator {
    raw_store: ArtifactStore,
}

impl Orchestrator {
    /// `raw_directory` receives JSON/byte artifacts returned by extractors.
    pub fn new(raw_directory: impl Into<PathBuf>) -> Self {
        Self {
            raw_store: ArtifactStore::new(raw_directory.into()),
        }
    }

    pub async fn run(&self, jobs: &[Job], concurrency_limit: usize) -> ExecutionSummary {
        let run_id = Uuid::new_v4();
        let started_at = Utc::now();
        let limit = concurrency_limit.max(1);
        let semaphore = Arc::new(Semaphore::new(limit));

        info!(%run_id, jobs = jobs.len(), concurrency = limit, "Starting extraction run");

        let mut handles: Vec<(Job, JoinHandle<JobOutcome>)> = Vec::with_capacity(jobs.len());
        for job in jobs {
            let task_job = job.clone();
            let semaphore = Arc::clone(&semaphore);
            let store = self.raw_store.clone();

            let handle = tokio::spawn(async move {
                let started_at = Utc::now();
                let _permit = match semaphore.acquire_owned().await {
                    Ok(permit) => permit,
                    Err(_) => {
                        let err = JobError::ExecutionFailure("worker pool closed".to_string());
                        return JobOutcome::failure(&task_job, started_at, 0, &err);
                    }
                };
                execute_job(&task_job, &store, run_id).await
            });
            handles.push((job.clone(), handle));
        }

        let mut outcomes = Vec::with_capacity(handles.len());
        for (job, handle) in handles {
            let outcome = match handle.await {
                Ok(outcome) => outcome,
                Err(e) => {
                    error!(source_id = %job.source_id, "Job task panicked: {}", e);
                    let err = JobError::ExecutionFailure(format!("job task panicked: {}", e));
                    JobOutcome::failure(&job, Utc::now(), 0, &err)
                }
            };
            outcomes.push(outcome);
        }

        let summary = ExecutionSummary::from_outcomes(run_id, started_at, outcomes);
        info!(
            %run_id,
            total = summary.total,
            succeeded = summary.succeeded,
            failed = summary.failed,
            "Extraction run complete: {}/{} jobs succeeded",
            summary.succeeded,
            summary.total
        );
        summary
    }
}

async fn execute_job(job: &Job, store: &ArtifactStore, run_id: Uuid) -> JobOutcome {
    let started_at = Utc::now();
    let max_attempts = job.retry_policy.max_attempts.max(1);
    let mut attempt = 0;

    let result = loop {
        attempt += 1;
        let span = info_span!("job_attempt", source_id = %job.source_id, attempt);
        let result = run_attempt(job, attempt, run_id).instrument(span).await;

        match result {
            Ok(artifact) => break Ok(artifact),
            Err(e) if attempt < max_attempts => {
                let delay = job.retry_policy.delay_after(attempt);
                warn!(
                    source_id = %job.source_id,
                    attempt,
                    max_attempts,
                    "Attempt failed ({}), retrying in {:?}",
                    e,
                    delay
                );
                tokio::time::sleep(delay).await;
            }
            Err(e) => break Err(e),
        }
    };

    let result = match result {
        Ok(artifact) => persist_artifact(store, &job.source_id, run_id, artifact).await,
        Err(e) => Err(e),
    };
    let outcome = match result {
        Ok(artifact_ref) => JobOutcome::success(job, started_at, attempt, artifact_ref),
        Err(e) => JobOutcome::failure(job, started_at, attempt, &e),
    };

    match outcome.status {
        JobStatus::Success => info!(source_id = %job.source_id, attempts = attempt, "Job succeeded"),
        status => error!(
            source_id = %job.source_id,
            attempts = attempt,
            %status,
            "Job failed: {}",
            outcome.error_detail.as_deref().unwrap_or("unknown error")
        ),
    }
    outcome
}

/// Runs one attempt as its own task so that a timeout can abort it without
/// affecting any other job.
async fn run_attempt(job: &Job, attempt: u32, run_id: Uuid) -> Result<RawArtifact, JobError> {
    let extractor = Arc::clone(&job.extractor);
    let ctx = ExtractContext {
        source_id: job.source_id.clone(),
        attempt,
        run_id,
    };

    debug!("Running {}", extractor.describe());
    let mut handle = tokio::spawn(async move { extractor.extract(&ctx).await });

    match tokio::time::timeout(job.timeout, &mut handle).await {
        Ok(Ok(result)) => result,
        Ok(Err(e)) => Err(JobError::ExecutionFailure(format!(
            "extractor task failed: {}",
            e
        ))),
        Err(_) => {
            handle.abort();
            Err(JobError::Timeout { after: job.timeout })
        }
    }
}

/// Writes the artifact under `<source_id>/` on the blocking pool.
///
/// Directory artifacts were already written by the extractor and are passed through.
async fn persist_artifact(
    store: &ArtifactStore,
    source_id: &str,
    run_id: Uuid,
    artifact: RawArtifact,
) -> Result<Option<PathBuf>, JobError> {
    let stem = format!(
        "{}/{}_{}",
        source_id,
        Utc::now().format("%Y%m%dT%H%M%S"),
        run_id.simple()
    );
    let store = store.clone();

    let write = match artifact {
        RawArtifact::Directory(dir) => return Ok(Some(dir)),
        RawArtifact::Json(value) => tokio::task::spawn_blocking(move || {
            store.write_json(format!("{}.json", stem), &value)
        }),
        RawArtifact::Bytes(bytes) => tokio::task::spawn_blocking(move || {
            store.write_bytes(format!("{}.bin", stem), &bytes)
        }),
    };

    match write.await {
        Ok(written) => written
            .map(Some)
            .map_err(|e| JobError::ExecutionFailure(format!("failed to persist artifact: {}", e))),
        Err(e) => Err(JobError::ExecutionFailure(format!(
            "artifact writer failed: {}",
            e
        ))),
    }
}
