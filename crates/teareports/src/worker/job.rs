use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::{Backoff, RetryConfig};
use crate::error::JobError;
use crate::worker::extractor::Extractor;

/// Upper bound for a single exponential backoff delay.
const MAX_RETRY_DELAY: Duration = Duration::from_secs(600);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts including the first one. Always >= 1.
    pub max_attempts: u32,
    pub delay: Duration,
    pub backoff: Backoff,
}

impl RetryPolicy {
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            delay: Duration::ZERO,
            backoff: Backoff::Fixed,
        }
    }

    pub fn fixed(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            delay,
            backoff: Backoff::Fixed,
        }
    }

    pub fn exponential(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            delay,
            backoff: Backoff::Exponential,
        }
    }

    /// Delay to wait after `failed_attempt` (1-based) before the next attempt.
    pub fn delay_after(&self, failed_attempt: u32) -> Duration {
        match self.backoff {
            Backoff::Fixed => self.delay,
            Backoff::Exponential => {
                let exponent = failed_attempt.saturating_sub(1).min(16);
                self.delay
                    .checked_mul(1u32 << exponent)
                    .unwrap_or(MAX_RETRY_DELAY)
                    .min(MAX_RETRY_DELAY)
            }
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::none()
    }
}

impl From<&RetryConfig> for RetryPolicy {
    fn from(config: &RetryConfig) -> Self {
        Self {
            max_attempts: config.max_attempts.max(1),
            delay: Duration::from_secs(config.delay_secs),
            backoff: config.backoff,
        }
    }
}

/// A registered extraction job. Immutable for the duration of a run.
#[derive(Clone)]
pub struct Job {
    pub source_id: String,
    pub name: String,
    pub timeout: Duration,
    pub retry_policy: RetryPolicy,
    pub extractor: Arc<dyn Extractor>,
}

impl Job {
    pub fn new(source_id: impl Into<String>, extractor: Arc<dyn Extractor>, timeout: Duration) -> Self {
        let source_id = source_id.into();
        Self {
            name: source_id.clone(),
            source_id,
            timeout,
            retry_policy: RetryPolicy::none(),
            extractor,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_retry(mut self, retry_policy: RetryPolicy) -> Self {
        self.retry_policy = retry_policy;
        self
    }
}

impl fmt::Debug for Job {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Job")
            .field("source_id", &self.source_id)
            .field("name", &self.name)
            .field("timeout", &self.timeout)
            .field("retry_policy", &self.retry_policy)
            .field("extractor", &self.extractor.describe())
            .finish()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Success,
    Failure,
    Timeout,
}

impl JobStatus {
    pub fn from_error(error: &JobError) -> Self {
        match error {
            JobError::Timeout { .. } => Self::Timeout,
            JobError::ExecutionFailure(_) | JobError::NotFound(_) => Self::Failure,
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Success => "success",
            Self::Failure => "failure",
            Self::Timeout => "timeout",
        };
        f.pad(s)
    }
}

/// Result of the final attempt of one job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobOutcome {
    pub source_id: String,
    pub name: String,
    pub started_at: DateTime<Utc>,
    pub ended_at: DateTime<Utc>,
    pub status: JobStatus,
    pub attempts: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub artifact_ref: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_detail: Option<String>,
}

impl JobOutcome {
    pub fn success(
        job: &Job,
        started_at: DateTime<Utc>,
        attempts: u32,
        artifact_ref: Option<PathBuf>,
    ) -> Self {
        Self {
            source_id: job.source_id.clone(),
            name: job.name.clone(),
            started_at,
            ended_at: Utc::now(),
            status: JobStatus::Success,
            attempts,
            artifact_ref,
            error_detail: None,
        }
    }

    pub fn failure(job: &Job, started_at: DateTime<Utc>, attempts: u32, error: &JobError) -> Self {
        Self {
            source_id: job.source_id.clone(),
            name: job.name.clone(),
            started_at,
            ended_at: Utc::now(),
            status: JobStatus::from_error(error),
            attempts,
            artifact_ref: None,
            error_detail: Some(error.to_string()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == JobStatus::Success
    }
}
