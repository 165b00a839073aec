//! Builder patterns for creating test data programmatically.

#![allow(dead_code)]

use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Map, Value};

use teareports::config::{Backoff, JobConfig, RetryConfig};
use teareports::error::JobError;
use teareports::worker::{ExtractContext, Extractor, Job, RawArtifact};

/// Builder for batch `manifest.json` contents.
pub struct ManifestBuilder {
    fields: Map<String, Value>,
}

impl ManifestBuilder {
    /// A complete Kolkata manifest for sale 37 of 2025.
    pub fn new() -> Self {
        let fields = json!({
            "location": "Kolkata",
            "report_type": "CTC Leaf",
            "sale_number": 37,
            "year": 2025,
            "week_number": 37,
            "date_range": "09-10 Sep 2025",
            "prompt_date": "17 Sep 2025",
            "currency": "INR"
        });
        match fields {
            Value::Object(fields) => Self { fields },
            _ => unreachable!(),
        }
    }

    pub fn location(self, location: &str) -> Self {
        self.set("location", json!(location))
    }

    pub fn sale_number(self, sale_number: impl Into<Value>) -> Self {
        self.set("sale_number", sale_number.into())
    }

    pub fn year(self, year: i64) -> Self {
        self.set("year", json!(year))
    }

    pub fn currency(self, currency: &str) -> Self {
        self.set("currency", json!(currency))
    }

    pub fn set(mut self, field: &str, value: Value) -> Self {
        self.fields.insert(field.to_string(), value);
        self
    }

    pub fn without(mut self, field: &str) -> Self {
        self.fields.remove(field);
        self
    }

    pub fn build(self) -> Value {
        Value::Object(self.fields)
    }
}

impl Default for ManifestBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// JSON text of a lot component with `(grade, price, packages)` rows.
pub fn lots_json(rows: &[(&str, Value, Value)]) -> String {
    let rows: Vec<Value> = rows
        .iter()
        .enumerate()
        .map(|(i, (grade, price, packages))| {
            json!({
                "lot_no": (i + 1).to_string(),
                "grade": grade,
                "price": price,
                "packages": packages
            })
        })
        .collect();
    serde_json::to_string(&rows).expect("Failed to serialize lots")
}

/// Builder for `JobConfig` entries.
pub struct JobConfigBuilder {
    config: JobConfig,
}

impl JobConfigBuilder {
    pub fn new(source_id: &str, command: &[&str]) -> Self {
        Self {
            config: JobConfig {
                source_id: source_id.to_string(),
                name: None,
                command: command.iter().map(|s| s.to_string()).collect(),
                working_directory: None,
                output_directory: None,
                timeout_secs: 30,
                retry: RetryConfig::default(),
                enabled: true,
                env: Default::default(),
            },
        }
    }

    pub fn output_directory(mut self, dir: &str) -> Self {
        self.config.output_directory = Some(dir.to_string());
        self
    }

    pub fn timeout_secs(mut self, secs: u64) -> Self {
        self.config.timeout_secs = secs;
        self
    }

    pub fn retry(mut self, max_attempts: u32, delay_secs: u64, backoff: Backoff) -> Self {
        self.config.retry = RetryConfig {
            max_attempts,
            delay_secs,
            backoff,
        };
        self
    }

    pub fn disabled(mut self) -> Self {
        self.config.enabled = false;
        self
    }

    pub fn build(self) -> JobConfig {
        self.config
    }
}

/// How a [`ScriptedExtractor`] behaves on each call.
#[derive(Clone)]
pub enum Script {
    Succeed(Value),
    Fail(String),
    Hang,
    /// Fails until the given attempt number, then succeeds.
    FailUntil(u32),
}

/// In-memory extractor for orchestrator tests.
pub struct ScriptedExtractor {
    script: Script,
    delay: Duration,
    pub calls: AtomicU32,
    running: Arc<AtomicUsize>,
    peak: Arc<AtomicUsize>,
}

impl ScriptedExtractor {
    pub fn new(script: Script) -> Self {
        Self {
            script,
            delay: Duration::ZERO,
            calls: AtomicU32::new(0),
            running: Arc::new(AtomicUsize::new(0)),
            peak: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Shares concurrency counters across several extractors.
    pub fn with_counters(mut self, running: Arc<AtomicUsize>, peak: Arc<AtomicUsize>) -> Self {
        self.running = running;
        self.peak = peak;
        self
    }

    pub fn into_job(self, source_id: &str, timeout: Duration) -> Job {
        Job::new(source_id, Arc::new(self), timeout)
    }
}

#[async_trait]
impl Extractor for ScriptedExtractor {
    async fn extract(&self, ctx: &ExtractContext) -> Result<RawArtifact, JobError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let now = self.running.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        let result = match &self.script {
            Script::Succeed(value) => Ok(RawArtifact::Json(value.clone())),
            Script::Fail(reason) => Err(JobError::ExecutionFailure(reason.clone())),
            Script::Hang => {
                std::future::pending::<()>().await;
                unreachable!()
            }
            Script::FailUntil(attempt) if ctx.attempt < *attempt => Err(
                JobError::ExecutionFailure(format!("attempt {} failed", ctx.attempt)),
            ),
            Script::FailUntil(_) => Ok(RawArtifact::Json(json!({"attempt": ctx.attempt}))),
        };

        self.running.fetch_sub(1, Ordering::SeqCst);
        result
    }

    fn describe(&self) -> String {
        "scripted".to_string()
    }
}
