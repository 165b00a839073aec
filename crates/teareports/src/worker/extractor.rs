//! Producers of raw artifacts.
//!
//! Site-specific extraction (browser automation, PDF text, OCR) lives outside
//! this crate. The orchestrator only sees an [`Extractor`] that either yields a
//! [`RawArtifact`] or fails with a [`JobError`].

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::Command;
use uuid::Uuid;

use crate::error::JobError;

/// How many trailing bytes of stderr are kept in a failure message.
const STDERR_TAIL_BYTES: usize = 2048;

/// Per-attempt information handed to an extractor.
#[derive(Debug, Clone)]
pub struct ExtractContext {
    pub source_id: String,
    pub attempt: u32,
    pub run_id: Uuid,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RawArtifact {
    /// Structured output; the orchestrator persists it as JSON.
    Json(serde_json::Value),
    /// Opaque output; the orchestrator persists it verbatim.
    Bytes(Vec<u8>),
    /// The producer already wrote its files into this directory.
    Directory(PathBuf),
}

#[async_trait]
pub trait Extractor: Send + Sync {
    async fn extract(&self, ctx: &ExtractContext) -> Result<RawArtifact, JobError>;

    /// Short human-readable description used in logs and `jobs` listings.
    fn describe(&self) -> String;
}

/// Runs an external program as the extraction step.
///
/// Exit status 0 is success. The child is killed if the attempt is cancelled.
#[derive(Debug, Clone)]
pub struct CommandExtractor {
    program: String,
    args: Vec<String>,
    working_directory: Option<PathBuf>,
    output_directory: Option<PathBuf>,
    env: BTreeMap<String, String>,
}

impl CommandExtractor {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
            working_directory: None,
            output_directory: None,
            env: BTreeMap::new(),
        }
    }

    pub fn working_directory(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_directory = Some(dir.into());
        self
    }

    /// Directory the program is expected to populate. When set, it becomes the
    /// artifact; otherwise captured stdout is the artifact.
    pub fn output_directory(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_directory = Some(dir.into());
        self
    }

    pub fn env(mut self, env: BTreeMap<String, String>) -> Self {
        self.env = env;
        self
    }
}

#[async_trait]
impl Extractor for CommandExtractor {
    async fn extract(&self, ctx: &ExtractContext) -> Result<RawArtifact, JobError> {
        let mut command = Command::new(&self.program);
        command
            .args(&self.args)
            .envs(&self.env)
            .env("TEAREPORTS_SOURCE_ID", &ctx.source_id)
            .env("TEAREPORTS_ATTEMPT", ctx.attempt.to_string())
            .env("TEAREPORTS_RUN_ID", ctx.run_id.to_string())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        if let Some(dir) = &self.working_directory {
            command.current_dir(dir);
        }

        let output = command.output().await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                JobError::NotFound(format!("{}: {}", self.program, e))
            } else {
                JobError::ExecutionFailure(format!("failed to start '{}': {}", self.program, e))
            }
        })?;

        if !output.status.success() {
            return Err(JobError::ExecutionFailure(format!(
                "'{}' exited with {}: {}",
                self.program,
                output.status,
                stderr_tail(&output.stderr)
            )));
        }

        match &self.output_directory {
            Some(dir) if dir.is_dir() => Ok(RawArtifact::Directory(dir.clone())),
            Some(dir) => Err(JobError::ExecutionFailure(format!(
                "'{}' succeeded but produced no output at {}",
                self.program,
                dir.display()
            ))),
            None => Ok(RawArtifact::Bytes(output.stdout)),
        }
    }

    fn describe(&self) -> String {
        if self.args.is_empty() {
            self.program.clone()
        } else {
            format!("{} {}", self.program, self.args.join(" "))
        }
    }
}

fn stderr_tail(stderr: &[u8]) -> String {
    let start = stderr.len().saturating_sub(STDERR_TAIL_BYTES);
    String::from_utf8_lossy(&stderr[start..]).trim().to_string()
}
