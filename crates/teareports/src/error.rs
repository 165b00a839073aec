use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum TeaReportsError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Job error: {0}")]
    Job(#[from] JobError),

    #[error("Consolidation error: {0}")]
    Consolidate(#[from] ConsolidateError),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config JSON: {0}")]
    ParseJson(#[from] serde_json::Error),

    #[error("Failed to parse config YAML: {0}")]
    ParseYaml(#[from] serde_yaml::Error),

    #[error("Config validation failed: {message}")]
    Validation { message: String },

    #[error("Schema validation failed: {errors}")]
    SchemaValidation { errors: String },

    #[error("Invalid job '{source_id}': {reason}")]
    InvalidJob { source_id: String, reason: String },
}

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Failed to create directory '{path}': {source}")]
    CreateDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write file '{path}': {source}")]
    WriteFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to read file '{path}': {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to serialize '{path}': {source}")]
    Serialize {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to list directory '{path}': {source}")]
    ListDirectory {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },
}

/// Errors that end a single job attempt. None of these escape the orchestrator.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum JobError {
    #[error("Timed out after {}s", after.as_secs_f64())]
    Timeout { after: Duration },

    #[error("Execution failed: {0}")]
    ExecutionFailure(String),

    #[error("Job target not found: {0}")]
    NotFound(String),
}

#[derive(Error, Debug)]
pub enum ManifestError {
    #[error("Failed to read manifest '{path}': {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed manifest JSON '{path}': {source}")]
    Malformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Manifest is missing required field '{field}'")]
    MissingRequiredField { field: &'static str },

    #[error("Manifest field '{field}' is invalid: {reason}")]
    InvalidField { field: &'static str, reason: String },
}

#[derive(Error, Debug)]
pub enum ComponentError {
    #[error("Failed to read component '{path}': {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed component JSON '{path}': {source}")]
    Malformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Errors that halt a whole consolidation run without touching the persisted library.
#[derive(Error, Debug)]
pub enum ConsolidateError {
    #[error("Failed to load library '{path}': {reason}")]
    LibraryLoad { path: PathBuf, reason: String },

    #[error("Failed to save library: {0}")]
    LibrarySave(#[source] StorageError),

    #[error("Failed to scan artifact root: {0}")]
    ScanArtifacts(#[source] StorageError),
}

pub type Result<T> = std::result::Result<T, TeaReportsError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_job_error_display() {
        let err = JobError::Timeout {
            after: Duration::from_millis(1500),
        };
        assert_eq!(err.to_string(), "Timed out after 1.5s");

        let err = JobError::NotFound("scrape_ceylon".to_string());
        assert!(err.to_string().contains("scrape_ceylon"));
    }

    #[test]
    fn test_manifest_error_names_field() {
        let err = ManifestError::MissingRequiredField { field: "currency" };
        assert_eq!(
            err.to_string(),
            "Manifest is missing required field 'currency'"
        );
    }

    #[test]
    fn test_umbrella_conversion() {
        let err: TeaReportsError = JobError::ExecutionFailure("exit code 3".to_string()).into();
        assert!(matches!(err, TeaReportsError::Job(_)));
    }

    #[test]
    fn test_question_mark_lifts_into_umbrella() {
        fn write_library() -> std::result::Result<(), ConsolidateError> {
            Err(ConsolidateError::LibrarySave(StorageError::WriteFile {
                path: PathBuf::from("library.json"),
                source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only"),
            }))
        }

        fn save() -> Result<()> {
            write_library()?;
            Ok(())
        }

        let err = save().unwrap_err();
        assert!(matches!(
            err,
            TeaReportsError::Consolidate(ConsolidateError::LibrarySave(_))
        ));
        assert!(err.to_string().contains("Failed to save library"));
    }
}
