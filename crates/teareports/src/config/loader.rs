use std::collections::HashSet;
use std::path::Path;

use crate::config::schema::Config;
use crate::error::ConfigError;

const SCHEMA_JSON: &str = include_str!("../../../../schema/config-v1.json");

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Json,
    Yaml,
}

impl ConfigFormat {
    pub fn from_path(path: &Path) -> Self {
        match path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
            .as_deref()
        {
            Some("yaml") | Some("yml") => Self::Yaml,
            _ => Self::Json,
        }
    }
}

/// Loads a config file; relative paths inside it resolve against the file's directory.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadFile {
        path: path.to_path_buf(),
        source: e,
    })?;

    let mut config = load_config_from_str(&content, ConfigFormat::from_path(path))?;
    config.base_directory = Some(
        path.parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map(Path::to_path_buf)
            .unwrap_or_else(|| ".".into()),
    );
    Ok(config)
}

pub fn load_config_from_str(content: &str, format: ConfigFormat) -> Result<Config, ConfigError> {
    let json_value: serde_json::Value = match format {
        ConfigFormat::Json => serde_json::from_str(content)?,
        ConfigFormat::Yaml => serde_yaml::from_str(content)?,
    };

    validate_schema(&json_value)?;

    let config: Config = serde_json::from_value(json_value)?;

    validate_config(&config)?;

    Ok(config)
}

fn validate_schema(json_value: &serde_json::Value) -> Result<(), ConfigError> {
    let schema: serde_json::Value =
        serde_json::from_str(SCHEMA_JSON).map_err(|e| ConfigError::Validation {
            message: format!("Invalid embedded schema JSON: {}", e),
        })?;

    let validator = jsonschema::validator_for(&schema).map_err(|e| ConfigError::Validation {
        message: format!("Failed to compile JSON schema: {}", e),
    })?;

    let error_messages: Vec<String> = validator
        .iter_errors(json_value)
        .map(|e| e.to_string())
        .collect();
    if !error_messages.is_empty() {
        return Err(ConfigError::SchemaValidation {
            errors: error_messages.join("; "),
        });
    }

    Ok(())
}

fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.version != "1.0" {
        return Err(ConfigError::Validation {
            message: format!("Unsupported config version: {}", config.version),
        });
    }

    if config.concurrency == 0 {
        return Err(ConfigError::Validation {
            message: "concurrency must be at least 1".to_string(),
        });
    }

    let mut source_ids = HashSet::new();
    for job in &config.jobs {
        if job.source_id.trim().is_empty() {
            return Err(ConfigError::InvalidJob {
                source_id: job.source_id.clone(),
                reason: "source_id must not be empty".to_string(),
            });
        }

        if !source_ids.insert(job.source_id.as_str()) {
            return Err(ConfigError::InvalidJob {
                source_id: job.source_id.clone(),
                reason: "Duplicate source_id".to_string(),
            });
        }

        if job.command.first().map_or(true, |p| p.trim().is_empty()) {
            return Err(ConfigError::InvalidJob {
                source_id: job.source_id.clone(),
                reason: "command must name a program".to_string(),
            });
        }

        if job.retry.max_attempts == 0 {
            return Err(ConfigError::InvalidJob {
                source_id: job.source_id.clone(),
                reason: "retry.max_attempts must be at least 1".to_string(),
            });
        }

        if job.timeout_secs == 0 {
            return Err(ConfigError::InvalidJob {
                source_id: job.source_id.clone(),
                reason: "timeout_secs must be at least 1".to_string(),
            });
        }
    }

    Ok(())
}
