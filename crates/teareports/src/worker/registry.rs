use std::sync::Arc;
use std::time::Duration;

use log::{info, warn};

use crate::config::{Config, JobConfig};
use crate::error::ConfigError;
use crate::worker::extractor::CommandExtractor;
use crate::worker::job::{Job, RetryPolicy};

/// Explicit, ordered list of extraction jobs. Nothing is discovered at runtime.
#[derive(Debug, Default, Clone)]
pub struct JobRegistry {
    jobs: Vec<Job>,
    disabled: Vec<String>,
}

impl JobRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds the registry from the `jobs` table of a config. Disabled jobs are
    /// remembered by id but never run.
    pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
        let mut registry = Self::new();

        for job_config in &config.jobs {
            if !job_config.enabled {
                info!("Job '{}' is disabled, not registering", job_config.source_id);
                registry.disabled.push(job_config.source_id.clone());
                continue;
            }
            registry.register(command_job(config, job_config)?)?;
        }

        info!("Registered {} extraction jobs", registry.jobs.len());
        Ok(registry)
    }

    pub fn register(&mut self, job: Job) -> Result<(), ConfigError> {
        if self.get(&job.source_id).is_some() {
            return Err(ConfigError::InvalidJob {
                source_id: job.source_id,
                reason: "Duplicate source_id".to_string(),
            });
        }
        self.jobs.push(job);
        Ok(())
    }

    pub fn get(&self, source_id: &str) -> Option<&Job> {
        self.jobs.iter().find(|j| j.source_id == source_id)
    }

    pub fn jobs(&self) -> &[Job] {
        &self.jobs
    }

    pub fn disabled(&self) -> &[String] {
        &self.disabled
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    /// Restricts the registry to the given source ids, keeping registry order.
    /// Unknown ids are logged and ignored.
    pub fn select(&self, source_ids: &[String]) -> Self {
        for id in source_ids {
            if self.get(id).is_none() {
                warn!("Requested job '{}' is not registered", id);
            }
        }
        Self {
            jobs: self
                .jobs
                .iter()
                .filter(|j| source_ids.iter().any(|id| id == &j.source_id))
                .cloned()
                .collect(),
            disabled: self.disabled.clone(),
        }
    }
}

fn command_job(config: &Config, job_config: &JobConfig) -> Result<Job, ConfigError> {
    let (program, args) =
        job_config
            .command
            .split_first()
            .ok_or_else(|| ConfigError::InvalidJob {
                source_id: job_config.source_id.clone(),
                reason: "command must name a program".to_string(),
            })?;

    let mut extractor =
        CommandExtractor::new(program.clone(), args.to_vec()).env(job_config.env.clone());

    let working_directory = match &job_config.working_directory {
        Some(dir) => config.base_path().join(dir),
        None => config.base_path().to_path_buf(),
    };
    extractor = extractor.working_directory(working_directory);

    if let Some(dir) = &job_config.output_directory {
        extractor = extractor.output_directory(config.source_reports_path().join(dir));
    }

    let job = Job::new(
        job_config.source_id.clone(),
        Arc::new(extractor),
        Duration::from_secs(job_config.timeout_secs),
    )
    .with_name(
        job_config
            .name
            .clone()
            .unwrap_or_else(|| job_config.source_id.clone()),
    )
    .with_retry(RetryPolicy::from(&job_config.retry));

    Ok(job)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{load_config_from_str, ConfigFormat};
    use std::path::PathBuf;

    fn config() -> Config {
        let mut config = load_config_from_str(
            r#"
            {
                "version": "1.0",
                "jobs": [
                    {
                        "source_id": "jthomas",
                        "name": "J Thomas India",
                        "command": ["python3", "scrape_jthomas.py", "--stealth"],
                        "output_directory": "kolkata",
                        "timeout_secs": 1800,
                        "retry": { "max_attempts": 3, "delay_secs": 30 }
                    },
                    { "source_id": "ceylon", "command": ["python3", "scrape_ceylon.py"], "timeout_secs": 600 },
                    { "source_id": "news", "command": ["python3", "news.py"], "enabled": false }
                ]
            }
            "#,
            ConfigFormat::Json,
        )
        .unwrap();
        config.base_directory = Some(PathBuf::from("/srv/tea"));
        config
    }

    #[test]
    fn test_from_config_registers_enabled_jobs_in_order() {
        let registry = JobRegistry::from_config(&config()).unwrap();

        let ids: Vec<_> = registry.jobs().iter().map(|j| j.source_id.as_str()).collect();
        assert_eq!(ids, vec!["jthomas", "ceylon"]);
        assert_eq!(registry.disabled(), &["news".to_string()]);
    }

    #[test]
    fn test_job_fields_from_config() {
        let registry = JobRegistry::from_config(&config()).unwrap();

        let jthomas = registry.get("jthomas").unwrap();
        assert_eq!(jthomas.name, "J Thomas India");
        assert_eq!(jthomas.timeout, Duration::from_secs(1800));
        assert_eq!(jthomas.retry_policy.max_attempts, 3);
        assert_eq!(jthomas.retry_policy.delay, Duration::from_secs(30));
        assert_eq!(
            jthomas.extractor.describe(),
            "python3 scrape_jthomas.py --stealth"
        );

        let ceylon = registry.get("ceylon").unwrap();
        assert_eq!(ceylon.name, "ceylon");
        assert_eq!(ceylon.retry_policy.max_attempts, 1);
    }

    #[test]
    fn test_register_rejects_duplicates() {
        let mut registry = JobRegistry::from_config(&config()).unwrap();
        let duplicate = registry.get("ceylon").unwrap().clone();

        let result = registry.register(duplicate);
        assert!(matches!(result, Err(ConfigError::InvalidJob { .. })));
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_select_subset() {
        let registry = JobRegistry::from_config(&config()).unwrap();
        let selected = registry.select(&["ceylon".to_string(), "missing".to_string()]);

        assert_eq!(selected.len(), 1);
        assert_eq!(selected.jobs()[0].source_id, "ceylon");
    }

    #[test]
    fn test_empty_registry() {
        let registry = JobRegistry::new();
        assert!(registry.is_empty());
        assert!(registry.get("anything").is_none());
    }
}
