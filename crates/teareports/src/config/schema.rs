use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub version: String,
    #[serde(default = "default_source_reports_directory")]
    pub source_reports_directory: String,
    #[serde(default = "default_raw_directory")]
    pub raw_directory: String,
    #[serde(default = "default_library_file")]
    pub library_file: String,
    #[serde(default = "default_analysis_directory")]
    pub analysis_directory: String,
    #[serde(default = "default_reports_directory")]
    pub reports_directory: String,
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
    #[serde(default)]
    pub jobs: Vec<JobConfig>,
    #[serde(default)]
    pub analytics: AnalyticsConfig,
    /// Directory relative paths resolve against. Set by the loader to the
    /// config file's directory.
    #[serde(skip)]
    pub base_directory: Option<PathBuf>,
}

impl Config {
    fn resolve(&self, path: &str) -> PathBuf {
        match &self.base_directory {
            Some(base) => base.join(path),
            None => PathBuf::from(path),
        }
    }

    pub fn source_reports_path(&self) -> PathBuf {
        self.resolve(&self.source_reports_directory)
    }

    pub fn raw_path(&self) -> PathBuf {
        self.resolve(&self.raw_directory)
    }

    pub fn library_path(&self) -> PathBuf {
        self.resolve(&self.library_file)
    }

    pub fn analysis_path(&self) -> PathBuf {
        self.resolve(&self.analysis_directory)
    }

    pub fn reports_path(&self) -> PathBuf {
        self.resolve(&self.reports_directory)
    }

    pub fn base_path(&self) -> &Path {
        self.base_directory.as_deref().unwrap_or_else(|| Path::new("."))
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: "1.0".to_string(),
            source_reports_directory: default_source_reports_directory(),
            raw_directory: default_raw_directory(),
            library_file: default_library_file(),
            analysis_directory: default_analysis_directory(),
            reports_directory: default_reports_directory(),
            concurrency: default_concurrency(),
            jobs: Vec::new(),
            analytics: AnalyticsConfig::default(),
            base_directory: None,
        }
    }
}

fn default_source_reports_directory() -> String {
    "source_reports".to_string()
}

fn default_raw_directory() -> String {
    "raw_downloads".to_string()
}

fn default_library_file() -> String {
    "market-reports-library.json".to_string()
}

fn default_analysis_directory() -> String {
    "Data/analysis".to_string()
}

fn default_reports_directory() -> String {
    "logs".to_string()
}

fn default_concurrency() -> usize {
    num_cpus::get()
}

/// One registered extraction job, backed by an external program.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobConfig {
    pub source_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Program followed by its arguments.
    pub command: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub working_directory: Option<String>,
    /// Batch directory the program writes into, relative to the source reports root.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_directory: Option<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default)]
    pub retry: RetryConfig,
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default)]
    pub env: BTreeMap<String, String>,
}

fn default_timeout_secs() -> u64 {
    1800
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_delay_secs")]
    pub delay_secs: u64,
    #[serde(default)]
    pub backoff: Backoff,
}

fn default_max_attempts() -> u32 {
    1
}

fn default_delay_secs() -> u64 {
    30
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            delay_secs: default_delay_secs(),
            backoff: Backoff::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backoff {
    #[default]
    Fixed,
    Exponential,
}

/// Which library components hold lot-level auction rows, and how their fields are named.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyticsConfig {
    #[serde(default = "default_lot_component_patterns")]
    pub lot_component_patterns: Vec<String>,
    /// Candidate price field names; the first one present on a row is used.
    #[serde(default = "default_price_fields")]
    pub price_fields: Vec<String>,
    #[serde(default = "default_packages_field")]
    pub packages_field: String,
    #[serde(default = "default_grade_field")]
    pub grade_field: String,
    #[serde(default = "default_lot_no_field")]
    pub lot_no_field: String,
}

fn default_lot_component_patterns() -> Vec<String> {
    vec!["auction_lots".to_string()]
}

fn default_price_fields() -> Vec<String> {
    vec!["price".to_string(), "price_inr".to_string()]
}

fn default_packages_field() -> String {
    "packages".to_string()
}

fn default_grade_field() -> String {
    "grade".to_string()
}

fn default_lot_no_field() -> String {
    "lot_no".to_string()
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            lot_component_patterns: default_lot_component_patterns(),
            price_fields: default_price_fields(),
            packages_field: default_packages_field(),
            grade_field: default_grade_field(),
            lot_no_field: default_lot_no_field(),
        }
    }
}
