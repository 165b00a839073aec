pub mod analytics;
pub mod config;
pub mod consolidate;
pub mod error;
pub mod logging;
pub mod refresh;
pub mod storage;
pub mod worker;

pub use analytics::{summarize, AnalysisReport, AnalyticsEngine, LotRecord, Summary};
pub use config::{load_config, AnalyticsConfig, Config, JobConfig};
pub use consolidate::{consolidate, ConsolidationReport, Consolidator, Library, LibraryEntry, Manifest};
pub use error::{
    ComponentError, ConfigError, ConsolidateError, JobError, ManifestError, Result, StorageError,
    TeaReportsError,
};
pub use refresh::{analyze_library, refresh_library, RefreshReport};
pub use storage::ArtifactStore;
pub use worker::{ExecutionSummary, Job, JobOutcome, JobRegistry, JobStatus, Orchestrator};
