pub mod extractor;
pub mod job;
pub mod pool;
pub mod registry;

pub use extractor::{CommandExtractor, ExtractContext, Extractor, RawArtifact};
pub use job::{Job, JobOutcome, JobStatus, RetryPolicy};
pub use pool::{ExecutionSummary, Orchestrator};
pub use registry::JobRegistry;
