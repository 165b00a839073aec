//! The post-extraction half of a run: consolidate the source report batches
//! into the library, then recompute statistics from the saved library.

use std::path::Path;

use serde::Serialize;

use crate::analytics::{AnalysisReport, AnalyticsEngine};
use crate::config::Config;
use crate::consolidate::{ConsolidationReport, Consolidator, Library};
use crate::error::Result;
use crate::storage::ArtifactStore;

#[derive(Debug, Clone, Serialize)]
pub struct RefreshReport {
    pub consolidation: ConsolidationReport,
    pub analysis: AnalysisReport,
}

/// Consolidates `config`'s source reports, then analyzes the resulting library.
///
/// Analysis does not run when consolidation halts.
pub fn refresh_library(config: &Config) -> Result<RefreshReport> {
    let (library, consolidation) =
        Consolidator::new(config.source_reports_path(), config.library_path()).run()?;

    let analysis =
        AnalyticsEngine::new(config.analysis_path(), config.analytics.clone()).run(&library)?;

    Ok(RefreshReport {
        consolidation,
        analysis,
    })
}

/// Loads the library at `library_path` and writes statistics under `output`.
pub fn analyze_library(
    config: &Config,
    library_path: &Path,
    output: &Path,
) -> Result<AnalysisReport> {
    let library = Library::load(&ArtifactStore::working_directory(), library_path)?;
    Ok(AnalyticsEngine::new(output, config.analytics.clone()).run(&library)?)
}
