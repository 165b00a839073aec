use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{info, info_span};

use crate::config::AnalyticsConfig;
use crate::consolidate::Library;
use crate::error::StorageError;
use crate::storage::ArtifactStore;

use super::records::{extract_lot_records, LotRecord};
use super::stats::{summarize, SummaryStats};

/// Statistics written for one library entry: a location's report type for one sale and year.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisGroup {
    pub location: String,
    pub report_type: String,
    pub sale_number: String,
    pub year: i64,
    pub records: usize,
    pub overall: SummaryStats,
    pub summary_file: PathBuf,
    pub grade_file: PathBuf,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct AnalysisReport {
    pub records_seen: usize,
    pub groups: Vec<AnalysisGroup>,
}

type GroupKey<'a> = (&'a str, &'a str, i64, &'a str);

/// Computes lot statistics from the library and writes them under the analysis directory.
pub struct AnalyticsEngine {
    store: ArtifactStore,
    config: AnalyticsConfig,
}

impl AnalyticsEngine {
    pub fn new(analysis_directory: impl AsRef<Path>, config: AnalyticsConfig) -> Self {
        Self {
            store: ArtifactStore::new(analysis_directory),
            config,
        }
    }

    pub fn output_directory(&self) -> &Path {
        self.store.root()
    }

    pub fn run(&self, library: &Library) -> Result<AnalysisReport, StorageError> {
        let _span = info_span!("analyze", output = %self.store.root().display()).entered();

        let records = extract_lot_records(library, &self.config);
        let mut report = AnalysisReport {
            records_seen: records.len(),
            groups: Vec::new(),
        };

        let mut groups: BTreeMap<GroupKey<'_>, Vec<LotRecord>> = BTreeMap::new();
        for record in &records {
            groups
                .entry((
                    record.location.as_str(),
                    record.report_type.as_str(),
                    record.year,
                    record.sale_number.as_str(),
                ))
                .or_default()
                .push(record.clone());
        }

        for (key, group) in groups {
            report.groups.push(self.write_group(key, &group)?);
        }

        info!(
            "Analysis complete: {} lot records in {} sales",
            report.records_seen,
            report.groups.len()
        );
        Ok(report)
    }

    fn write_group(
        &self,
        (location, report_type, year, sale_number): GroupKey<'_>,
        records: &[LotRecord],
    ) -> Result<AnalysisGroup, StorageError> {
        let summary = summarize(records);
        let dir = group_dir(location, report_type, year);
        let sale = path_component(sale_number);

        let summary_file = self.store.write_json(
            dir.join(format!("summary_statistics_S{}.json", sale)),
            &summary.overall.to_metrics(),
        )?;
        let grade_file = self.store.write_json(
            dir.join(format!("grade_category_statistics_S{}.json", sale)),
            &summary.by_grade,
        )?;

        info!(
            location,
            report_type,
            year,
            sale = sale_number,
            lots_sold = summary.overall.total_lots_sold,
            "Auction average {:.2} over {} packages",
            summary.overall.weighted_average_price,
            summary.overall.total_packages_sold
        );

        Ok(AnalysisGroup {
            location: location.to_string(),
            report_type: report_type.to_string(),
            sale_number: sale_number.to_string(),
            year,
            records: records.len(),
            overall: summary.overall,
            summary_file,
            grade_file,
        })
    }
}

/// `<location>/<report_type>/<year>`, relative to the analysis directory.
fn group_dir(location: &str, report_type: &str, year: i64) -> PathBuf {
    [
        path_component(location),
        path_component(report_type),
        year.to_string(),
    ]
    .iter()
    .collect()
}

/// Turns a manifest-supplied name into a single path component.
///
/// Separators become `_`, and names that would navigate (`""`, `.`, `..`) become `_`.
fn path_component(name: &str) -> String {
    let cleaned: String = name
        .trim()
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();

    match cleaned.as_str() {
        "" | "." | ".." => "_".to_string(),
        _ => cleaned,
    }
}
