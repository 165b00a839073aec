//! Weighted auction statistics over the lot-level records in the library.

pub mod engine;
pub mod records;
pub mod stats;

pub use engine::{AnalysisGroup, AnalysisReport, AnalyticsEngine};
pub use records::{coerce_number, extract_lot_records, LotRecord};
pub use stats::{summarize, GradeStats, MetricRow, Summary, SummaryStats};
