//! Test harness for isolated test execution.
//!
//! The `TestHarness` struct lays out the directories a real run uses
//! (source reports, raw downloads, analysis output, run reports) inside a
//! temporary directory and offers shortcuts for consolidating and analyzing them.

#![allow(dead_code)]

use std::path::{Path, PathBuf};

use serde_json::Value;
use tempfile::TempDir;

use teareports::analytics::{AnalysisReport, AnalyticsEngine};
use teareports::config::{AnalyticsConfig, Config};
use teareports::consolidate::{ConsolidationReport, Consolidator, Library, MANIFEST_FILE};
use teareports::error::ConsolidateError;
use teareports::storage::ArtifactStore;

/// Test harness providing an isolated working tree for integration tests.
pub struct TestHarness {
    temp_dir: TempDir,
    pub source_reports_dir: PathBuf,
    pub raw_dir: PathBuf,
    pub analysis_dir: PathBuf,
    pub reports_dir: PathBuf,
    pub library_path: PathBuf,
}

impl TestHarness {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let base = temp_dir.path();

        let source_reports_dir = base.join("source_reports");
        std::fs::create_dir_all(&source_reports_dir).expect("Failed to create source reports dir");

        Self {
            raw_dir: base.join("raw_downloads"),
            analysis_dir: base.join("Data/analysis"),
            reports_dir: base.join("logs"),
            library_path: base.join("market-reports-library.json"),
            source_reports_dir,
            temp_dir,
        }
    }

    pub fn temp_path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// A config whose relative directories all land inside the harness.
    pub fn config(&self) -> Config {
        Config {
            concurrency: 4,
            base_directory: Some(self.temp_path().to_path_buf()),
            ..Config::default()
        }
    }

    /// Writes `manifest.json` plus the given `(file name, JSON text)` components
    /// into `source_reports/<batch>`.
    pub fn write_batch(&self, batch: &str, manifest: &Value, components: &[(&str, &str)]) -> PathBuf {
        let dir = self.source_reports_dir.join(batch);
        std::fs::create_dir_all(&dir).expect("Failed to create batch dir");
        std::fs::write(
            dir.join(MANIFEST_FILE),
            serde_json::to_string_pretty(manifest).expect("Failed to serialize manifest"),
        )
        .expect("Failed to write manifest");
        for (name, content) in components {
            std::fs::write(dir.join(name), content).expect("Failed to write component");
        }
        dir
    }

    /// Writes a raw file into a batch directory, e.g. a broken manifest.
    pub fn write_batch_file(&self, batch: &str, name: &str, content: &str) -> PathBuf {
        let dir = self.source_reports_dir.join(batch);
        std::fs::create_dir_all(&dir).expect("Failed to create batch dir");
        let path = dir.join(name);
        std::fs::write(&path, content).expect("Failed to write batch file");
        path
    }

    pub fn consolidator(&self) -> Consolidator {
        Consolidator::new(&self.source_reports_dir, &self.library_path)
    }

    pub fn consolidate(&self) -> Result<(Library, ConsolidationReport), ConsolidateError> {
        self.consolidator().run()
    }

    pub fn analyze(&self, library: &Library) -> AnalysisReport {
        AnalyticsEngine::new(&self.analysis_dir, AnalyticsConfig::default())
            .run(library)
            .expect("Analysis failed")
    }

    pub fn load_library(&self) -> Library {
        Library::load(&ArtifactStore::working_directory(), &self.library_path)
            .expect("Failed to load library")
    }

    pub fn library_bytes(&self) -> Vec<u8> {
        std::fs::read(&self.library_path).expect("Failed to read library")
    }

    pub fn read_json(&self, path: impl AsRef<Path>) -> Value {
        let path = self.temp_path().join(path);
        let content = std::fs::read_to_string(&path)
            .unwrap_or_else(|e| panic!("Failed to read {}: {}", path.display(), e));
        serde_json::from_str(&content).expect("Invalid JSON")
    }
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}
