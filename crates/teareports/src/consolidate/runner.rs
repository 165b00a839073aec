use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, info_span, warn};

use crate::error::{ConsolidateError, ManifestError};
use crate::storage::ArtifactStore;

use super::component::{component_key, load_component};
use super::library::{Library, LibraryEntry};
use super::manifest::{Manifest, MANIFEST_FILE};

/// A batch directory that produced no library entry.
#[derive(Debug, Clone, Serialize)]
pub struct SkippedBatch {
    pub batch: PathBuf,
    pub reason: String,
}

/// A component file that was left out of its batch's entry.
#[derive(Debug, Clone, Serialize)]
pub struct ComponentWarning {
    pub file: PathBuf,
    pub reason: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ConsolidationReport {
    /// Subdirectories of the artifact root that were examined.
    pub batches_scanned: usize,
    /// Subdirectories without a manifest.
    pub batches_without_manifest: usize,
    /// Entries written into the library, new or replaced.
    pub entries_written: usize,
    /// Of `entries_written`, how many replaced an existing entry.
    pub entries_replaced: usize,
    pub skipped_batches: Vec<SkippedBatch>,
    pub component_warnings: Vec<ComponentWarning>,
}

impl ConsolidationReport {
    pub fn summary_line(&self) -> String {
        format!(
            "{} batches scanned, {} entries written ({} replaced), {} batches skipped, {} component warnings",
            self.batches_scanned,
            self.entries_written,
            self.entries_replaced,
            self.skipped_batches.len(),
            self.component_warnings.len()
        )
    }
}

/// One fully-read batch, ready to be written into the library.
struct BatchEntry {
    location: String,
    title: String,
    entry: LibraryEntry,
}

/// Merges every batch under `artifact_root` into `library`.
///
/// Batch-level and component-level problems are recorded in the report and
/// never stop the run. Only an unreadable artifact root is an error.
pub fn consolidate(
    store: &ArtifactStore,
    artifact_root: &Path,
    library: &mut Library,
) -> Result<ConsolidationReport, ConsolidateError> {
    let mut report = ConsolidationReport::default();

    let batches = store
        .list_subdirectories(artifact_root)
        .map_err(ConsolidateError::ScanArtifacts)?;

    for batch in batches {
        report.batches_scanned += 1;

        let manifest_path = batch.join(MANIFEST_FILE);
        if !manifest_path.is_file() {
            debug!("No manifest in {}, ignoring", batch.display());
            report.batches_without_manifest += 1;
            continue;
        }

        match read_batch(store, &batch, &manifest_path, &mut report.component_warnings) {
            Ok(BatchEntry {
                location,
                title,
                entry,
            }) => {
                info!(
                    batch = %batch.display(),
                    components = entry.data.len(),
                    "Merging '{}' into {}",
                    title,
                    location
                );
                if library.insert(location, title, entry).is_some() {
                    report.entries_replaced += 1;
                }
                report.entries_written += 1;
            }
            Err(e) => {
                warn!(batch = %batch.display(), "Skipping batch: {}", e);
                report.skipped_batches.push(SkippedBatch {
                    batch,
                    reason: e.to_string(),
                });
            }
        }
    }

    if report.batches_scanned == report.batches_without_manifest {
        info!("No manifests found under {}", artifact_root.display());
    }

    Ok(report)
}

fn read_batch(
    store: &ArtifactStore,
    batch: &Path,
    manifest_path: &Path,
    warnings: &mut Vec<ComponentWarning>,
) -> Result<BatchEntry, ManifestError> {
    let manifest = Manifest::from_path(manifest_path)?;

    let mut data: BTreeMap<String, Value> = BTreeMap::new();
    let mut sources: BTreeMap<String, PathBuf> = BTreeMap::new();

    for file in store.list_json_files(batch) {
        let is_manifest = file
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n.eq_ignore_ascii_case(MANIFEST_FILE));
        if is_manifest {
            continue;
        }

        let content = match load_component(&file) {
            Ok(content) => content,
            Err(e) => {
                warn!("Skipping component: {}", e);
                warnings.push(ComponentWarning {
                    file: file.clone(),
                    reason: e.to_string(),
                });
                continue;
            }
        };

        let key = component_key(&file);
        if let Some(previous) = sources.insert(key.clone(), file.clone()) {
            let reason = format!(
                "component key '{}' also produced by {}, keeping {}",
                key,
                previous.display(),
                file.display()
            );
            warn!("{}", reason);
            warnings.push(ComponentWarning {
                file: previous,
                reason,
            });
        }
        data.insert(key, content);
    }

    Ok(BatchEntry {
        location: manifest.location.clone(),
        title: manifest.title(),
        entry: LibraryEntry {
            description: manifest.description(),
            data,
        },
    })
}

/// Load, merge and persist cycle over one artifact root and one library file.
pub struct Consolidator {
    store: ArtifactStore,
    artifact_root: PathBuf,
    library_path: PathBuf,
}

impl Consolidator {
    pub fn new(artifact_root: impl Into<PathBuf>, library_path: impl Into<PathBuf>) -> Self {
        Self {
            store: ArtifactStore::working_directory(),
            artifact_root: artifact_root.into(),
            library_path: library_path.into(),
        }
    }

    pub fn library_path(&self) -> &Path {
        &self.library_path
    }

    /// Loads the library, merges all batches and writes it back once.
    ///
    /// A library that cannot be loaded aborts the run before anything is written.
    pub fn run(&self) -> Result<(Library, ConsolidationReport), ConsolidateError> {
        let _span = info_span!("consolidate", root = %self.artifact_root.display()).entered();

        let mut library = Library::load(&self.store, &self.library_path)?;
        let report = consolidate(&self.store, &self.artifact_root, &mut library)?;

        if report.entries_written > 0 {
            let path = library.save(&self.store, &self.library_path)?;
            info!("Saved library to {}", path.display());
        } else {
            info!("Nothing to merge, library left untouched");
        }

        info!("Consolidation complete: {}", report.summary_line());
        Ok((library, report))
    }
}
