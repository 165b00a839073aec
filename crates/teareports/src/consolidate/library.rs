//! The consolidated report library: `location -> title -> entry`.
//!
//! The library is always loaded and written whole. Ordered maps keep the
//! serialized form stable, so an unchanged library is rewritten byte for byte.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, warn};

use crate::error::ConsolidateError;
use crate::storage::ArtifactStore;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LibraryEntry {
    pub description: String,
    pub data: BTreeMap<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Library {
    locations: BTreeMap<String, BTreeMap<String, LibraryEntry>>,
}

impl Library {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads the library at `path`.
    ///
    /// A missing or empty file yields an empty library. Anything that does not
    /// parse as a library is an error; the caller must not overwrite it.
    pub fn load(store: &ArtifactStore, path: &Path) -> Result<Self, ConsolidateError> {
        let content = store
            .read_string_if_exists(path)
            .map_err(|e| ConsolidateError::LibraryLoad {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?;

        let Some(content) = content else {
            info!("Library {} not found, starting empty", path.display());
            return Ok(Self::new());
        };

        if content.trim().is_empty() {
            warn!("Library {} is empty, starting empty", path.display());
            return Ok(Self::new());
        }

        let library: Self =
            serde_json::from_str(&content).map_err(|e| ConsolidateError::LibraryLoad {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?;

        info!(
            "Loaded library {} ({} entries across {} locations)",
            path.display(),
            library.len(),
            library.locations.len()
        );
        Ok(library)
    }

    pub fn save(&self, store: &ArtifactStore, path: &Path) -> Result<PathBuf, ConsolidateError> {
        store
            .write_json(path, self)
            .map_err(ConsolidateError::LibrarySave)
    }

    /// Replaces the entry for `(location, title)` in full, returning the previous one.
    pub fn insert(
        &mut self,
        location: impl Into<String>,
        title: impl Into<String>,
        entry: LibraryEntry,
    ) -> Option<LibraryEntry> {
        self.locations
            .entry(location.into())
            .or_default()
            .insert(title.into(), entry)
    }

    pub fn get(&self, location: &str, title: &str) -> Option<&LibraryEntry> {
        self.locations.get(location)?.get(title)
    }

    /// Removes one entry; drops the location once it has no entries left.
    pub fn remove(&mut self, location: &str, title: &str) -> Option<LibraryEntry> {
        let reports = self.locations.get_mut(location)?;
        let removed = reports.remove(title);
        if reports.is_empty() {
            self.locations.remove(location);
        }
        removed
    }

    pub fn locations(&self) -> impl Iterator<Item = &str> {
        self.locations.keys().map(String::as_str)
    }

    /// All entries as `(location, title, entry)`, in key order.
    pub fn entries(&self) -> impl Iterator<Item = (&str, &str, &LibraryEntry)> {
        self.locations.iter().flat_map(|(location, reports)| {
            reports
                .iter()
                .map(move |(title, entry)| (location.as_str(), title.as_str(), entry))
        })
    }

    pub fn len(&self) -> usize {
        self.locations.values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
