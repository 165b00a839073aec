use std::io::Write;
use std::path::{Path, PathBuf};

use log::{debug, warn};
use serde::Serialize;
use walkdir::WalkDir;

use crate::error::StorageError;

/// Filesystem-backed store for raw artifacts, manifests, the library and
/// analysis outputs. Relative paths resolve against `root`.
///
/// Every write goes to a sibling temp file that is flushed and then renamed
/// over the destination, so readers see either the old or the new file.
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    root: PathBuf,
}

impl ArtifactStore {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    /// A store whose relative paths resolve against the process working directory.
    pub fn working_directory() -> Self {
        Self {
            root: PathBuf::new(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolves `path` against the store root. Absolute paths are kept as-is.
    pub fn resolve<P: AsRef<Path>>(&self, path: P) -> PathBuf {
        self.root.join(path)
    }

    /// Serializes `value` as pretty JSON with a trailing newline and writes it atomically.
    pub fn write_json<P, T>(&self, path: P, value: &T) -> Result<PathBuf, StorageError>
    where
        P: AsRef<Path>,
        T: Serialize + ?Sized,
    {
        let target = self.resolve(path);
        let mut content =
            serde_json::to_vec_pretty(value).map_err(|e| StorageError::Serialize {
                path: target.clone(),
                source: e,
            })?;
        content.push(b'\n');
        write_atomic(&target, &content)?;
        Ok(target)
    }

    pub fn write_bytes<P: AsRef<Path>>(
        &self,
        path: P,
        content: &[u8],
    ) -> Result<PathBuf, StorageError> {
        let target = self.resolve(path);
        write_atomic(&target, content)?;
        Ok(target)
    }

    /// Reads a file as UTF-8 text. Returns `Ok(None)` when it does not exist.
    pub fn read_string_if_exists<P: AsRef<Path>>(
        &self,
        path: P,
    ) -> Result<Option<String>, StorageError> {
        let target = self.resolve(path);
        match std::fs::read_to_string(&target) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StorageError::ReadFile {
                path: target,
                source: e,
            }),
        }
    }

    /// Immediate, non-hidden subdirectories of `dir`, sorted by name.
    /// A missing `dir` yields an empty list.
    pub fn list_subdirectories<P: AsRef<Path>>(&self, dir: P) -> Result<Vec<PathBuf>, StorageError> {
        let dir = self.resolve(dir);
        if !dir.exists() {
            debug!("Directory {} does not exist", dir.display());
            return Ok(Vec::new());
        }

        let mut batches = Vec::new();
        for entry in WalkDir::new(&dir)
            .min_depth(1)
            .max_depth(1)
            .sort_by_file_name()
        {
            let entry = entry.map_err(|e| StorageError::ListDirectory {
                path: dir.clone(),
                source: e,
            })?;

            if is_hidden(entry.path()) || !entry.file_type().is_dir() {
                continue;
            }
            batches.push(entry.into_path());
        }

        Ok(batches)
    }

    /// Non-hidden `*.json` files directly inside `dir`, sorted by name.
    ///
    /// The extension is matched case-insensitively, so `lots_S37.JSON` is listed too.
    pub fn list_json_files<P: AsRef<Path>>(&self, dir: P) -> Vec<PathBuf> {
        let dir = self.resolve(dir);
        let pattern = format!(
            "{}/*.json",
            glob::Pattern::escape(&dir.to_string_lossy())
        );

        let options = glob::MatchOptions {
            case_sensitive: false,
            ..Default::default()
        };
        let paths = match glob::glob_with(&pattern, options) {
            Ok(paths) => paths,
            Err(e) => {
                warn!("Invalid glob pattern for {}: {}", dir.display(), e);
                return Vec::new();
            }
        };

        let mut files: Vec<PathBuf> = paths
            .filter_map(|entry| match entry {
                Ok(path) => Some(path),
                Err(e) => {
                    warn!("Unreadable entry in {}: {}", dir.display(), e);
                    None
                }
            })
            .filter(|path| path.is_file() && !is_hidden(path))
            .collect();
        files.sort();
        files
    }
}

fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .map(|n| n.starts_with('.'))
        .unwrap_or(false)
}

/// Writes `content` to a temp file next to `target`, syncs it, then renames it into place.
fn write_atomic(target: &Path, content: &[u8]) -> Result<(), StorageError> {
    let dir = target.parent().unwrap_or_else(|| Path::new("."));
    if !dir.as_os_str().is_empty() && !dir.exists() {
        std::fs::create_dir_all(dir).map_err(|e| StorageError::CreateDirectory {
            path: dir.to_path_buf(),
            source: e,
        })?;
    }

    let file_name = target
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("artifact");
    let temp_path = dir.join(format!(".{}.{}.tmp", file_name, uuid::Uuid::new_v4()));

    let write_result = (|| {
        let mut file = std::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&temp_path)?;
        file.write_all(content)?;
        file.sync_all()?;
        std::fs::rename(&temp_path, target)
    })();

    if let Err(e) = write_result {
        let _ = std::fs::remove_file(&temp_path);
        return Err(StorageError::WriteFile {
            path: target.to_path_buf(),
            source: e,
        });
    }

    debug!("Wrote {} ({} bytes)", target.display(), content.len());
    Ok(())
}
