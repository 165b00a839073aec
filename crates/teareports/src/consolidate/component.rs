use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;

use crate::error::ComponentError;

/// Trailing sale/week tag appended by scrapers, e.g. `_S37` or `_w12`.
static RE_RUN_SUFFIX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)_[SW]\d+$").unwrap());

/// Stable key for a component file: its stem without the sale/week suffix.
///
/// `price_table_S37.json` and `price_table_S38.json` both map to `price_table`.
pub fn component_key(path: &Path) -> String {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy())
        .unwrap_or_default();
    normalize_component_name(&stem)
}

pub fn normalize_component_name(stem: &str) -> String {
    RE_RUN_SUFFIX.replace(stem, "").into_owned()
}

pub fn load_component(path: &Path) -> Result<Value, ComponentError> {
    let content = std::fs::read_to_string(path).map_err(|e| ComponentError::Read {
        path: path.to_path_buf(),
        source: e,
    })?;

    serde_json::from_str(&content).map_err(|e| ComponentError::Malformed {
        path: path.to_path_buf(),
        source: e,
    })
}
