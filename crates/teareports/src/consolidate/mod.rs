//! Merging scraper output batches into the consolidated report library.

pub mod component;
pub mod library;
pub mod manifest;
pub mod runner;

pub use component::{component_key, load_component, normalize_component_name};
pub use library::{Library, LibraryEntry};
pub use manifest::{Manifest, TitleSale, MANIFEST_FILE};
pub use runner::{consolidate, ComponentWarning, ConsolidationReport, Consolidator, SkippedBatch};
