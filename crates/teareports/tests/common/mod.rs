//! Shared test utilities for teareports integration tests.
//!
//! This module provides:
//! - `TestHarness` for isolated runs against temp source/raw/analysis directories
//! - Builders for manifests, job configs and in-memory extractors

pub mod builders;
pub mod harness;

pub use builders::*;
pub use harness::TestHarness;
