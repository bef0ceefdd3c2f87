//! Output module for collected records and the run manifest
//!
//! This module handles:
//! - Record types for detail URLs, failures and the manifest
//! - ASCII-escaped JSON Lines writing
//! - Writing the manifest and printing the end-of-run summary

mod jsonl;
mod manifest;
mod records;
mod summary;

pub use jsonl::{to_ascii_vec, to_ascii_vec_pretty, AsciiFormatter, JsonlWriter};
pub use manifest::write_manifest;
pub use records::{
    DetailRecord, FailureCategory, FailureRecord, OutputPaths, RunManifest, DETAIL_URLS_FILE,
    DISCOVERY_METHOD_CATEGORY_LIST, SEED_FAILURES_FILE, SEED_MANIFEST_FILE,
};
pub use summary::print_summary;

use crate::SeedError;
use std::path::Path;

/// Creates the output directory and returns the file layout inside it
///
/// # Returns
///
/// * `Ok(OutputPaths)` - The directory exists and is ready
/// * `Err(SeedError::OutputSetup)` - The directory could not be created
pub fn prepare_output_dir(out_dir: &Path) -> Result<OutputPaths, SeedError> {
    std::fs::create_dir_all(out_dir).map_err(|source| SeedError::OutputSetup {
        path: out_dir.display().to_string(),
        source,
    })?;
    Ok(OutputPaths::in_dir(out_dir))
}
