use crate::output::jsonl::to_ascii_vec_pretty;
use crate::output::RunManifest;
use crate::SeedError;
use std::path::Path;

/// Writes the run manifest as indented ASCII-only JSON with a trailing newline
///
/// # Arguments
///
/// * `path` - Destination file, replaced if it exists
/// * `manifest` - The finalized manifest
pub fn write_manifest(path: &Path, manifest: &RunManifest) -> Result<(), SeedError> {
    let mut content = to_ascii_vec_pretty(manifest)?;
    content.push(b'\n');
    std::fs::write(path, content)?;
    tracing::debug!("Wrote manifest to {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::OutputPaths;
    use chrono::Utc;
    use tempfile::TempDir;

    #[test]
    fn test_manifest_file_contents() {
        let dir = TempDir::new().unwrap();
        let paths = OutputPaths::in_dir(dir.path());
        let now = Utc::now();
        let manifest = RunManifest {
            seed_run_id: "run-1".to_string(),
            started_at: now,
            finished_at: now,
            input_category_urls: vec!["https://shop.example.com/category/상의".to_string()],
            total_list_pages_fetched: 3,
            total_detail_urls: 10,
            total_canonical_urls: 7,
            failures_count: 1,
            config_hash: "abc".to_string(),
            output_paths: paths.clone(),
        };

        write_manifest(&paths.seed_manifest, &manifest).unwrap();

        let content = std::fs::read_to_string(&paths.seed_manifest).unwrap();
        assert!(content.is_ascii());
        assert!(content.ends_with("}\n"));
        assert!(content.contains("\n  \"total_canonical_urls\": 7,"));

        let parsed: RunManifest = serde_json::from_str(&content).unwrap();
        assert_eq!(parsed, manifest);
    }
}
