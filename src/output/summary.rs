use crate::output::RunManifest;

/// Prints a human-readable summary of a finished run to stdout
pub fn print_summary(manifest: &RunManifest) {
    let elapsed = manifest.finished_at - manifest.started_at;

    println!("=== Seed Collection Summary ===\n");
    println!("Run: {}", manifest.seed_run_id);
    println!(
        "Duration: {}.{:03}s",
        elapsed.num_seconds(),
        elapsed.num_milliseconds().rem_euclid(1000)
    );
    println!("Input categories: {}", manifest.input_category_urls.len());
    println!();

    println!("Counters:");
    println!("  List pages fetched: {}", manifest.total_list_pages_fetched);
    println!("  Detail URLs discovered: {}", manifest.total_detail_urls);
    println!("  Distinct canonical URLs: {}", manifest.total_canonical_urls);
    println!("  Failures: {}", manifest.failures_count);
    println!();

    println!("Output:");
    println!("  {}", manifest.output_paths.detail_urls.display());
    println!("  {}", manifest.output_paths.seed_failures.display());
    println!("  {}", manifest.output_paths.seed_manifest.display());
}
