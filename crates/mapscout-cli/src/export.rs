//! The `export` command: merge a saved JSON result file into per-district CSVs.

use std::path::Path;

use anyhow::Context;
use mapscout_sink::{read_json, DistrictExporter, DistrictReport};

/// Reads `input` and merges its records into the district files under `dir`.
///
/// # Errors
///
/// Returns an error if `input` is not a readable result file or a district
/// file cannot be written.
pub fn export_by_district(input: &Path, dir: &Path) -> anyhow::Result<DistrictReport> {
    let records = read_json(input)
        .with_context(|| format!("failed to read results from {}", input.display()))?;
    tracing::info!(input = %input.display(), records = records.len(), "exporting by district");
    DistrictExporter::new(dir)
        .export(&records)
        .context("failed to write district files")
}

pub fn print_report(report: &DistrictReport) {
    if report.files.is_empty() {
        println!("No results to export.");
        return;
    }
    println!("{} businesses in {} district files", report.total, report.files.len());
    for file in &report.files {
        println!("Saved: {}", file.display());
    }
    if let Some(summary) = &report.summary {
        println!("Summary: {}", summary.display());
    }
}
