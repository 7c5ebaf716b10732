//! Per-district CSV files that accumulate across runs.

use std::collections::{BTreeMap, HashSet};
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use mapscout_core::BusinessRecord;

use crate::error::SinkError;
use crate::format::BOM;
use crate::row::CsvRow;

const SUMMARY_FILE: &str = "summary.txt";

/// What one export wrote.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DistrictReport {
    pub files: Vec<PathBuf>,
    pub summary: Option<PathBuf>,
    pub total: usize,
}

/// Writes `gmb_{District_Name}.csv` per district under one directory.
#[derive(Debug, Clone)]
pub struct DistrictExporter {
    dir: PathBuf,
}

impl DistrictExporter {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    #[must_use]
    pub fn path_for(&self, district: &str) -> PathBuf {
        self.dir.join(format!("gmb_{}.csv", district_key(district)))
    }

    /// Merges `records` into each district's file and rewrites the summary.
    ///
    /// Existing rows and new rows are combined, duplicates by
    /// `(name, address)` keep the later row, and the file is sorted by
    /// `(search_query, name)`.
    ///
    /// # Errors
    ///
    /// Returns a [`SinkError`] if a district file cannot be read or written.
    pub fn export(&self, records: &[BusinessRecord]) -> Result<DistrictReport, SinkError> {
        if records.is_empty() {
            tracing::warn!("no results to export by district");
            return Ok(DistrictReport {
                files: Vec::new(),
                summary: None,
                total: 0,
            });
        }
        fs::create_dir_all(&self.dir).map_err(SinkError::io(&self.dir))?;

        let mut by_district: BTreeMap<String, Vec<&BusinessRecord>> = BTreeMap::new();
        for record in records {
            by_district
                .entry(district_key(&record.district))
                .or_default()
                .push(record);
        }

        let mut files = Vec::with_capacity(by_district.len());
        for (key, group) in &by_district {
            let path = self.dir.join(format!("gmb_{key}.csv"));
            let mut rows = if path.exists() {
                read_rows(&path)?
            } else {
                Vec::new()
            };
            let existing = rows.len();
            rows.extend(group.iter().map(|r| CsvRow::from(*r)));
            let rows = merge_rows(rows);
            write_rows(&path, &rows)?;
            tracing::info!(
                district = %key,
                existing,
                added = group.len(),
                total = rows.len(),
                path = %path.display(),
                "district file saved"
            );
            files.push(path);
        }

        let summary = self.dir.join(SUMMARY_FILE);
        write_summary(&summary, records.len(), &by_district)?;

        Ok(DistrictReport {
            files,
            summary: Some(summary),
            total: records.len(),
        })
    }
}

/// File-name form of a district: spaces become underscores.
#[must_use]
pub fn district_key(district: &str) -> String {
    let key = district.split_whitespace().collect::<Vec<_>>().join("_");
    if key.is_empty() {
        "unknown".to_string()
    } else {
        key
    }
}

/// Drops earlier duplicates by `(name, address)`, then sorts by
/// `(search_query, name)`.
#[must_use]
pub fn merge_rows(rows: Vec<CsvRow>) -> Vec<CsvRow> {
    let mut merged = {
        let mut seen = HashSet::new();
        let mut kept: Vec<CsvRow> = Vec::with_capacity(rows.len());
        for row in rows.into_iter().rev() {
            if seen.insert((row.name.clone(), row.address.clone())) {
                kept.push(row);
            }
        }
        kept.reverse();
        kept
    };
    merged.sort_by(|a, b| {
        a.search_query
            .cmp(&b.search_query)
            .then_with(|| a.name.cmp(&b.name))
    });
    merged
}

fn read_rows(path: &Path) -> Result<Vec<CsvRow>, SinkError> {
    let text = fs::read_to_string(path).map_err(SinkError::io(path))?;
    let text = text.strip_prefix('\u{feff}').unwrap_or(&text);
    let mut reader = csv::Reader::from_reader(text.as_bytes());
    reader
        .deserialize()
        .collect::<Result<Vec<CsvRow>, _>>()
        .map_err(SinkError::csv(path))
}

fn write_rows(path: &Path, rows: &[CsvRow]) -> Result<(), SinkError> {
    let file = File::create(path).map_err(SinkError::io(path))?;
    let mut out = BufWriter::new(file);
    out.write_all(BOM).map_err(SinkError::io(path))?;
    let mut writer = csv::Writer::from_writer(out);
    for row in rows {
        writer.serialize(row).map_err(SinkError::csv(path))?;
    }
    writer.flush().map_err(SinkError::io(path))
}

fn write_summary(
    path: &Path,
    total: usize,
    by_district: &BTreeMap<String, Vec<&BusinessRecord>>,
) -> Result<(), SinkError> {
    let mut text = String::new();
    text.push_str("Scraping summary\n");
    text.push_str(&"=".repeat(50));
    text.push('\n');
    text.push_str(&format!("Total businesses: {total}\n"));
    text.push_str(&format!("Districts processed: {}\n\n", by_district.len()));

    for (district, group) in by_district {
        let mut per_query: BTreeMap<&str, usize> = BTreeMap::new();
        for record in group {
            *per_query.entry(record.search_query.as_str()).or_default() += 1;
        }
        text.push_str(&format!("\n{district}:\n"));
        for (query, count) in per_query {
            text.push_str(&format!("  - {query}: {count} results\n"));
        }
    }

    fs::write(path, text).map_err(SinkError::io(path))
}
