//! Writes search batches to CSV and/or JSON as a run progresses.

use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use mapscout_core::BusinessRecord;

use crate::error::SinkError;
use crate::format::{OutputFormat, SaveMode, BOM};
use crate::row::CsvRow;

/// Output files for one run, identified by their shared file stem.
///
/// In [`SaveMode::Incremental`] the first non-empty batch creates the CSV
/// (with header) and later batches append rows only; the JSON file is
/// rewritten with the full cumulative collection every time. In
/// [`SaveMode::Buffered`] nothing touches disk until [`finish`](Self::finish).
#[derive(Debug)]
pub struct ResultSink {
    dir: PathBuf,
    stem: String,
    format: OutputFormat,
    mode: SaveMode,
    records: Vec<BusinessRecord>,
    /// Records already flushed to the CSV file.
    csv_written: usize,
}

impl ResultSink {
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>, stem: impl Into<String>, format: OutputFormat, mode: SaveMode) -> Self {
        Self {
            dir: dir.into(),
            stem: stem.into(),
            format,
            mode,
            records: Vec::new(),
            csv_written: 0,
        }
    }

    #[must_use]
    pub fn csv_path(&self) -> PathBuf {
        self.dir.join(format!("{}.csv", self.stem))
    }

    #[must_use]
    pub fn json_path(&self) -> PathBuf {
        self.dir.join(format!("{}.json", self.stem))
    }

    /// Paths this sink writes for its format.
    #[must_use]
    pub fn paths(&self) -> Vec<PathBuf> {
        let mut paths = Vec::with_capacity(2);
        if self.format.writes_csv() {
            paths.push(self.csv_path());
        }
        if self.format.writes_json() {
            paths.push(self.json_path());
        }
        paths
    }

    /// Records accepted so far, in arrival order.
    #[must_use]
    pub fn records(&self) -> &[BusinessRecord] {
        &self.records
    }

    /// Takes ownership of one batch. Returns the number of records accepted.
    ///
    /// # Errors
    ///
    /// Returns a [`SinkError`] if an incremental write fails. The batch is
    /// kept in memory either way, and the next write to each file picks up
    /// every record that file is still missing.
    pub fn accept(&mut self, batch: Vec<BusinessRecord>) -> Result<usize, SinkError> {
        let count = batch.len();
        if count == 0 {
            return Ok(0);
        }
        let start = self.records.len();
        self.records.extend(batch);

        if self.mode == SaveMode::Incremental {
            self.write_increment(start)?;
        }
        Ok(count)
    }

    fn write_increment(&mut self, start: usize) -> Result<(), SinkError> {
        fs::create_dir_all(&self.dir).map_err(SinkError::io(&self.dir))?;

        let mut failure = None;
        if self.format.writes_csv() {
            let path = self.csv_path();
            let fresh = self.csv_written == 0;
            let pending = &self.records[self.csv_written..];
            match write_csv(&path, pending, fresh, fresh && self.format.csv_bom()) {
                Ok(()) => self.csv_written = self.records.len(),
                Err(err) => failure = Some(err),
            }
        }
        if self.format.writes_json() {
            if let Err(err) = write_json(&self.json_path(), &self.records) {
                failure.get_or_insert(err);
            }
        }
        if let Some(err) = failure {
            return Err(err);
        }
        tracing::debug!(
            stem = %self.stem,
            added = self.records.len() - start,
            total = self.records.len(),
            "batch saved"
        );
        Ok(())
    }

    /// Flushes buffered output and hands back every accepted record.
    ///
    /// # Errors
    ///
    /// Returns a [`SinkError`] if the buffered write fails.
    pub fn finish(self) -> Result<Vec<BusinessRecord>, SinkError> {
        if self.mode == SaveMode::Buffered && !self.records.is_empty() {
            fs::create_dir_all(&self.dir).map_err(SinkError::io(&self.dir))?;
            if self.format.writes_csv() {
                write_csv(&self.csv_path(), &self.records, true, self.format.csv_bom())?;
            }
            if self.format.writes_json() {
                write_json(&self.json_path(), &self.records)?;
            }
        }
        if self.records.is_empty() {
            tracing::warn!(stem = %self.stem, "no results to save");
        } else {
            tracing::info!(
                stem = %self.stem,
                records = self.records.len(),
                files = ?self.paths(),
                "results saved"
            );
        }
        Ok(self.records)
    }
}

/// Creates (`fresh`) or appends to a CSV file. A fresh file gets the header
/// and, if asked, a BOM.
fn write_csv(path: &Path, records: &[BusinessRecord], fresh: bool, bom: bool) -> Result<(), SinkError> {
    let opened = if fresh {
        File::create(path)
    } else {
        OpenOptions::new().append(true).create(true).open(path)
    };
    let file = opened.map_err(SinkError::io(path))?;

    let mut out = BufWriter::new(file);
    if bom {
        out.write_all(BOM).map_err(SinkError::io(path))?;
    }

    let mut writer = csv::WriterBuilder::new()
        .has_headers(fresh)
        .from_writer(out);
    for record in records {
        writer
            .serialize(CsvRow::from(record))
            .map_err(SinkError::csv(path))?;
    }
    writer.flush().map_err(SinkError::io(path))
}

fn write_json(path: &Path, records: &[BusinessRecord]) -> Result<(), SinkError> {
    let file = File::create(path).map_err(SinkError::io(path))?;
    let mut out = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut out, records).map_err(SinkError::json(path))?;
    out.flush().map_err(SinkError::io(path))
}

/// Reads a JSON array of records, as written by [`ResultSink`].
///
/// # Errors
///
/// Returns a [`SinkError`] if the file cannot be read or parsed.
pub fn read_json(path: &Path) -> Result<Vec<BusinessRecord>, SinkError> {
    let text = fs::read_to_string(path).map_err(SinkError::io(path))?;
    serde_json::from_str(&text).map_err(SinkError::json(path))
}

#[cfg(test)]
#[path = "sink_test.rs"]
mod tests;
