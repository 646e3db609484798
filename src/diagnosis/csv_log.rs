//! File-backed diagnosis log (CSV).
//!
//! Appends add one row under a writer lock. Delete and clear rewrite the
//! whole file through a sibling temp file and an atomic rename, so an
//! unsynchronized reader sees either the old or the new contents.
//! Rewrites are O(n) in the number of rows.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use super::log::{remove_images, ClearSummary, DiagnosisLog, ImageCleanup};
use super::DiagnosisError;
use crate::models::DiagnosisRecord;

/// Column order written on first append.
pub const HEADER: [&str; 6] = [
    "filename",
    "diagnosis",
    "confidence",
    "timestamp",
    "image_path",
    "note",
];

pub struct CsvDiagnosisLog {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl CsvDiagnosisLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn lock(&self) -> Result<MutexGuard<'_, ()>, DiagnosisError> {
        self.write_lock.lock().map_err(|_| DiagnosisError::LockPoisoned)
    }

    fn read_records(&self) -> Result<Vec<DiagnosisRecord>, DiagnosisError> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        // Flexible: rows from older revisions have no `note` column.
        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .from_path(&self.path)?;

        let mut records = Vec::new();
        for (row, result) in reader.deserialize::<DiagnosisRecord>().enumerate() {
            match result {
                Ok(record) => records.push(record),
                Err(e) => tracing::warn!(
                    log = %self.path.display(),
                    row = row + 1,
                    error = %e,
                    "Skipping malformed diagnosis log row"
                ),
            }
        }
        Ok(records)
    }

    /// Replace the file with a header plus `records`. Caller holds the write lock.
    fn rewrite(&self, records: &[DiagnosisRecord]) -> Result<(), DiagnosisError> {
        let dir = parent_dir(&self.path);
        std::fs::create_dir_all(dir)?;

        let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
        {
            let mut writer = csv::WriterBuilder::new()
                .has_headers(false)
                .from_writer(tmp.as_file_mut());
            writer.write_record(HEADER)?;
            for record in records {
                writer.serialize(record)?;
            }
            writer.flush()?;
        }
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path)
            .map_err(|e| DiagnosisError::Storage(e.error))?;
        Ok(())
    }
}

fn parent_dir(path: &Path) -> &Path {
    match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    }
}

/// Serialize `record` (and the header, for a new file) into one buffer.
fn encode_row(record: &DiagnosisRecord, with_header: bool) -> Result<Vec<u8>, DiagnosisError> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(Vec::new());
    if with_header {
        writer.write_record(HEADER)?;
    }
    writer.serialize(record)?;
    writer
        .into_inner()
        .map_err(|e| DiagnosisError::Log(e.to_string()))
}

impl CsvDiagnosisLog {
    /// Rewrite a legacy file whose header has no `note` column, so appended
    /// notes stay readable. Caller holds the write lock.
    fn upgrade_header(&self) -> Result<(), DiagnosisError> {
        if !self.path.exists() {
            return Ok(());
        }
        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .from_path(&self.path)?;
        let headers = reader.headers()?;
        if headers.is_empty() || headers.iter().any(|h| h == "note") {
            return Ok(());
        }

        let records = self.read_records()?;
        self.rewrite(&records)?;
        tracing::info!(
            log = %self.path.display(),
            rows = records.len(),
            "Upgraded diagnosis log header"
        );
        Ok(())
    }
}

impl DiagnosisLog for CsvDiagnosisLog {
    fn append(&self, record: &DiagnosisRecord) -> Result<(), DiagnosisError> {
        let _guard = self.lock()?;

        self.upgrade_header()?;
        std::fs::create_dir_all(parent_dir(&self.path))?;
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;

        let is_new = file.metadata()?.len() == 0;
        let row = encode_row(record, is_new)?;

        // One write per row: a reader never sees half of it interleaved with another.
        file.write_all(&row)?;
        file.sync_data()?;

        tracing::debug!(filename = %record.filename, "Diagnosis appended to log");
        Ok(())
    }

    fn list_all(&self) -> Result<Vec<DiagnosisRecord>, DiagnosisError> {
        self.read_records()
    }

    fn delete(&self, filename: &str) -> Result<usize, DiagnosisError> {
        let removed = {
            let _guard = self.lock()?;
            let records = self.read_records()?;
            let (removed, kept): (Vec<_>, Vec<_>) =
                records.into_iter().partition(|r| r.filename == filename);
            if removed.is_empty() {
                return Ok(0);
            }
            self.rewrite(&kept)?;
            removed
        };

        remove_images(&removed);
        tracing::info!(filename, removed = removed.len(), "Diagnosis deleted");
        Ok(removed.len())
    }

    fn clear(&self, images: ImageCleanup) -> Result<ClearSummary, DiagnosisError> {
        let removed = {
            let _guard = self.lock()?;
            let records = self.read_records()?;
            self.rewrite(&[])?;
            records
        };

        let images_removed = match images {
            ImageCleanup::RemoveImages => remove_images(&removed),
            ImageCleanup::KeepImages => 0,
        };

        tracing::info!(
            records = removed.len(),
            images = images_removed,
            "Diagnosis log cleared"
        );
        Ok(ClearSummary {
            records_removed: removed.len(),
            images_removed,
        })
    }
}
