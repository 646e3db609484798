//! Diagnosis log contract and the in-memory implementation.

use std::path::Path;
use std::sync::RwLock;

use serde::Serialize;

use super::file_store::remove_if_present;
use super::DiagnosisError;
use crate::models::DiagnosisRecord;

/// What a bulk clear does with the image files behind the records.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageCleanup {
    /// Delete each record's `image_path` as well.
    RemoveImages,
    /// Leave image files on disk.
    KeepImages,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ClearSummary {
    pub records_removed: usize,
    pub images_removed: usize,
}

/// Append-only ledger of diagnosis records.
///
/// Writers are serialized by the implementation; concurrent `append`
/// calls never lose or interleave rows. Reads always reflect the
/// backing store, with no caching.
pub trait DiagnosisLog: Send + Sync {
    fn append(&self, record: &DiagnosisRecord) -> Result<(), DiagnosisError>;

    /// Every record, oldest first.
    fn list_all(&self) -> Result<Vec<DiagnosisRecord>, DiagnosisError>;

    /// Remove all records named `filename` and their image files.
    ///
    /// Returns the number of records removed; an unknown name is a no-op.
    fn delete(&self, filename: &str) -> Result<usize, DiagnosisError>;

    fn clear(&self, images: ImageCleanup) -> Result<ClearSummary, DiagnosisError>;
}

/// Delete the image files behind `removed`. Failures are logged, not returned:
/// the records are already gone, and an orphaned file is harmless.
pub(crate) fn remove_images(removed: &[DiagnosisRecord]) -> usize {
    let mut count = 0;
    for record in removed {
        match remove_if_present(Path::new(&record.image_path)) {
            Ok(true) => count += 1,
            Ok(false) => {}
            Err(e) => tracing::warn!(
                filename = %record.filename,
                error = %e,
                "Failed to delete image file"
            ),
        }
    }
    count
}

/// Session-scoped log held in memory.
#[derive(Default)]
pub struct MemoryDiagnosisLog {
    records: RwLock<Vec<DiagnosisRecord>>,
}

impl MemoryDiagnosisLog {
    pub fn new() -> Self {
        Self::default()
    }
}

impl DiagnosisLog for MemoryDiagnosisLog {
    fn append(&self, record: &DiagnosisRecord) -> Result<(), DiagnosisError> {
        let mut records = self.records.write().map_err(|_| DiagnosisError::LockPoisoned)?;
        records.push(record.clone());
        Ok(())
    }

    fn list_all(&self) -> Result<Vec<DiagnosisRecord>, DiagnosisError> {
        let records = self.records.read().map_err(|_| DiagnosisError::LockPoisoned)?;
        Ok(records.clone())
    }

    fn delete(&self, filename: &str) -> Result<usize, DiagnosisError> {
        let removed: Vec<DiagnosisRecord> = {
            let mut records = self.records.write().map_err(|_| DiagnosisError::LockPoisoned)?;
            let (removed, kept): (Vec<_>, Vec<_>) =
                records.drain(..).partition(|r| r.filename == filename);
            *records = kept;
            removed
        };
        remove_images(&removed);
        Ok(removed.len())
    }

    fn clear(&self, images: ImageCleanup) -> Result<ClearSummary, DiagnosisError> {
        let removed = {
            let mut records = self.records.write().map_err(|_| DiagnosisError::LockPoisoned)?;
            std::mem::take(&mut *records)
        };
        let images_removed = match images {
            ImageCleanup::RemoveImages => remove_images(&removed),
            ImageCleanup::KeepImages => 0,
        };
        Ok(ClearSummary {
            records_removed: removed.len(),
            images_removed,
        })
    }
}
