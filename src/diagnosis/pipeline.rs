use std::sync::Arc;

use serde::Serialize;

use super::{DiagnosisError, DiagnosisLog, DiagnosisService, FileStore, UploadHints};
use crate::models::DiagnosisRecord;

/// Result of one upload: the record and whether it reached the log.
#[derive(Debug, Clone, Serialize)]
pub struct DiagnosisOutcome {
    #[serde(flatten)]
    pub record: DiagnosisRecord,
    pub logged: bool,
}

/// Store → classify → log, for one upload at a time.
///
/// Blocking: runs file IO and inference on the calling thread. Async
/// callers go through `spawn_blocking`.
pub struct DiagnosisPipeline {
    store: FileStore,
    service: DiagnosisService,
    log: Arc<dyn DiagnosisLog>,
}

impl DiagnosisPipeline {
    pub fn new(store: FileStore, service: DiagnosisService, log: Arc<dyn DiagnosisLog>) -> Self {
        Self { store, service, log }
    }

    pub fn log(&self) -> &Arc<dyn DiagnosisLog> {
        &self.log
    }

    pub fn service(&self) -> &DiagnosisService {
        &self.service
    }

    pub fn store(&self) -> &FileStore {
        &self.store
    }

    /// Persist, classify and record one upload.
    ///
    /// A classification failure removes the stored file and leaves the
    /// log untouched. A log append that fails twice is reported through
    /// `logged = false`; the diagnosis is still returned.
    pub fn diagnose_upload(
        &self,
        bytes: &[u8],
        hints: &UploadHints,
    ) -> Result<DiagnosisOutcome, DiagnosisError> {
        let stored = self.store.store(bytes, hints)?;

        let diagnosis = match self.service.diagnose(&stored.path) {
            Ok(d) => d,
            Err(e) => {
                if let Err(rm) = self.store.remove(&stored.path) {
                    tracing::warn!(
                        filename = %stored.filename,
                        error = %rm,
                        "Failed to remove upload after classification error"
                    );
                }
                return Err(e);
            }
        };

        let record = DiagnosisRecord::new(
            stored.filename.clone(),
            diagnosis,
            stored.received_at,
            stored.path.to_string_lossy(),
        );

        let logged = match self.log.append(&record) {
            Ok(()) => true,
            Err(first) => {
                tracing::warn!(filename = %record.filename, error = %first, "Log append failed, retrying");
                match self.log.append(&record) {
                    Ok(()) => true,
                    Err(e) => {
                        tracing::warn!(
                            filename = %record.filename,
                            error = %e,
                            "Diagnosis not recorded in log"
                        );
                        false
                    }
                }
            }
        };

        Ok(DiagnosisOutcome { record, logged })
    }
}
