//! Upload handler: persists raw image bytes under a generated name.
//!
//! Stored names are `xray_<YYYYMMDD_HHMMSS>.<ext>`. Client-supplied names
//! never reach the filesystem; they only hint at the extension when the
//! bytes themselves are not recognised.

use std::fs::OpenOptions;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use serde::Serialize;

use super::DiagnosisError;
use crate::models::truncate_to_seconds;

/// Extension used when neither bytes nor hints identify the format.
const DEFAULT_EXTENSION: &str = "png";

/// Upper bound on same-second disambiguation suffixes.
const MAX_NAME_ATTEMPTS: u32 = 1000;

/// Untrusted metadata that came with the upload.
#[derive(Debug, Clone, Default)]
pub struct UploadHints {
    pub file_name: Option<String>,
    pub content_type: Option<String>,
}

/// A persisted upload.
#[derive(Debug, Clone, Serialize)]
pub struct StoredImage {
    pub filename: String,
    pub path: PathBuf,
    pub size_bytes: u64,
    pub received_at: NaiveDateTime,
}

/// Directory of uploaded X-ray images.
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Persist `bytes` under a fresh name stamped with the current local time.
    pub fn store(&self, bytes: &[u8], hints: &UploadHints) -> Result<StoredImage, DiagnosisError> {
        self.store_at(bytes, hints, chrono::Local::now().naive_local())
    }

    /// Persist `bytes` under a fresh name stamped with `now`.
    ///
    /// Creates the directory if needed. Files are created with create-new
    /// semantics, so a second upload in the same second gets a `_2`, `_3`, …
    /// suffix instead of overwriting.
    pub fn store_at(
        &self,
        bytes: &[u8],
        hints: &UploadHints,
        now: NaiveDateTime,
    ) -> Result<StoredImage, DiagnosisError> {
        if bytes.is_empty() {
            return Err(DiagnosisError::EmptyUpload);
        }

        // create_dir_all tolerates a concurrent creator.
        std::fs::create_dir_all(&self.root)?;

        let now = truncate_to_seconds(now);
        let ext = detect_extension(bytes)
            .or_else(|| extension_from_hints(hints))
            .unwrap_or(DEFAULT_EXTENSION);

        for attempt in 1..=MAX_NAME_ATTEMPTS {
            let filename = stored_filename(&now, ext, attempt);
            let path = self.root.join(&filename);

            let mut file = match OpenOptions::new().write(true).create_new(true).open(&path) {
                Ok(f) => f,
                Err(e) if e.kind() == ErrorKind::AlreadyExists => continue,
                Err(e) => return Err(DiagnosisError::Storage(e)),
            };

            if let Err(e) = file.write_all(bytes).and_then(|()| file.sync_all()) {
                drop(file);
                let _ = std::fs::remove_file(&path);
                return Err(DiagnosisError::Storage(e));
            }

            tracing::debug!(filename = %filename, size = bytes.len(), "Upload stored");

            return Ok(StoredImage {
                filename,
                path,
                size_bytes: bytes.len() as u64,
                received_at: now,
            });
        }

        Err(DiagnosisError::Storage(std::io::Error::new(
            ErrorKind::AlreadyExists,
            "no free upload name for this second",
        )))
    }

    /// Remove a stored file. Returns `false` if it was already gone.
    pub fn remove(&self, path: &Path) -> std::io::Result<bool> {
        remove_if_present(path)
    }
}

/// `xray_20260314_092653.png`, or `xray_20260314_092653_2.png` for later attempts.
pub fn stored_filename(ts: &NaiveDateTime, ext: &str, attempt: u32) -> String {
    let stamp = ts.format("%Y%m%d_%H%M%S");
    if attempt <= 1 {
        format!("xray_{stamp}.{ext}")
    } else {
        format!("xray_{stamp}_{attempt}.{ext}")
    }
}

pub(crate) fn remove_if_present(path: &Path) -> std::io::Result<bool> {
    match std::fs::remove_file(path) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e),
    }
}

/// Detect an image container from magic bytes.
fn detect_extension(bytes: &[u8]) -> Option<&'static str> {
    if bytes.len() >= 8 && bytes[0..8] == [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A] {
        Some("png")
    } else if bytes.len() >= 3 && bytes[0..3] == [0xFF, 0xD8, 0xFF] {
        Some("jpg")
    } else if bytes.len() >= 2 && &bytes[0..2] == b"BM" {
        Some("bmp")
    } else if bytes.len() >= 6 && (&bytes[0..6] == b"GIF87a" || &bytes[0..6] == b"GIF89a") {
        Some("gif")
    } else if bytes.len() >= 4 && (&bytes[0..4] == b"II*\0" || &bytes[0..4] == b"MM\0*") {
        Some("tiff")
    } else if bytes.len() >= 12 && &bytes[0..4] == b"RIFF" && &bytes[8..12] == b"WEBP" {
        Some("webp")
    } else {
        None
    }
}

fn extension_for_mime(essence: &str) -> Option<&'static str> {
    match essence {
        "image/png" => Some("png"),
        "image/jpeg" | "image/jpg" => Some("jpg"),
        "image/bmp" | "image/x-ms-bmp" => Some("bmp"),
        "image/gif" => Some("gif"),
        "image/tiff" => Some("tiff"),
        "image/webp" => Some("webp"),
        _ => None,
    }
}

fn extension_from_hints(hints: &UploadHints) -> Option<&'static str> {
    let from_content_type = hints.content_type.as_deref().and_then(|ct| {
        let essence = ct.split(';').next().unwrap_or("").trim().to_ascii_lowercase();
        extension_for_mime(&essence)
    });

    from_content_type.or_else(|| {
        hints
            .file_name
            .as_deref()
            .and_then(|name| mime_guess::from_path(name).first())
            .and_then(|mime| extension_for_mime(mime.essence_str()))
    })
}
