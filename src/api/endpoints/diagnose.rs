//! `POST /diagnose`: X-ray upload and diagnosis.

use axum::extract::multipart::MultipartRejection;
use axum::extract::{Multipart, State};
use axum::Json;

use crate::api::error::ApiError;
use crate::api::types::ApiContext;
use crate::diagnosis::{DiagnosisOutcome, UploadHints};

/// Multipart field carrying the image.
const FILE_FIELD: &str = "file";

/// Accepts one multipart field named `file` and returns the logged record.
///
/// The pipeline runs on the blocking pool and is not tied to the client
/// connection: once classification succeeds the append completes even if
/// the caller has gone away.
pub async fn upload(
    State(ctx): State<ApiContext>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<DiagnosisOutcome>, ApiError> {
    let mut multipart = multipart?;
    let mut upload: Option<(Vec<u8>, UploadHints)> = None;

    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }
        let hints = UploadHints {
            file_name: field.file_name().map(String::from),
            content_type: field.content_type().map(String::from),
        };
        let bytes = field.bytes().await?;
        upload = Some((bytes.to_vec(), hints));
    }

    let (bytes, hints) =
        upload.ok_or_else(|| ApiError::BadRequest("No file provided in field 'file'".into()))?;

    tracing::info!(
        size = bytes.len(),
        content_type = hints.content_type.as_deref().unwrap_or("unknown"),
        "Diagnosis upload received"
    );

    let pipeline = ctx.core.pipeline().clone();
    let outcome =
        tokio::task::spawn_blocking(move || pipeline.diagnose_upload(&bytes, &hints)).await??;

    Ok(Json(outcome))
}
