//! Diagnosis log endpoints: list, delete one, clear all.

use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::api::error::ApiError;
use crate::api::types::ApiContext;
use crate::diagnosis::ImageCleanup;
use crate::models::DiagnosisRecord;

#[derive(Serialize)]
pub struct LogResponse {
    pub log: Vec<DiagnosisRecord>,
}

#[derive(Deserialize)]
pub struct DeleteParams {
    pub filename: Option<String>,
}

#[derive(Serialize)]
pub struct DeleteResponse {
    pub status: &'static str,
    pub filename: String,
    pub removed: usize,
}

#[derive(Serialize)]
pub struct ClearResponse {
    pub status: &'static str,
    pub records_removed: usize,
    pub images_removed: usize,
}

/// `GET /diagnosis-log`
pub async fn list(State(ctx): State<ApiContext>) -> Result<Json<LogResponse>, ApiError> {
    let log = ctx.core.log().clone();
    let records = tokio::task::spawn_blocking(move || log.list_all()).await??;
    Ok(Json(LogResponse { log: records }))
}

/// `DELETE /delete-diagnosis?filename=…`
///
/// An unknown filename is not an error; `removed` is 0.
pub async fn delete_one(
    State(ctx): State<ApiContext>,
    params: Result<Query<DeleteParams>, QueryRejection>,
) -> Result<Json<DeleteResponse>, ApiError> {
    let Query(params) = params?;
    let filename = params
        .filename
        .map(|f| f.trim().to_string())
        .filter(|f| !f.is_empty())
        .ok_or_else(|| ApiError::BadRequest("Query parameter 'filename' is required".into()))?;

    let log = ctx.core.log().clone();
    let name = filename.clone();
    let removed = tokio::task::spawn_blocking(move || log.delete(&name)).await??;

    Ok(Json(DeleteResponse {
        status: "deleted",
        filename,
        removed,
    }))
}

/// `DELETE /delete-diagnoses`: removes every record and its image.
pub async fn clear(State(ctx): State<ApiContext>) -> Result<Json<ClearResponse>, ApiError> {
    let log = ctx.core.log().clone();
    let summary =
        tokio::task::spawn_blocking(move || log.clear(ImageCleanup::RemoveImages)).await??;

    Ok(Json(ClearResponse {
        status: "cleared",
        records_removed: summary.records_removed,
        images_removed: summary.images_removed,
    }))
}
