//! Text-generation endpoints: symptom consultation and diagnosis explanation.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::api::error::ApiError;
use crate::api::types::ApiContext;
use crate::consult::{consult_symptoms, explain_diagnosis};

#[derive(Deserialize)]
pub struct ConsultRequest {
    pub symptoms: String,
}

#[derive(Serialize)]
pub struct ConsultResponse {
    pub consultation: String,
}

#[derive(Deserialize)]
pub struct ExplainRequest {
    pub diagnosis: String,
}

#[derive(Serialize)]
pub struct ExplainResponse {
    pub explanation: String,
}

/// `POST /consult`
pub async fn consult(
    State(ctx): State<ApiContext>,
    payload: Result<Json<ConsultRequest>, JsonRejection>,
) -> Result<Json<ConsultResponse>, ApiError> {
    let Json(req) = payload?;
    let generator = ctx.core.generator().clone();
    let consultation =
        tokio::task::spawn_blocking(move || consult_symptoms(generator.as_ref(), &req.symptoms))
            .await??;
    Ok(Json(ConsultResponse { consultation }))
}

/// `POST /explain`
pub async fn explain(
    State(ctx): State<ApiContext>,
    payload: Result<Json<ExplainRequest>, JsonRejection>,
) -> Result<Json<ExplainResponse>, ApiError> {
    let Json(req) = payload?;
    let generator = ctx.core.generator().clone();
    let explanation =
        tokio::task::spawn_blocking(move || explain_diagnosis(generator.as_ref(), &req.diagnosis))
            .await??;
    Ok(Json(ExplainResponse { explanation }))
}
