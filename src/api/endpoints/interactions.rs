use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::api::error::ApiError;
use crate::api::types::ApiContext;
use crate::interactions::InteractionAssessment;

#[derive(Deserialize)]
pub struct DrugPair {
    pub drug_a: String,
    pub drug_b: String,
}

#[derive(Serialize)]
pub struct DrugListResponse {
    pub drugs: Vec<String>,
}

/// `POST /check-drug-safety`
pub async fn check(
    State(ctx): State<ApiContext>,
    payload: Result<Json<DrugPair>, JsonRejection>,
) -> Result<Json<InteractionAssessment>, ApiError> {
    let Json(pair) = payload?;
    if pair.drug_a.trim().is_empty() || pair.drug_b.trim().is_empty() {
        return Err(ApiError::BadRequest("Both drug_a and drug_b are required".into()));
    }
    let assessment = ctx.core.scorer().score(&pair.drug_a, &pair.drug_b)?;
    Ok(Json(assessment))
}

/// `GET /drugs`
pub async fn list(State(ctx): State<ApiContext>) -> Json<DrugListResponse> {
    Json(DrugListResponse {
        drugs: ctx.core.scorer().known_drugs(),
    })
}
