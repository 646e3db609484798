//! Liveness endpoints.

use axum::extract::State;
use axum::Json;
use serde::Serialize;

use crate::api::types::ApiContext;
use crate::config::{APP_NAME, APP_VERSION};

#[derive(Serialize)]
pub struct WelcomeResponse {
    pub message: String,
    pub version: &'static str,
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub classifier: String,
    pub text_model: String,
    pub uptime_secs: u64,
}

/// `GET /`
pub async fn root() -> Json<WelcomeResponse> {
    Json(WelcomeResponse {
        message: format!("Welcome to the {APP_NAME} API"),
        version: APP_VERSION,
    })
}

/// `GET /health`
pub async fn check(State(ctx): State<ApiContext>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: APP_VERSION,
        classifier: ctx.core.pipeline().service().classifier_name().to_string(),
        text_model: ctx.core.generator().model().to_string(),
        uptime_secs: ctx.core.uptime_secs(),
    })
}
