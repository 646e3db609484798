//! API router.
//!
//! Returns a composable `Router` that can be mounted on any axum server.
//! Layers (outermost first): trace → CORS → body limit → handler.

use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::http::{HeaderValue, Method, Uri};
use axum::routing::{delete, get, post};
use axum::Router;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::api::endpoints;
use crate::api::error::ApiError;
use crate::api::types::ApiContext;
use crate::core_state::CoreState;

/// Build the API router over shared state.
pub fn api_router(core: Arc<CoreState>) -> Router {
    let body_limit = core.config.max_upload_bytes;
    let cors = cors_layer(&core.config.cors_origins);
    let ctx = ApiContext::new(core);

    Router::new()
        .route("/", get(endpoints::health::root))
        .route("/health", get(endpoints::health::check))
        .route("/diagnose", post(endpoints::diagnose::upload))
        .route("/diagnosis-log", get(endpoints::log::list))
        .route("/delete-diagnosis", delete(endpoints::log::delete_one))
        .route("/delete-diagnoses", delete(endpoints::log::clear))
        .route("/consult", post(endpoints::consult::consult))
        .route("/explain", post(endpoints::consult::explain))
        .route("/check-drug-safety", post(endpoints::interactions::check))
        .route("/drugs", get(endpoints::interactions::list))
        .method_not_allowed_fallback(method_not_allowed)
        .fallback(not_found)
        .with_state(ctx)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

async fn not_found(uri: Uri) -> ApiError {
    ApiError::NotFound(format!("No route for {}", uri.path()))
}

async fn method_not_allowed(method: Method, uri: Uri) -> ApiError {
    ApiError::MethodNotAllowed(format!("{method} is not supported on {}", uri.path()))
}

/// Any origin when `origins` is empty; otherwise exactly the listed ones.
fn cors_layer(origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    if origins.is_empty() {
        return layer.allow_origin(Any);
    }

    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| match HeaderValue::from_str(o) {
            Ok(v) => Some(v),
            Err(_) => {
                tracing::warn!(origin = %o, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();
    layer.allow_origin(AllowOrigin::list(allowed))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use http_body_util::BodyExt;
    use image::{DynamicImage, ImageOutputFormat, Rgb, RgbImage};
    use std::io::Cursor;
    use tower::ServiceExt;

    use crate::config::AppConfig;
    use crate::core_state::test_support::{core_in, triage_core_offline};
    use crate::vision::CHEXNET_LABELS;

    const BOUNDARY: &str = "medassist-test-boundary";

    fn black_png() -> Vec<u8> {
        let mut buf = Cursor::new(Vec::new());
        DynamicImage::ImageRgb8(RgbImage::from_pixel(10, 10, Rgb([0, 0, 0])))
            .write_to(&mut buf, ImageOutputFormat::Png)
            .unwrap();
        buf.into_inner()
    }

    fn multipart_body(field: &str, filename: &str, content_type: &str, bytes: &[u8]) -> Vec<u8> {
        let mut body = Vec::new();
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{field}\"; filename=\"{filename}\"\r\nContent-Type: {content_type}\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(bytes);
        body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());
        body
    }

    fn upload_request(body: Vec<u8>) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/diagnose")
            .header(
                "content-type",
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
            .unwrap()
    }

    fn json_request(method: &str, uri: &str, json: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(json.to_string()))
            .unwrap()
    }

    fn empty_request(method: &str, uri: &str) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::empty())
            .unwrap()
    }

    async fn send(app: &Router, req: Request<Body>) -> (StatusCode, serde_json::Value) {
        let response = app.clone().oneshot(req).await.unwrap();
        let status = response.status();
        let body = response.into_body().collect().await.unwrap().to_bytes();
        let json = if body.is_empty() {
            serde_json::Value::Null
        } else {
            serde_json::from_slice(&body).unwrap()
        };
        (status, json)
    }

    #[tokio::test]
    async fn root_and_health_respond() {
        let tmp = tempfile::tempdir().unwrap();
        let app = api_router(core_in(tmp.path(), "ok"));

        let (status, json) = send(&app, empty_request("GET", "/")).await;
        assert_eq!(status, StatusCode::OK);
        assert!(json["message"].as_str().unwrap().contains("MedAssist"));

        let (status, json) = send(&app, empty_request("GET", "/health")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["status"], "ok");
        assert_eq!(json["classifier"], "baseline-chexnet");
    }

    #[tokio::test]
    async fn upload_list_delete_flow() {
        let tmp = tempfile::tempdir().unwrap();
        let app = api_router(core_in(tmp.path(), "ok"));

        let (status, json) = send(
            &app,
            upload_request(multipart_body("file", "chest.png", "image/png", &black_png())),
        )
        .await;
        assert_eq!(status, StatusCode::OK, "{json}");
        let filename = json["filename"].as_str().unwrap().to_string();
        assert!(filename.starts_with("xray_") && filename.ends_with(".png"));
        assert!(CHEXNET_LABELS.contains(&json["diagnosis"].as_str().unwrap()));
        let confidence = json["confidence"].as_f64().unwrap();
        assert!((0.0..=1.0).contains(&confidence));
        assert_eq!((confidence * 100.0).round() / 100.0, confidence);
        assert_eq!(json["logged"], true);
        let image_path = std::path::PathBuf::from(json["image_path"].as_str().unwrap());
        assert!(image_path.exists());
        assert_eq!(std::fs::read(&image_path).unwrap(), black_png());

        let (status, json) = send(&app, empty_request("GET", "/diagnosis-log")).await;
        assert_eq!(status, StatusCode::OK);
        let log = json["log"].as_array().unwrap();
        assert_eq!(log.len(), 1);
        assert_eq!(log[0]["filename"], filename.as_str());

        let (status, json) = send(
            &app,
            empty_request("DELETE", &format!("/delete-diagnosis?filename={filename}")),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["status"], "deleted");
        assert_eq!(json["removed"], 1);
        assert!(!image_path.exists());

        let (_, json) = send(&app, empty_request("GET", "/diagnosis-log")).await;
        assert!(json["log"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn delete_unknown_filename_is_noop() {
        let tmp = tempfile::tempdir().unwrap();
        let app = api_router(core_in(tmp.path(), "ok"));
        send(&app, upload_request(multipart_body("file", "a.png", "image/png", &black_png()))).await;

        let (status, json) = send(
            &app,
            empty_request("DELETE", "/delete-diagnosis?filename=xray_19700101_000000.png"),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["removed"], 0);

        let (_, json) = send(&app, empty_request("GET", "/diagnosis-log")).await;
        assert_eq!(json["log"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn delete_without_filename_is_bad_request() {
        let tmp = tempfile::tempdir().unwrap();
        let app = api_router(core_in(tmp.path(), "ok"));
        let (status, json) = send(&app, empty_request("DELETE", "/delete-diagnosis")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"]["code"], "BAD_REQUEST");
    }

    #[tokio::test]
    async fn clear_removes_records_and_images() {
        let tmp = tempfile::tempdir().unwrap();
        let app = api_router(core_in(tmp.path(), "ok"));
        for _ in 0..2 {
            let (status, _) = send(
                &app,
                upload_request(multipart_body("file", "a.png", "image/png", &black_png())),
            )
            .await;
            assert_eq!(status, StatusCode::OK);
        }

        let (status, json) = send(&app, empty_request("DELETE", "/delete-diagnoses")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["status"], "cleared");
        assert_eq!(json["records_removed"], 2);
        assert_eq!(json["images_removed"], 2);

        let (_, json) = send(&app, empty_request("GET", "/diagnosis-log")).await;
        assert!(json["log"].as_array().unwrap().is_empty());
        assert_eq!(std::fs::read_dir(tmp.path().join("uploads")).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn invalid_image_is_rejected_without_residue() {
        let tmp = tempfile::tempdir().unwrap();
        let app = api_router(core_in(tmp.path(), "ok"));

        let (status, json) = send(
            &app,
            upload_request(multipart_body("file", "scan.png", "image/png", b"not an image at all")),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(json["error"]["code"], "INVALID_IMAGE");

        let (_, json) = send(&app, empty_request("GET", "/diagnosis-log")).await;
        assert!(json["log"].as_array().unwrap().is_empty());
        assert_eq!(std::fs::read_dir(tmp.path().join("uploads")).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn missing_or_empty_file_is_bad_request() {
        let tmp = tempfile::tempdir().unwrap();
        let app = api_router(core_in(tmp.path(), "ok"));

        let (status, _) = send(
            &app,
            upload_request(multipart_body("attachment", "a.png", "image/png", &black_png())),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, json) = send(
            &app,
            upload_request(multipart_body("file", "a.png", "image/png", b"")),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"]["code"], "BAD_REQUEST");
    }

    #[tokio::test]
    async fn oversized_upload_is_rejected() {
        let tmp = tempfile::tempdir().unwrap();
        let config = AppConfig {
            upload_dir: tmp.path().join("uploads"),
            log_file: tmp.path().join("log.csv"),
            max_upload_bytes: 1024,
            ..AppConfig::default()
        };
        let core = Arc::new(CoreState::new(
            config,
            Arc::new(crate::vision::BaselineClassifier::new(crate::vision::LabelSet::ChexNet)),
            Arc::new(crate::diagnosis::MemoryDiagnosisLog::new()),
            Arc::new(crate::consult::MockTextGenerator::new("ok")),
            Arc::new(crate::interactions::GraphInteractionScorer::default()),
        ));
        let app = api_router(core);

        let big = vec![0u8; 4096];
        let (status, json) = send(
            &app,
            upload_request(multipart_body("file", "big.png", "image/png", &big)),
        )
        .await;
        assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(json["error"]["code"], "PAYLOAD_TOO_LARGE");
    }

    #[tokio::test]
    async fn triage_labels_carry_notes() {
        let tmp = tempfile::tempdir().unwrap();
        let app = api_router(triage_core_offline(tmp.path()));

        let (status, json) = send(
            &app,
            upload_request(multipart_body("file", "a.png", "image/png", &black_png())),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert!(json["note"].is_string());
    }

    #[tokio::test]
    async fn consult_returns_generated_text() {
        let tmp = tempfile::tempdir().unwrap();
        let app = api_router(core_in(tmp.path(), "Likely viral infection."));

        let (status, json) = send(
            &app,
            json_request("POST", "/consult", serde_json::json!({"symptoms": "fever, cough"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["consultation"], "Likely viral infection.");

        let (status, json) = send(
            &app,
            json_request("POST", "/explain", serde_json::json!({"diagnosis": "Effusion"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["explanation"], "Likely viral infection.");
    }

    #[tokio::test]
    async fn consult_rejects_blank_and_malformed_input() {
        let tmp = tempfile::tempdir().unwrap();
        let app = api_router(core_in(tmp.path(), "unused"));

        let (status, json) = send(
            &app,
            json_request("POST", "/consult", serde_json::json!({"symptoms": "   "})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"]["code"], "BAD_REQUEST");

        let (status, json) = send(
            &app,
            json_request("POST", "/consult", serde_json::json!({"text": "fever"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"]["code"], "BAD_REQUEST");
    }

    #[tokio::test]
    async fn consult_upstream_failure_is_502() {
        let tmp = tempfile::tempdir().unwrap();
        let app = api_router(triage_core_offline(tmp.path()));

        let (status, json) = send(
            &app,
            json_request("POST", "/consult", serde_json::json!({"symptoms": "headache"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(json["error"]["code"], "UPSTREAM_UNAVAILABLE");
    }

    #[tokio::test]
    async fn drug_safety_check() {
        let tmp = tempfile::tempdir().unwrap();
        let app = api_router(core_in(tmp.path(), "ok"));

        let (status, json) = send(
            &app,
            json_request(
                "POST",
                "/check-drug-safety",
                serde_json::json!({"drug_a": "aspirin", "drug_b": "Warfarin"}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["interaction"], true);
        assert_eq!(json["risk"], 1.0);

        let (status, json) = send(
            &app,
            json_request(
                "POST",
                "/check-drug-safety",
                serde_json::json!({"drug_a": "Aspirin", "drug_b": "Kryptonite"}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"]["code"], "BAD_REQUEST");

        let (status, json) = send(&app, empty_request("GET", "/drugs")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["drugs"].as_array().unwrap().len(), 15);
    }

    #[tokio::test]
    async fn unknown_route_returns_404() {
        let tmp = tempfile::tempdir().unwrap();
        let app = api_router(core_in(tmp.path(), "ok"));
        let (status, json) = send(&app, empty_request("GET", "/nonexistent")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(json["error"]["code"], "NOT_FOUND");
    }

    #[tokio::test]
    async fn wrong_method_returns_structured_405() {
        let tmp = tempfile::tempdir().unwrap();
        let app = api_router(core_in(tmp.path(), "ok"));
        let (status, json) = send(&app, empty_request("GET", "/diagnose")).await;
        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(json["error"]["code"], "METHOD_NOT_ALLOWED");
    }

    #[tokio::test]
    async fn non_multipart_upload_is_structured_bad_request() {
        let tmp = tempfile::tempdir().unwrap();
        let app = api_router(core_in(tmp.path(), "ok"));
        let (status, json) = send(
            &app,
            json_request("POST", "/diagnose", serde_json::json!({"file": "x"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"]["code"], "BAD_REQUEST");
        assert!(json["error"]["message"]
            .as_str()
            .unwrap()
            .starts_with("Malformed multipart body"));

        let (_, json) = send(&app, empty_request("GET", "/diagnosis-log")).await;
        assert!(json["log"].as_array().unwrap().is_empty());
    }

    #[test]
    fn cors_layer_accepts_listed_origins() {
        // Construction must not panic on a mix of valid and invalid origins.
        let _ = cors_layer(&["http://localhost:8501".into(), "bad\norigin".into()]);
        let _ = cors_layer(&[]);
    }
}
