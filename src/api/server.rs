//! API server lifecycle: bind, serve in a background task, shut down on demand.
//!
//! bind → spawn background task → return handle with shutdown channel.

use std::net::SocketAddr;
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::oneshot;
use uuid::Uuid;

use crate::api::router::api_router;
use crate::core_state::CoreState;

// ═══════════════════════════════════════════════════════════
// Public types
// ═══════════════════════════════════════════════════════════

/// Session metadata for a running server.
#[derive(Debug, Clone, Serialize)]
pub struct ApiSession {
    pub session_id: String,
    pub server_addr: String,
    pub port: u16,
    pub started_at: String,
}

/// Handle to a running server.
pub struct ApiServer {
    pub session: ApiSession,
    shutdown_tx: Option<oneshot::Sender<()>>,
    task: Option<tokio::task::JoinHandle<()>>,
}

impl ApiServer {
    /// Signal graceful shutdown. Safe to call more than once.
    pub fn shutdown(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
            tracing::info!("API server shutdown signal sent");
        }
    }

    /// Signal shutdown and wait for in-flight requests to finish.
    pub async fn stop(mut self) {
        self.shutdown();
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                tracing::error!("API server task failed: {e}");
            }
        }
    }
}

// ═══════════════════════════════════════════════════════════
// Server lifecycle
// ═══════════════════════════════════════════════════════════

/// Bind `addr` and serve the API router in a background tokio task.
///
/// Port 0 binds an ephemeral port; the chosen one is in the returned session.
pub async fn start_server(core: Arc<CoreState>, addr: SocketAddr) -> Result<ApiServer, String> {
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| format!("Failed to bind API server on {addr}: {e}"))?;

    let addr = listener
        .local_addr()
        .map_err(|e| format!("Failed to get server address: {e}"))?;

    let app = api_router(core);

    let session = ApiSession {
        session_id: Uuid::new_v4().to_string(),
        server_addr: addr.to_string(),
        port: addr.port(),
        started_at: chrono::Utc::now().to_rfc3339(),
    };

    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

    let task = tokio::spawn(async move {
        let shutdown_signal = async move {
            let _ = shutdown_rx.await;
            tracing::info!("API server received shutdown signal");
        };

        tracing::info!(%addr, "API server started");

        if let Err(e) = axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal)
            .await
        {
            tracing::error!("API server error: {e}");
        }

        tracing::info!("API server stopped");
    });

    Ok(ApiServer {
        session,
        shutdown_tx: Some(shutdown_tx),
        task: Some(task),
    })
}

// ═══════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_state::test_support::core_in;
    use std::net::{IpAddr, Ipv4Addr};

    fn localhost() -> SocketAddr {
        SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 0)
    }

    #[tokio::test]
    async fn start_and_stop_server() {
        let tmp = tempfile::tempdir().unwrap();
        let mut server = start_server(core_in(tmp.path(), "ok"), localhost())
            .await
            .expect("server should start");

        assert!(!server.session.session_id.is_empty());
        assert!(server.session.port > 0);

        let url = format!("http://127.0.0.1:{}/health", server.session.port);
        let resp = reqwest::get(&url).await.unwrap();
        assert_eq!(resp.status(), reqwest::StatusCode::OK);
        let json: serde_json::Value = resp.json().await.unwrap();
        assert_eq!(json["status"], "ok");

        server.shutdown();
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
    }

    #[tokio::test]
    async fn serves_multipart_upload() {
        let tmp = tempfile::tempdir().unwrap();
        let server = start_server(core_in(tmp.path(), "ok"), localhost())
            .await
            .unwrap();
        let port = server.session.port;

        let mut png = std::io::Cursor::new(Vec::new());
        image::DynamicImage::ImageRgb8(image::RgbImage::from_pixel(
            10,
            10,
            image::Rgb([0, 0, 0]),
        ))
        .write_to(&mut png, image::ImageOutputFormat::Png)
        .unwrap();

        // Build the multipart body by hand; reqwest is compiled without its multipart feature.
        let boundary = "server-test-boundary";
        let mut body = format!(
            "--{boundary}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"x.png\"\r\nContent-Type: image/png\r\n\r\n"
        )
        .into_bytes();
        body.extend_from_slice(&png.into_inner());
        body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());

        let client = reqwest::Client::new();
        let resp = client
            .post(format!("http://127.0.0.1:{port}/diagnose"))
            .header("Content-Type", format!("multipart/form-data; boundary={boundary}"))
            .body(body)
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), reqwest::StatusCode::OK);
        let json: serde_json::Value = resp.json().await.unwrap();
        assert_eq!(json["logged"], true);

        let resp = reqwest::get(format!("http://127.0.0.1:{port}/diagnosis-log"))
            .await
            .unwrap();
        let json: serde_json::Value = resp.json().await.unwrap();
        assert_eq!(json["log"].as_array().unwrap().len(), 1);

        server.stop().await;
    }

    #[tokio::test]
    async fn unknown_route_returns_404() {
        let tmp = tempfile::tempdir().unwrap();
        let mut server = start_server(core_in(tmp.path(), "ok"), localhost())
            .await
            .unwrap();
        let url = format!("http://127.0.0.1:{}/nonexistent", server.session.port);
        let resp = reqwest::get(&url).await.unwrap();
        assert_eq!(resp.status(), reqwest::StatusCode::NOT_FOUND);
        let json: serde_json::Value = resp.json().await.unwrap();
        assert_eq!(json["error"]["code"], "NOT_FOUND");
        server.shutdown();
    }

    #[tokio::test]
    async fn shutdown_is_idempotent() {
        let tmp = tempfile::tempdir().unwrap();
        let mut server = start_server(core_in(tmp.path(), "ok"), localhost())
            .await
            .unwrap();
        server.shutdown();
        server.shutdown();
    }

    #[tokio::test]
    async fn bind_conflict_is_error() {
        let tmp = tempfile::tempdir().unwrap();
        let first = start_server(core_in(tmp.path(), "ok"), localhost())
            .await
            .unwrap();
        let taken: SocketAddr = first.session.server_addr.parse().unwrap();
        let second = start_server(core_in(tmp.path(), "ok"), taken).await;
        assert!(second.is_err());
        first.stop().await;
    }
}
