pub mod api; // HTTP router, endpoints, server lifecycle
pub mod config;
pub mod consult; // Symptom consultation + diagnosis explanation
pub mod core_state;
pub mod diagnosis; // Upload → classify → log
pub mod interactions; // Drug interaction scorer
pub mod models;
pub mod vision; // Classifier seam, preprocessing, top-1 policy

use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use crate::config::AppConfig;
use crate::core_state::CoreState;

/// Start the service and block until Ctrl-C.
pub async fn run() -> Result<(), String> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .init();

    tracing::info!("{} starting v{}", config::APP_NAME, config::APP_VERSION);

    let config = AppConfig::from_env();
    let addr = config.bind_addr();

    // The text-generation client is blocking; build it off the async workers.
    let core = tokio::task::spawn_blocking(move || CoreState::from_config(config))
        .await
        .map_err(|e| format!("Startup task failed: {e}"))?
        .map_err(|e| format!("Failed to initialize: {e}"))?;

    let server = api::start_server(Arc::new(core), addr).await?;
    tracing::info!(addr = %server.session.server_addr, "Listening");

    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for Ctrl-C: {e}");
    }

    tracing::info!("Shutting down");
    server.stop().await;
    Ok(())
}
