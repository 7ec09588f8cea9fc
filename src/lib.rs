pub mod api; // HTTP API: router, endpoints, server lifecycle
pub mod client; // Data access layer over the HTTP API
pub mod config;
pub mod core_state;
pub mod dashboard; // Weekly windows + whole-clinic breakdowns
pub mod db;
pub mod models;
pub mod notifications; // Rule-based notification feed + center
pub mod scheduling; // Double-booking checks + planning views
pub mod state; // Client-side state container

use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Debug, thiserror::Error)]
pub enum RunError {
    #[error(transparent)]
    Config(#[from] config::ConfigError),
    #[error(transparent)]
    Core(#[from] core_state::CoreError),
    #[error(transparent)]
    Server(#[from] api::ServerError),
}

/// Run the clinic API server until Ctrl-C.
pub async fn run() -> Result<(), RunError> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .init();

    tracing::info!("{} starting v{}", config::APP_NAME, config::APP_VERSION);

    let settings = config::ServerConfig::from_env()?;
    let core = Arc::new(core_state::CoreState::new(&settings.db_path)?);
    let server = api::start_api_server(core, settings.bind).await?;
    tracing::info!(url = %server.session.base_url(), "Clinic API ready");

    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Cannot listen for shutdown signal: {e}");
    }
    server.stop().await;
    Ok(())
}
