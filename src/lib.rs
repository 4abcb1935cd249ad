pub mod api;
pub mod config;
pub mod core_state;
pub mod pipeline;
pub mod ticket_log;

use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Start the service: logging, configuration, corpus, HTTP server.
pub async fn run() -> std::io::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .init();

    tracing::info!("{} starting v{}", config::APP_NAME, config::APP_VERSION);

    let config = config::AppConfig::from_env();
    let core = Arc::new(core_state::CoreState::from_config(config));
    tracing::info!(
        procedures = core.corpus().map(|c| c.len()).unwrap_or_default(),
        source = %core.corpus_source(),
        "Procedure corpus ready"
    );

    api::serve(core).await
}
