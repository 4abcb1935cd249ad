//! HTTP server lifecycle: bind → serve → graceful shutdown.

use std::sync::Arc;

use crate::api::router::api_router;
use crate::core_state::CoreState;

/// Bind `HOST:PORT` and serve until Ctrl-C.
pub async fn serve(core: Arc<CoreState>) -> std::io::Result<()> {
    let addr = core.config().bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    let local = listener.local_addr()?;

    let app = api_router(core);

    tracing::info!(%local, "Ticket copilot listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {e}");
        return;
    }
    tracing::info!("Shutdown signal received");
}
