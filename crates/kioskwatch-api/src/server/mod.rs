//! HTTP server for the KioskWatch collector.

pub mod router;
pub mod state;

pub use router::{cors_layer, create_router};
pub use state::AppState;

use tokio::net::TcpListener;

use kioskwatch_core::RegistryConfig;

/// Start the collector and serve until Ctrl+C or SIGTERM.
pub async fn run(config: RegistryConfig) -> anyhow::Result<()> {
    config.validate()?;

    let bind = config.server.bind_addr()?;
    let listener = TcpListener::bind(bind).await?;
    serve(listener, config).await
}

/// Serve on an already bound listener.
pub async fn serve(listener: TcpListener, config: RegistryConfig) -> anyhow::Result<()> {
    let store = kioskwatch_storage::create_store(&config.store)?;
    let state = AppState::new(store, &config.auth);
    let api_key = if state.auth.is_enabled() { "(set)" } else { "(not set)" };

    tracing::info!(
        category = "server",
        backend = %state.backend,
        persistent = state.persistent,
        api_key,
        cors = config.server.cors,
        "Collector configured"
    );

    let app = create_router(state, &config.server);
    let addr = listener.local_addr()?;
    tracing::info!(category = "server", "Listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(crate::shutdown::shutdown_signal())
        .await?;

    tracing::info!(category = "server", "Server shutdown complete");
    Ok(())
}
