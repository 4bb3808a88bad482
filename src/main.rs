use anyhow::Context;
use panel_client::{config, frames, panel::Panel, state, transport};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{mpsc, Mutex};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("panel_client=debug".parse()?),
        )
        .init();

    tracing::info!("Starting control panel client");

    // Override via PANEL_CLIENT_CONFIG env var if needed
    let config = Arc::new(config::Config::load_with_fallback("panel"));

    let panel = Arc::new(Mutex::new(Panel::new(&config)));
    let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();

    let state = state::AppState {
        config: Arc::clone(&config),
        panel: Arc::clone(&panel),
        outbound: outbound_tx,
        started_at: Instant::now(),
    };

    // Backend websocket session, reconnecting forever
    tokio::spawn(transport::run(
        config.backend.clone(),
        Arc::clone(&panel),
        outbound_rx,
    ));

    // Ramp animation and timer tick
    tokio::spawn(frames::run(
        Arc::clone(&panel),
        Duration::from_millis(config.timing.frame_interval_ms),
    ));

    let app = panel_client::router(state);

    let listener = tokio::net::TcpListener::bind(&config.server.bind)
        .await
        .with_context(|| format!("Failed to bind to {}", config.server.bind))?;

    tracing::info!("Panel API listening on http://{}", config.server.bind);
    tracing::info!("View model: GET /api/v1/panel");
    tracing::info!("User input: POST /api/v1/intents");

    axum::serve(listener, app).await?;
    Ok(())
}
