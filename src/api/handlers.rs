use axum::{
    extract::{Json, State},
    http::StatusCode,
};
use chrono::Local;
use std::time::Instant;
use crate::{
    api::models::*,
    error::Result,
    panel::Intent,
    state::AppState,
};

/// Current view model of the whole panel
pub async fn handle_get_panel(State(state): State<AppState>) -> Json<PanelResponse> {
    let panel = state.panel.lock().await;

    Json(PanelResponse {
        panel: panel.view(),
        timestamp: Local::now().to_rfc3339(),
    })
}

/// Apply one user intent and forward the resulting events to the backend
pub async fn handle_intent(
    State(state): State<AppState>,
    Json(intent): Json<Intent>,
) -> Result<Json<IntentResponse>> {
    let mut panel = state.panel.lock().await;
    let events = panel.apply_intent(Instant::now(), intent)?;

    // The optimistic change stays applied; a lost send only clears `success`.
    let mut emitted = Vec::with_capacity(events.len());
    let mut success = true;
    for event in events {
        let name = event.name();
        match state.outbound.send(event) {
            Ok(()) => emitted.push(name.to_string()),
            Err(e) => {
                tracing::error!("Backend channel closed, {} not sent: {}", name, e);
                success = false;
            }
        }
    }

    Ok(Json(IntentResponse {
        success,
        emitted,
        panel: panel.view(),
        timestamp: Local::now().to_rfc3339(),
    }))
}

/// Get current configuration
pub async fn handle_get_config(
    State(state): State<AppState>,
) -> Result<Json<ConfigResponse>> {
    let config = &state.config;

    Ok(Json(ConfigResponse {
        backend_url: config.backend.url.clone(),
        lights: config.panel.lights.clone(),
        relays: config.panel.relays.clone(),
        scenes: config.panel.scenes.clone(),
        brightness_levels: config.panel.brightness_levels.clone(),
        pages: config.panel.pages,
        timing: config.timing.clone(),
    }))
}

/// Reload configuration from file
pub async fn handle_reload_config(
    State(_state): State<AppState>,
) -> Result<(StatusCode, Json<serde_json::Value>)> {
    // Layout changes need a restart; only acknowledge for now
    tracing::info!("Configuration reload requested");

    Ok((
        StatusCode::OK,
        Json(serde_json::json!({
            "success": true,
            "message": "Configuration reload requested",
            "timestamp": Local::now().to_rfc3339(),
        })),
    ))
}

/// Health check endpoint
pub async fn handle_health(State(state): State<AppState>) -> Json<HealthResponse> {
    let connected = state.panel.lock().await.is_connected();

    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        connected,
        uptime_ms: state.started_at.elapsed().as_millis() as u64,
    })
}
