pub mod api;
pub mod config;
pub mod error;
pub mod frames;
pub mod panel;
pub mod protocol;
pub mod state;
pub mod transport;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

/// Renderer-facing HTTP surface.
pub fn router(state: state::AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(api::handlers::handle_health))

        // Panel view model and user input
        .route("/api/v1/panel", get(api::handlers::handle_get_panel))
        .route("/api/v1/intents", post(api::handlers::handle_intent))
        .route("/api/v1/config", get(api::handlers::handle_get_config))
        .route("/api/v1/config/reload", post(api::handlers::handle_reload_config))

        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
