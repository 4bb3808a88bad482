use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Unknown light {0}")]
    UnknownLight(u32),

    #[error("Unknown relay {0}")]
    UnknownRelay(String),

    #[error("Unknown scene {0}")]
    UnknownScene(String),

    #[error("Unknown brightness level {0}")]
    UnknownLevel(String),

    #[error("Unknown setting {0}")]
    UnknownSetting(String),

    #[error("Interface disabled while offline")]
    InterfaceDisabled,

    #[error("Brightness controls disabled")]
    BrightnessControlsDisabled,

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self {
            ApiError::UnknownLight(_)
            | ApiError::UnknownRelay(_)
            | ApiError::UnknownScene(_)
            | ApiError::UnknownLevel(_)
            | ApiError::UnknownSetting(_) => StatusCode::BAD_REQUEST,
            ApiError::InterfaceDisabled => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::BrightnessControlsDisabled => StatusCode::CONFLICT,
            ApiError::ConfigError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(json!({
            "error": true,
            "message": self.to_string(),
            "status": status.as_u16(),
        }));

        (status, body).into_response()
    }
}

pub type Result<T> = std::result::Result<T, ApiError>;
