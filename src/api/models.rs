use serde::Serialize;

use crate::config::{LightConfig, TimingConfig};
use crate::panel::PanelView;

// Reply to an applied intent
#[derive(Debug, Serialize)]
pub struct IntentResponse {
    pub success: bool,
    /// Backend events queued by this intent
    pub emitted: Vec<String>,
    pub panel: PanelView,
    pub timestamp: String,
}

#[derive(Debug, Serialize)]
pub struct PanelResponse {
    pub panel: PanelView,
    pub timestamp: String,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub connected: bool,
    pub uptime_ms: u64,
}

#[derive(Debug, Serialize)]
pub struct ConfigResponse {
    pub backend_url: String,
    pub lights: Vec<LightConfig>,
    pub relays: Vec<String>,
    pub scenes: Vec<String>,
    pub brightness_levels: Vec<String>,
    pub pages: usize,
    pub timing: TimingConfig,
}
