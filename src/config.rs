use serde::{Deserialize, Serialize};
use std::collections::HashSet;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub backend: BackendConfig,
    pub server: ServerConfig,
    pub panel: PanelConfig,
    #[serde(default)]
    pub timing: TimingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Socket.IO websocket endpoint of the home-automation backend
    pub url: String,
    #[serde(default = "default_reconnect_delay_ms")]
    pub reconnect_delay_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub bind: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LightConfig {
    pub id: u32,
    pub name: String,
    /// White/red dual-channel light
    #[serde(default)]
    pub color: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PanelConfig {
    pub lights: Vec<LightConfig>,
    pub relays: Vec<String>,
    #[serde(default)]
    pub scenes: Vec<String>,
    #[serde(default = "default_brightness_levels")]
    pub brightness_levels: Vec<String>,
    pub pages: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimingConfig {
    pub sync_lock_release_ms: u64,
    pub ramp_margin_ms: u64,
    pub optimistic_lock_ms: u64,
    pub toast_duration_ms: u64,
    pub toast_fade_ms: u64,
    pub max_visible_toasts: usize,
    pub frame_interval_ms: u64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            sync_lock_release_ms: 500,
            ramp_margin_ms: 100,
            optimistic_lock_ms: 2000,
            toast_duration_ms: 5000,
            toast_fade_ms: 500,
            max_visible_toasts: 9,
            frame_interval_ms: 16,
        }
    }
}

fn default_reconnect_delay_ms() -> u64 {
    2000
}

fn default_brightness_levels() -> Vec<String> {
    vec!["low".to_string(), "medium".to_string(), "high".to_string()]
}

impl Config {
    pub fn load(path: &str) -> crate::error::Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| crate::error::ApiError::ConfigError(format!("Failed to read config: {}", e)))?;

        Self::parse(&content)
    }

    pub fn parse(content: &str) -> crate::error::Result<Self> {
        let config: Self = toml::from_str(content)
            .map_err(|e| crate::error::ApiError::ConfigError(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Load `PANEL_CLIENT_CONFIG` if set, else `config/<profile>.toml`,
    /// else the built-in layout.
    pub fn load_with_fallback(profile: &str) -> Self {
        let path = std::env::var("PANEL_CLIENT_CONFIG")
            .unwrap_or_else(|_| format!("config/{}.toml", profile));

        match Self::load(&path) {
            Ok(config) => {
                tracing::info!("Loaded configuration from {}", path);
                config
            }
            Err(e) => {
                tracing::warn!("{}; using built-in configuration", e);
                Self::default()
            }
        }
    }

    pub fn validate(&self) -> crate::error::Result<()> {
        let mut seen = HashSet::new();
        for light in &self.panel.lights {
            if !seen.insert(light.id) {
                return Err(crate::error::ApiError::ConfigError(format!(
                    "Duplicate light id {}",
                    light.id
                )));
            }
        }
        if self.panel.pages == 0 {
            return Err(crate::error::ApiError::ConfigError(
                "Panel needs at least one page".to_string(),
            ));
        }
        if self.timing.max_visible_toasts == 0 {
            return Err(crate::error::ApiError::ConfigError(
                "max_visible_toasts must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        let lights = [
            ("Kitchen", false),
            ("Lounge", false),
            ("Bedroom", true),
            ("Bathroom", false),
            ("Awning", true),
            ("Hallway", false),
            ("Reading", false),
            ("Accent", false),
        ]
        .into_iter()
        .enumerate()
        .map(|(index, (name, color))| LightConfig {
            id: index as u32 + 1,
            name: name.to_string(),
            color,
        })
        .collect();

        Self {
            backend: BackendConfig {
                url: "ws://127.0.0.1:5000/socket.io/?EIO=4&transport=websocket".to_string(),
                reconnect_delay_ms: default_reconnect_delay_ms(),
            },
            server: ServerConfig {
                bind: "127.0.0.1:8091".to_string(),
            },
            panel: PanelConfig {
                lights,
                relays: vec![
                    "water".to_string(),
                    "fridge_and_oven".to_string(),
                    "floodlights".to_string(),
                    "lighting_circuits".to_string(),
                ],
                scenes: vec![
                    "morning".to_string(),
                    "day".to_string(),
                    "evening".to_string(),
                    "night".to_string(),
                    "off".to_string(),
                ],
                brightness_levels: default_brightness_levels(),
                pages: 3,
            },
            timing: TimingConfig::default(),
        }
    }
}
