//! Payload shapes of backend-originated events.
//!
//! Every field is optional: a missing key means "leave that field alone",
//! an explicit `null` means "show the placeholder". Fields that distinguish
//! the two use `Option<Option<T>>` via [`present`].

use serde::{Deserialize, Deserializer};
use std::collections::HashMap;
use std::time::Duration;

/// Deserialize a key that was present in the payload, keeping `null` as
/// `Some(None)`. Paired with `#[serde(default)]` so absence yields `None`.
fn present<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Brightness as sent by the backend, rounded and clamped to 0-100.
fn level<'de, D>(deserializer: D) -> Result<Option<u8>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<f64>::deserialize(deserializer)?.map(clamp_level))
}

fn millis<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    let ms = f64::deserialize(deserializer)?;
    Ok(Duration::from_millis(ms.max(0.0).round() as u64))
}

pub(crate) fn clamp_level(value: f64) -> u8 {
    value.round().clamp(0.0, 100.0) as u8
}

/// A scalar rendered as display text. Strings, numbers and booleans are
/// all accepted since the backend is loose about which it sends.
#[derive(Debug, Clone, PartialEq)]
pub struct Text(pub String);

impl<'de> Deserialize<'de> for Text {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = serde_json::Value::deserialize(deserializer)?;
        let text = match value {
            serde_json::Value::String(s) => s,
            serde_json::Value::Number(n) => n.to_string(),
            serde_json::Value::Bool(b) => b.to_string(),
            serde_json::Value::Null => String::new(),
            other => other.to_string(),
        };
        Ok(Text(text))
    }
}

impl Text {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// One light's entry in `update_states` and `scene_ramp_start`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LightSnapshot {
    #[serde(default, deserialize_with = "level")]
    pub brightness: Option<u8>,
    #[serde(default)]
    pub active: Option<String>,
}

/// Snapshot keyed by light id. Keys arrive as strings on the wire.
#[derive(Debug, Clone, Default)]
pub struct LightStates(pub HashMap<u32, LightSnapshot>);

impl<'de> Deserialize<'de> for LightStates {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = HashMap::<String, Option<LightSnapshot>>::deserialize(deserializer)?;
        let states = raw
            .into_iter()
            .filter_map(|(key, snapshot)| {
                let id = key.trim().parse::<u32>().ok()?;
                Some((id, snapshot?))
            })
            .collect();
        Ok(LightStates(states))
    }
}

impl LightStates {
    pub fn get(&self, id: u32) -> Option<&LightSnapshot> {
        self.0.get(&id)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RampStart {
    pub light_id: u32,
    #[serde(deserialize_with = "millis")]
    pub ramp_duration: Duration,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BrightnessRampStart {
    pub light_id: u32,
    #[serde(deserialize_with = "level_required")]
    pub target_brightness: u8,
    #[serde(deserialize_with = "millis")]
    pub ramp_duration: Duration,
}

fn level_required<'de, D>(deserializer: D) -> Result<u8, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(clamp_level(f64::deserialize(deserializer)?))
}

#[derive(Debug, Clone, Deserialize)]
pub struct SceneRampStart {
    #[serde(default)]
    pub states: LightStates,
    #[serde(deserialize_with = "millis")]
    pub ramp_duration: Duration,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ActiveScene {
    #[serde(default)]
    pub scene_id: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct WeatherReport {
    #[serde(default, rename = "temp_C")]
    pub temp_c: Option<Text>,
    #[serde(default)]
    pub condition: Option<Text>,
    #[serde(default, rename = "min_temp_C")]
    pub min_temp_c: Option<Text>,
    #[serde(default, rename = "max_temp_C")]
    pub max_temp_c: Option<Text>,
    #[serde(default)]
    pub humidity: Option<Text>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GpsUpdate {
    #[serde(default, deserialize_with = "present")]
    pub date: Option<Option<Text>>,
    #[serde(default, deserialize_with = "present")]
    pub time: Option<Option<Text>>,
    #[serde(default, deserialize_with = "present")]
    pub sunrise: Option<Option<Text>>,
    #[serde(default, deserialize_with = "present")]
    pub sunset: Option<Option<Text>>,
    #[serde(default, deserialize_with = "present")]
    pub satellites: Option<Option<Text>>,
    #[serde(default, deserialize_with = "present")]
    pub location: Option<Option<Text>>,
    #[serde(default, deserialize_with = "present")]
    pub weather: Option<Option<WeatherReport>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PowerUpdate {
    #[serde(default, deserialize_with = "present")]
    pub battery: Option<Option<f64>>,
    #[serde(default)]
    pub battery_pct: Option<f64>,
    #[serde(default, deserialize_with = "present")]
    pub water: Option<Option<f64>>,
    #[serde(default, deserialize_with = "present")]
    pub solar: Option<Option<f64>>,
    #[serde(default, deserialize_with = "present")]
    pub load: Option<Option<f64>>,
    #[serde(default, deserialize_with = "present")]
    pub phase: Option<Option<String>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PhaseUpdate {
    #[serde(default)]
    pub phase: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ToastRequest {
    pub message: Text,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
}

/// Partial settings bag from `update_settings`. The backend sends its
/// whole config dictionary, so unknown keys are ignored.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SettingsPatch {
    #[serde(default)]
    pub dark_mode: Option<bool>,
    #[serde(default)]
    pub auto_theme: Option<bool>,
    #[serde(default)]
    pub auto_brightness: Option<bool>,
    #[serde(default)]
    pub brightness: Option<String>,
    #[serde(default)]
    pub evening_offset: Option<serde_json::Value>,
    #[serde(default)]
    pub sunrise_offset: Option<serde_json::Value>,
    #[serde(default)]
    pub night_time: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ControlsEnabled {
    pub enabled: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BrightnessLevel {
    pub level: String,
}
