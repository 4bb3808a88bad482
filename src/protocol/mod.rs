//! Named events exchanged with the home-automation backend.

pub mod payloads;
pub mod wire;

use serde_json::{json, Value};

use payloads::*;
pub use wire::WireError;

/// Events the panel sends to the backend.
#[derive(Debug, Clone, PartialEq)]
pub enum ClientEvent {
    SetSetting { key: String, value: Value },
    SetBrightness { light_id: u32, value: u8 },
    ToggleColor { light_id: u32 },
    RampBrightness { light_id: u32, target: u8 },
    SetRelay { name: String, state: bool },
    ApplyScene { scene_id: String },
    SetBrightnessLevel { level: String },
}

impl ClientEvent {
    pub fn name(&self) -> &'static str {
        match self {
            ClientEvent::SetSetting { .. } => "set_setting",
            ClientEvent::SetBrightness { .. } => "set_brightness",
            ClientEvent::ToggleColor { .. } => "toggle_color",
            ClientEvent::RampBrightness { .. } => "ramp_brightness",
            ClientEvent::SetRelay { .. } => "set_relay",
            ClientEvent::ApplyScene { .. } => "apply_scene",
            ClientEvent::SetBrightnessLevel { .. } => "set_brightness_level",
        }
    }

    pub fn payload(&self) -> Value {
        match self {
            ClientEvent::SetSetting { key, value } => json!({"key": key, "value": value}),
            ClientEvent::SetBrightness { light_id, value } => {
                json!({"light_id": light_id, "value": value})
            }
            ClientEvent::ToggleColor { light_id } => json!({"light_id": light_id}),
            ClientEvent::RampBrightness { light_id, target } => {
                json!({"light_id": light_id, "target": target})
            }
            ClientEvent::SetRelay { name, state } => json!({"name": name, "state": state}),
            ClientEvent::ApplyScene { scene_id } => json!({"scene_id": scene_id}),
            ClientEvent::SetBrightnessLevel { level } => json!({"level": level}),
        }
    }
}

/// Events pushed by the backend, plus the transport's own
/// connect/disconnect notifications.
#[derive(Debug, Clone)]
pub enum ServerEvent {
    Connect,
    Disconnect,
    UpdateStates(LightStates),
    RampStart(RampStart),
    BrightnessRampStart(BrightnessRampStart),
    SceneRampStart(SceneRampStart),
    SetActiveScene(ActiveScene),
    UpdateGps(GpsUpdate),
    UpdateRelays(std::collections::HashMap<String, bool>),
    UpdateSensors(std::collections::HashMap<String, bool>),
    UpdatePower(PowerUpdate),
    UpdatePhase(PhaseUpdate),
    ShowToast(ToastRequest),
    UpdateSettings(SettingsPatch),
    SetBrightnessControlsEnabled(ControlsEnabled),
    UpdateBrightnessLevel(BrightnessLevel),
}

impl ServerEvent {
    /// Decode a named event. Unknown names yield `Ok(None)`.
    pub fn decode(name: &str, payload: Value) -> Result<Option<Self>, WireError> {
        fn parse<T: serde::de::DeserializeOwned>(name: &str, payload: Value) -> Result<T, WireError> {
            serde_json::from_value(payload).map_err(|e| WireError::Payload {
                event: name.to_string(),
                reason: e.to_string(),
            })
        }

        let event = match name {
            "connect" => ServerEvent::Connect,
            "disconnect" => ServerEvent::Disconnect,
            "update_states" => ServerEvent::UpdateStates(parse(name, payload)?),
            "ramp_start" => ServerEvent::RampStart(parse(name, payload)?),
            "brightness_ramp_start" => ServerEvent::BrightnessRampStart(parse(name, payload)?),
            "scene_ramp_start" => ServerEvent::SceneRampStart(parse(name, payload)?),
            "set_active_scene" => ServerEvent::SetActiveScene(parse(name, payload)?),
            "update_gps" => ServerEvent::UpdateGps(parse(name, payload)?),
            "update_relays" => ServerEvent::UpdateRelays(parse_flags(name, payload)?),
            "update_sensors" => ServerEvent::UpdateSensors(parse_flags(name, payload)?),
            "update_power" => ServerEvent::UpdatePower(parse(name, payload)?),
            "update_phase" => ServerEvent::UpdatePhase(parse(name, payload)?),
            "show_toast" => ServerEvent::ShowToast(parse(name, payload)?),
            "update_settings" => ServerEvent::UpdateSettings(parse(name, payload)?),
            "set_brightness_controls_enabled" => {
                ServerEvent::SetBrightnessControlsEnabled(parse(name, payload)?)
            }
            "update_brightness_level" => ServerEvent::UpdateBrightnessLevel(parse(name, payload)?),
            _ => return Ok(None),
        };
        Ok(Some(event))
    }

    pub fn name(&self) -> &'static str {
        match self {
            ServerEvent::Connect => "connect",
            ServerEvent::Disconnect => "disconnect",
            ServerEvent::UpdateStates(_) => "update_states",
            ServerEvent::RampStart(_) => "ramp_start",
            ServerEvent::BrightnessRampStart(_) => "brightness_ramp_start",
            ServerEvent::SceneRampStart(_) => "scene_ramp_start",
            ServerEvent::SetActiveScene(_) => "set_active_scene",
            ServerEvent::UpdateGps(_) => "update_gps",
            ServerEvent::UpdateRelays(_) => "update_relays",
            ServerEvent::UpdateSensors(_) => "update_sensors",
            ServerEvent::UpdatePower(_) => "update_power",
            ServerEvent::UpdatePhase(_) => "update_phase",
            ServerEvent::ShowToast(_) => "show_toast",
            ServerEvent::UpdateSettings(_) => "update_settings",
            ServerEvent::SetBrightnessControlsEnabled(_) => "set_brightness_controls_enabled",
            ServerEvent::UpdateBrightnessLevel(_) => "update_brightness_level",
        }
    }
}

/// Relay and sensor maps: non-boolean values are dropped instead of
/// failing the whole update.
fn parse_flags(
    name: &str,
    payload: Value,
) -> Result<std::collections::HashMap<String, bool>, WireError> {
    match payload {
        Value::Object(map) => Ok(map
            .into_iter()
            .filter_map(|(key, value)| value.as_bool().map(|flag| (key, flag)))
            .collect()),
        other => Err(WireError::Payload {
            event: name.to_string(),
            reason: format!("expected an object, got {}", other),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_event_payloads_match_backend_handlers() {
        let event = ClientEvent::RampBrightness { light_id: 3, target: 100 };
        assert_eq!(event.name(), "ramp_brightness");
        assert_eq!(event.payload(), json!({"light_id": 3, "target": 100}));

        let event = ClientEvent::SetSetting {
            key: "evening_offset".to_string(),
            value: json!("30"),
        };
        assert_eq!(event.payload(), json!({"key": "evening_offset", "value": "30"}));
    }

    #[test]
    fn unknown_events_are_ignored() {
        let decoded = ServerEvent::decode("update_weather_radar", json!({})).unwrap();
        assert!(decoded.is_none());
    }

    #[test]
    fn relay_map_drops_non_boolean_values() {
        let decoded = ServerEvent::decode(
            "update_relays",
            json!({"water": true, "floodlights": null, "fridge_and_oven": false}),
        )
        .unwrap();

        match decoded {
            Some(ServerEvent::UpdateRelays(relays)) => {
                assert_eq!(relays.len(), 2);
                assert_eq!(relays.get("water"), Some(&true));
                assert_eq!(relays.get("fridge_and_oven"), Some(&false));
            }
            other => panic!("unexpected decode: {:?}", other),
        }
    }

    #[test]
    fn malformed_payload_is_an_error() {
        let result = ServerEvent::decode("brightness_ramp_start", json!({"light_id": "two"}));
        assert!(matches!(result, Err(WireError::Payload { .. })));
    }
}
