use serde::Serialize;
use serde_json::Value;

use crate::protocol::payloads::SettingsPatch;

/// Keys the settings panel may propose to the backend.
pub const SETTING_KEYS: &[&str] = &[
    "dark_mode",
    "auto_theme",
    "auto_brightness",
    "evening_offset",
    "sunrise_offset",
    "night_time",
];

/// Mirror of the backend's settings. Only `update_settings` writes here,
/// except for the theme which switches as soon as it is toggled.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Settings {
    pub dark_mode: bool,
    pub auto_theme: bool,
    pub auto_brightness: bool,
    pub evening_offset: Option<Value>,
    pub sunrise_offset: Option<Value>,
    pub night_time: Option<Value>,
}

impl Settings {
    pub fn apply(&mut self, patch: &SettingsPatch) {
        if let Some(dark_mode) = patch.dark_mode {
            self.dark_mode = dark_mode;
        }
        if let Some(auto_theme) = patch.auto_theme {
            self.auto_theme = auto_theme;
        }
        if let Some(auto_brightness) = patch.auto_brightness {
            self.auto_brightness = auto_brightness;
        }
        if let Some(offset) = &patch.evening_offset {
            self.evening_offset = Some(offset.clone());
        }
        if let Some(offset) = &patch.sunrise_offset {
            self.sunrise_offset = Some(offset.clone());
        }
        if let Some(night_time) = &patch.night_time {
            self.night_time = Some(night_time.clone());
        }
    }

    pub fn theme(&self) -> &'static str {
        if self.dark_mode {
            "dark"
        } else {
            "light"
        }
    }

    pub fn is_known_key(key: &str) -> bool {
        SETTING_KEYS.contains(&key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn partial_patch_only_touches_present_keys() {
        let mut settings = Settings {
            auto_theme: true,
            evening_offset: Some(json!(30)),
            ..Settings::default()
        };

        let patch: SettingsPatch =
            serde_json::from_value(json!({"dark_mode": true, "gamma": 2.5, "night_time": "23:00"}))
                .unwrap();
        settings.apply(&patch);

        assert!(settings.dark_mode);
        assert!(settings.auto_theme);
        assert_eq!(settings.evening_offset, Some(json!(30)));
        assert_eq!(settings.night_time, Some(json!("23:00")));
        assert_eq!(settings.theme(), "dark");
    }

    #[test]
    fn only_panel_keys_are_proposable() {
        assert!(Settings::is_known_key("sunrise_offset"));
        assert!(!Settings::is_known_key("gamma"));
    }
}
