//! User input from the renderer and the optimistic updates it causes.

use serde::Deserialize;
use serde_json::Value;
use std::time::{Duration, Instant};

use super::control::ColorMode;
use super::pager::Release;
use super::settings::Settings;
use super::{LockTimer, Panel};
use crate::error::{ApiError, Result};
use crate::protocol::ClientEvent;
use crate::panel::toast::ToastId;

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Intent {
    SliderPointerDown { light_id: u32 },
    PointerUp,
    SliderInput { light_id: u32, value: u8 },
    Toggle { light_id: u32, checked: bool },
    RelayToggle { name: String, state: bool },
    SceneClick {
        #[serde(default)]
        scene_id: Option<String>,
    },
    BrightnessLevelClick { level: String },
    SetSetting { key: String, value: Value },
    DragStart { x: f64, time_ms: f64, width: f64 },
    DragMove { x: f64, time_ms: f64 },
    DragEnd,
    DotClick { index: usize },
    ToastClick { id: ToastId },
}

impl Intent {
    /// Intents that reach the control surface, which is disabled offline.
    fn touches_controls(&self) -> bool {
        matches!(
            self,
            Intent::SliderPointerDown { .. }
                | Intent::SliderInput { .. }
                | Intent::Toggle { .. }
                | Intent::RelayToggle { .. }
                | Intent::SceneClick { .. }
                | Intent::BrightnessLevelClick { .. }
                | Intent::SetSetting { .. }
        )
    }
}

impl Panel {
    /// Apply one user intent and return the events to send to the backend.
    pub fn apply_intent(&mut self, now: Instant, intent: Intent) -> Result<Vec<ClientEvent>> {
        if intent.touches_controls() && !self.connection.interface_enabled {
            return Err(ApiError::InterfaceDisabled);
        }
        tracing::debug!("Applying intent {:?}", intent);

        match intent {
            Intent::SliderPointerDown { light_id } => {
                let control = self
                    .controls
                    .get_mut(&light_id)
                    .ok_or(ApiError::UnknownLight(light_id))?;
                control.set_sync_lock(true);
                self.sync_generation += 1;
                Ok(Vec::new())
            }
            Intent::PointerUp => {
                let at = now + Duration::from_millis(self.timing.sync_lock_release_ms);
                self.timers.schedule(
                    at,
                    LockTimer::ReleaseSyncLocks {
                        generation: self.sync_generation,
                    },
                );
                Ok(Vec::new())
            }
            Intent::SliderInput { light_id, value } => self.slider_input(light_id, value),
            Intent::Toggle { light_id, checked } => self.toggle(now, light_id, checked),
            Intent::RelayToggle { name, state } => {
                let relay = self
                    .relays
                    .iter_mut()
                    .find(|relay| relay.name == name)
                    .ok_or_else(|| ApiError::UnknownRelay(name.clone()))?;
                relay.on = state;
                Ok(vec![ClientEvent::SetRelay { name, state }])
            }
            Intent::SceneClick { scene_id } => self.scene_click(now, scene_id),
            Intent::BrightnessLevelClick { level } => {
                if !self.brightness_controls_enabled {
                    return Err(ApiError::BrightnessControlsDisabled);
                }
                if !self.brightness_levels.contains(&level) {
                    return Err(ApiError::UnknownLevel(level));
                }
                self.active_level = Some(level.clone());
                Ok(vec![ClientEvent::SetBrightnessLevel { level }])
            }
            Intent::SetSetting { key, value } => {
                if !Settings::is_known_key(&key) {
                    return Err(ApiError::UnknownSetting(key));
                }
                if key == "dark_mode" {
                    if let Some(dark) = value.as_bool() {
                        self.settings.dark_mode = dark;
                    }
                }
                Ok(vec![ClientEvent::SetSetting { key, value }])
            }
            Intent::DragStart { x, time_ms, width } => {
                self.pager.start(x, time_ms, width);
                Ok(Vec::new())
            }
            Intent::DragMove { x, time_ms } => {
                self.pager.move_to(x, time_ms);
                Ok(Vec::new())
            }
            Intent::DragEnd => {
                let release = self.pager.end();
                if release != Release::SnapBack {
                    tracing::debug!("Paged to {}", self.pager.current());
                }
                Ok(Vec::new())
            }
            Intent::DotClick { index } => {
                self.pager.go_to(index);
                Ok(Vec::new())
            }
            Intent::ToastClick { id } => {
                self.toasts.click(now, id);
                Ok(Vec::new())
            }
        }
    }

    fn slider_input(&mut self, light_id: u32, value: u8) -> Result<Vec<ClientEvent>> {
        let control = self
            .controls
            .get_mut(&light_id)
            .ok_or(ApiError::UnknownLight(light_id))?;

        // The finger wins over an animation still in flight.
        if let Some(ramp) = control.cancel_ramp() {
            if let Some(generation) = ramp.lock_generation {
                control.release_lock(generation);
            }
        }
        control.set_brightness(value);
        let value = control.brightness();

        self.clear_highlights();
        Ok(vec![ClientEvent::SetBrightness { light_id, value }])
    }

    fn toggle(&mut self, now: Instant, light_id: u32, checked: bool) -> Result<Vec<ClientEvent>> {
        let control = self
            .controls
            .get_mut(&light_id)
            .ok_or(ApiError::UnknownLight(light_id))?;

        if control.is_color() {
            // Swapping color on a dark light doesn't change the scene.
            let dark = control.brightness() == 0;
            control.set_color(if checked { ColorMode::Red } else { ColorMode::White });
            if !dark {
                self.clear_highlights();
            }
            self.lock_optimistically(now, light_id);
            Ok(vec![ClientEvent::ToggleColor { light_id }])
        } else {
            control.set_on(checked);
            self.clear_highlights();
            self.lock_optimistically(now, light_id);
            Ok(vec![ClientEvent::RampBrightness {
                light_id,
                target: if checked { 100 } else { 0 },
            }])
        }
    }

    fn scene_click(&mut self, now: Instant, scene_id: Option<String>) -> Result<Vec<ClientEvent>> {
        if let Some(scene_id) = &scene_id {
            if !self.scenes.contains(scene_id) {
                return Err(ApiError::UnknownScene(scene_id.clone()));
            }
        }

        self.active_scene = None;
        let Some(scene_id) = scene_id else {
            return Ok(Vec::new());
        };

        let ids: Vec<u32> = self.controls.keys().copied().collect();
        for light_id in ids {
            self.lock_optimistically(now, light_id);
        }
        tracing::info!("Applying scene {}", scene_id);
        Ok(vec![ClientEvent::ApplyScene { scene_id }])
    }
}
