use serde::{Deserialize, Serialize};
use std::time::Instant;

use super::ramp::Ramp;
use crate::config::LightConfig;
use crate::protocol::payloads::LightSnapshot;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorMode {
    White,
    Red,
}

impl ColorMode {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "white" => Some(ColorMode::White),
            "red" => Some(ColorMode::Red),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ColorMode::White => "White",
            ColorMode::Red => "Red",
        }
    }
}

/// One dimmable light on the panel.
///
/// `lock` is held while a server-driven ramp is expected or running;
/// `sync_lock` only while the slider is being dragged. Either one makes
/// the control ignore `update_states`.
#[derive(Debug, Clone)]
pub struct Control {
    pub id: u32,
    pub name: String,
    brightness: u8,
    on: bool,
    color: Option<ColorMode>,
    lock: Option<u64>,
    lock_generation: u64,
    sync_lock: bool,
    ramp: Option<Ramp>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ControlView {
    pub id: u32,
    pub name: String,
    pub brightness: u8,
    pub percentage: String,
    /// On/off for plain lights, red mode for color lights
    pub toggle: bool,
    pub lit: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color_mode: Option<ColorMode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color_label: Option<&'static str>,
    pub locked: bool,
    pub sync_locked: bool,
    pub ramping: bool,
}

impl Control {
    pub fn new(config: &LightConfig) -> Self {
        Self {
            id: config.id,
            name: config.name.clone(),
            brightness: 0,
            on: false,
            color: config.color.then_some(ColorMode::White),
            lock: None,
            lock_generation: 0,
            sync_lock: false,
            ramp: None,
        }
    }

    pub fn brightness(&self) -> u8 {
        self.brightness
    }

    pub fn is_color(&self) -> bool {
        self.color.is_some()
    }

    pub fn color(&self) -> Option<ColorMode> {
        self.color
    }

    pub fn toggle(&self) -> bool {
        match self.color {
            Some(mode) => mode == ColorMode::Red,
            None => self.on,
        }
    }

    pub fn is_locked(&self) -> bool {
        self.lock.is_some()
    }

    pub fn is_sync_locked(&self) -> bool {
        self.sync_lock
    }

    pub fn is_ramping(&self) -> bool {
        self.ramp.is_some()
    }

    pub fn accepts_push(&self) -> bool {
        !self.is_locked() && !self.sync_lock
    }

    /// Take the lock under a fresh generation. Releases scheduled for an
    /// older generation become no-ops.
    pub fn acquire_lock(&mut self) -> u64 {
        self.lock_generation += 1;
        self.lock = Some(self.lock_generation);
        self.lock_generation
    }

    pub fn lock_generation(&self) -> Option<u64> {
        self.lock
    }

    pub fn release_lock(&mut self, generation: u64) -> bool {
        if self.lock == Some(generation) {
            self.lock = None;
            true
        } else {
            false
        }
    }

    pub fn set_sync_lock(&mut self, held: bool) {
        self.sync_lock = held;
    }

    /// Local slider movement: value, derived toggle and lit state.
    pub fn set_brightness(&mut self, value: u8) {
        self.brightness = value.min(100);
        if self.color.is_none() {
            self.on = self.brightness > 0;
        }
    }

    pub fn set_on(&mut self, on: bool) {
        self.on = on;
    }

    pub fn set_color(&mut self, mode: ColorMode) {
        if self.color.is_some() {
            self.color = Some(mode);
        }
    }

    /// Adopt an authoritative snapshot. Missing fields leave the current
    /// value in place.
    pub fn apply_snapshot(&mut self, snapshot: &LightSnapshot) {
        if let Some(brightness) = snapshot.brightness {
            self.set_brightness(brightness);
        }
        if self.color.is_some() {
            if let Some(mode) = snapshot.active.as_deref().and_then(ColorMode::from_name) {
                self.color = Some(mode);
            }
        }
    }

    /// Start a ramp from the currently displayed value, replacing any
    /// ramp still in flight.
    pub fn start_ramp(&mut self, mut ramp: Ramp) -> Option<Ramp> {
        if let (Some(target), Some(current)) = (ramp.deferred_color, self.color) {
            if target == current {
                ramp.deferred_color = None;
            }
        }
        self.ramp.replace(ramp)
    }

    pub fn cancel_ramp(&mut self) -> Option<Ramp> {
        self.ramp.take()
    }

    /// Advance the running ramp. Returns true when it landed on this tick.
    pub fn advance_ramp(&mut self, now: Instant) -> bool {
        let Some(ramp) = self.ramp.as_ref() else {
            return false;
        };

        let value = ramp.value_at(now);
        let follow_toggle = ramp.follow_toggle;
        self.brightness = value;
        if follow_toggle && self.color.is_none() {
            self.on = value > 0;
        }

        if !ramp.is_complete(now) {
            return false;
        }

        if let Some(ramp) = self.ramp.take() {
            if let Some(mode) = ramp.deferred_color {
                self.set_color(mode);
            }
            if let Some(generation) = ramp.lock_generation {
                self.release_lock(generation);
            }
        }
        true
    }

    pub fn view(&self) -> ControlView {
        ControlView {
            id: self.id,
            name: self.name.clone(),
            brightness: self.brightness,
            percentage: format!("{}%", self.brightness),
            toggle: self.toggle(),
            lit: self.brightness > 0,
            color_mode: self.color,
            color_label: self.color.map(ColorMode::label),
            locked: self.is_locked(),
            sync_locked: self.sync_lock,
            ramping: self.is_ramping(),
        }
    }
}
