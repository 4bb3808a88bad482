//! Client-side state of the control panel.
//!
//! [`Panel`] is a single-threaded state machine: every input (backend
//! event, user intent, frame tick) is applied with an explicit `now`, so
//! the whole lock/ramp/toast timeline is deterministic under test.

pub mod control;
pub mod intent;
pub mod pager;
pub mod ramp;
pub mod settings;
pub mod sync;
pub mod telemetry;
pub mod timers;
pub mod toast;

use serde::Serialize;
use std::collections::BTreeMap;
use std::time::{Duration, Instant};

use crate::config::{Config, TimingConfig};
use control::{Control, ControlView};
use pager::{Pager, PagerView};
use settings::Settings;
use telemetry::Telemetry;
use timers::TimerQueue;
use toast::{ToastId, ToastView, Toaster};

pub use intent::Intent;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Relay {
    pub name: String,
    pub on: bool,
}

#[derive(Debug)]
enum LockTimer {
    ReleaseSyncLocks { generation: u64 },
    ReleaseLock { light_id: u32, generation: u64 },
}

#[derive(Debug)]
struct Connection {
    connected: bool,
    has_connected: bool,
    interface_enabled: bool,
    offline_toast: Option<ToastId>,
}

pub struct Panel {
    timing: TimingConfig,
    controls: BTreeMap<u32, Control>,
    relays: Vec<Relay>,
    sensors: BTreeMap<String, bool>,
    scenes: Vec<String>,
    active_scene: Option<String>,
    brightness_levels: Vec<String>,
    active_level: Option<String>,
    brightness_controls_enabled: bool,
    settings: Settings,
    telemetry: Telemetry,
    toasts: Toaster,
    pager: Pager,
    connection: Connection,
    sync_generation: u64,
    timers: TimerQueue<LockTimer>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ButtonView {
    pub id: String,
    pub active: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct PanelView {
    pub connected: bool,
    pub interface_enabled: bool,
    pub theme: &'static str,
    pub controls: Vec<ControlView>,
    pub relays: Vec<Relay>,
    pub sensors: BTreeMap<String, bool>,
    pub scenes: Vec<ButtonView>,
    pub brightness_levels: Vec<ButtonView>,
    pub brightness_controls_enabled: bool,
    pub settings: Settings,
    pub telemetry: Telemetry,
    pub toasts: Vec<ToastView>,
    pub queued_toasts: usize,
    pub pager: PagerView,
}

impl Panel {
    pub fn new(config: &Config) -> Self {
        let timing = config.timing.clone();
        let toasts = Toaster::new(
            timing.max_visible_toasts,
            Duration::from_millis(timing.toast_duration_ms),
            Duration::from_millis(timing.toast_fade_ms),
        );

        Self {
            controls: config
                .panel
                .lights
                .iter()
                .map(|light| (light.id, Control::new(light)))
                .collect(),
            relays: config
                .panel
                .relays
                .iter()
                .map(|name| Relay {
                    name: name.clone(),
                    on: false,
                })
                .collect(),
            sensors: BTreeMap::new(),
            scenes: config.panel.scenes.clone(),
            active_scene: None,
            brightness_levels: config.panel.brightness_levels.clone(),
            active_level: None,
            brightness_controls_enabled: true,
            settings: Settings::default(),
            telemetry: Telemetry::default(),
            toasts,
            pager: Pager::new(config.panel.pages),
            connection: Connection {
                connected: false,
                has_connected: false,
                interface_enabled: true,
                offline_toast: None,
            },
            sync_generation: 0,
            timers: TimerQueue::default(),
            timing,
        }
    }

    /// One display frame: advance ramps, then fire due timers.
    pub fn tick(&mut self, now: Instant) {
        for control in self.controls.values_mut() {
            if control.advance_ramp(now) {
                tracing::debug!(
                    "Ramp finished for light {} at {}%",
                    control.id,
                    control.brightness()
                );
            }
        }

        while let Some((_, timer)) = self.timers.pop_due(now) {
            match timer {
                LockTimer::ReleaseSyncLocks { generation } => {
                    if generation == self.sync_generation {
                        for control in self.controls.values_mut() {
                            control.set_sync_lock(false);
                        }
                    }
                }
                LockTimer::ReleaseLock {
                    light_id,
                    generation,
                } => {
                    if let Some(control) = self.controls.get_mut(&light_id) {
                        if control.release_lock(generation) {
                            tracing::debug!("Lock on light {} released by timeout", light_id);
                        }
                    }
                }
            }
        }

        self.toasts.tick(now);
    }

    fn ramp_margin(&self) -> Duration {
        Duration::from_millis(self.timing.ramp_margin_ms)
    }

    /// Schedule the fallback release of the lock a control currently holds.
    fn schedule_lock_release(&mut self, light_id: u32, generation: u64, at: Instant) {
        self.timers
            .schedule(at, LockTimer::ReleaseLock { light_id, generation });
    }

    /// Optimistic lock ahead of a server-side ramp the panel has asked for.
    fn lock_optimistically(&mut self, now: Instant, light_id: u32) {
        let fallback = Duration::from_millis(self.timing.optimistic_lock_ms) + self.ramp_margin();
        if let Some(control) = self.controls.get_mut(&light_id) {
            let generation = control.acquire_lock();
            self.schedule_lock_release(light_id, generation, now + fallback);
        }
    }

    /// Manual light changes drop the scene and level highlighting; the
    /// backend re-asserts whatever still applies.
    fn clear_highlights(&mut self) {
        self.active_scene = None;
        self.active_level = None;
    }

    pub fn control(&self, id: u32) -> Option<&Control> {
        self.controls.get(&id)
    }

    pub fn controls(&self) -> impl Iterator<Item = &Control> {
        self.controls.values()
    }

    pub fn relay(&self, name: &str) -> Option<&Relay> {
        self.relays.iter().find(|relay| relay.name == name)
    }

    pub fn active_scene(&self) -> Option<&str> {
        self.active_scene.as_deref()
    }

    pub fn active_level(&self) -> Option<&str> {
        self.active_level.as_deref()
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn telemetry(&self) -> &Telemetry {
        &self.telemetry
    }

    pub fn toasts(&self) -> &Toaster {
        &self.toasts
    }

    pub fn pager(&self) -> &Pager {
        &self.pager
    }

    pub fn is_connected(&self) -> bool {
        self.connection.connected
    }

    pub fn is_interface_enabled(&self) -> bool {
        self.connection.interface_enabled
    }

    pub fn view(&self) -> PanelView {
        PanelView {
            connected: self.connection.connected,
            interface_enabled: self.connection.interface_enabled,
            theme: self.settings.theme(),
            controls: self.controls.values().map(Control::view).collect(),
            relays: self.relays.clone(),
            sensors: self.sensors.clone(),
            scenes: self
                .scenes
                .iter()
                .map(|id| ButtonView {
                    id: id.clone(),
                    active: self.active_scene.as_deref() == Some(id.as_str()),
                })
                .collect(),
            brightness_levels: self
                .brightness_levels
                .iter()
                .map(|id| ButtonView {
                    id: id.clone(),
                    active: self.active_level.as_deref() == Some(id.as_str()),
                })
                .collect(),
            brightness_controls_enabled: self.brightness_controls_enabled,
            settings: self.settings.clone(),
            telemetry: self.telemetry.clone(),
            toasts: self.toasts.views(),
            queued_toasts: self.toasts.queued(),
            pager: self.pager.view(),
        }
    }
}
