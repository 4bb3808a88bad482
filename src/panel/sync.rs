//! Backend pushes: reconciliation, ramp instructions, telemetry and the
//! connection lifecycle.

use std::time::Instant;

use super::control::ColorMode;
use super::ramp::Ramp;
use super::toast::ToastKind;
use super::Panel;
use crate::protocol::payloads::{BrightnessRampStart, LightStates, RampStart, SceneRampStart};
use crate::protocol::ServerEvent;

impl Panel {
    pub fn apply_server_event(&mut self, now: Instant, event: ServerEvent) {
        tracing::debug!("Handling backend event {}", event.name());

        match event {
            ServerEvent::Connect => self.on_connect(now),
            ServerEvent::Disconnect => self.on_disconnect(now),
            ServerEvent::UpdateStates(states) => self.reconcile(&states),
            ServerEvent::RampStart(ramp) => self.on_ramp_start(now, &ramp),
            ServerEvent::BrightnessRampStart(ramp) => self.on_brightness_ramp(now, &ramp),
            ServerEvent::SceneRampStart(ramp) => self.on_scene_ramp(now, &ramp),
            ServerEvent::SetActiveScene(scene) => {
                self.active_scene = scene
                    .scene_id
                    .filter(|id| self.scenes.iter().any(|known| known == id));
            }
            ServerEvent::UpdateGps(gps) => self.telemetry.apply_gps(&gps),
            ServerEvent::UpdateRelays(states) => {
                for relay in &mut self.relays {
                    if let Some(on) = states.get(&relay.name) {
                        relay.on = *on;
                    }
                }
            }
            ServerEvent::UpdateSensors(states) => self.sensors.extend(states),
            ServerEvent::UpdatePower(power) => self.telemetry.apply_power(&power),
            ServerEvent::UpdatePhase(phase) => self.telemetry.apply_phase(phase.phase.as_deref()),
            ServerEvent::ShowToast(toast) => {
                let type_name = toast
                    .kind
                    .as_deref()
                    .filter(|name| !name.is_empty())
                    .unwrap_or("message");
                self.toasts.show_typed(now, toast.message.0, type_name);
            }
            ServerEvent::UpdateSettings(patch) => {
                self.settings.apply(&patch);
                if let Some(level) = patch.brightness {
                    self.set_active_level(level);
                }
            }
            ServerEvent::SetBrightnessControlsEnabled(flag) => {
                self.brightness_controls_enabled = flag.enabled;
            }
            ServerEvent::UpdateBrightnessLevel(level) => self.set_active_level(level.level),
        }
    }

    fn set_active_level(&mut self, level: String) {
        self.active_level = self
            .brightness_levels
            .contains(&level)
            .then_some(level);
    }

    /// Adopt the snapshot for every control that is neither locked nor
    /// being dragged. Controls absent from the snapshot keep their state.
    pub fn reconcile(&mut self, states: &LightStates) {
        for control in self.controls.values_mut() {
            if !control.accepts_push() {
                tracing::debug!("Skipping update for locked light {}", control.id);
                continue;
            }
            if let Some(snapshot) = states.get(control.id) {
                control.apply_snapshot(snapshot);
            }
        }
    }

    /// Color toggle confirmed: the hardware crossfades, the slider stays
    /// put, the lock is dropped once the crossfade should be over.
    fn on_ramp_start(&mut self, now: Instant, ramp: &RampStart) {
        let release_at = now + ramp.ramp_duration + self.ramp_margin();
        let generation = self
            .controls
            .get(&ramp.light_id)
            .and_then(|control| control.lock_generation());

        match generation {
            Some(generation) => self.schedule_lock_release(ramp.light_id, generation, release_at),
            None => tracing::debug!("ramp_start for unlocked light {}", ramp.light_id),
        }
    }

    fn on_brightness_ramp(&mut self, now: Instant, instruction: &BrightnessRampStart) {
        let release_at = now + instruction.ramp_duration + self.ramp_margin();
        let Some(control) = self.controls.get_mut(&instruction.light_id) else {
            tracing::warn!("brightness_ramp_start for unknown light {}", instruction.light_id);
            return;
        };

        let generation = control.acquire_lock();
        if !control.is_color() {
            control.set_on(instruction.target_brightness > 0);
        }

        let mut ramp = Ramp::new(
            control.brightness(),
            instruction.target_brightness,
            instruction.ramp_duration,
            now,
        );
        ramp.lock_generation = Some(generation);
        control.start_ramp(ramp);

        self.schedule_lock_release(instruction.light_id, generation, release_at);
    }

    /// Scene transition: every light in the snapshot ramps at once, color
    /// flips wait for the ramp to land, and every lock is released after
    /// the scene duration as a fallback.
    fn on_scene_ramp(&mut self, now: Instant, instruction: &SceneRampStart) {
        let release_at = now + instruction.ramp_duration + self.ramp_margin();
        let mut releases = Vec::new();

        for control in self.controls.values_mut() {
            if let Some(snapshot) = instruction.states.get(control.id) {
                let generation = control.acquire_lock();
                let target = snapshot.brightness.unwrap_or_else(|| control.brightness());

                let mut ramp = Ramp::new(control.brightness(), target, instruction.ramp_duration, now);
                ramp.deferred_color = snapshot.active.as_deref().and_then(ColorMode::from_name);
                ramp.lock_generation = Some(generation);
                ramp.follow_toggle = true;
                control.start_ramp(ramp);
            }

            if let Some(generation) = control.lock_generation() {
                releases.push((control.id, generation));
            }
        }

        for (light_id, generation) in releases {
            self.schedule_lock_release(light_id, generation, release_at);
        }
    }

    fn on_connect(&mut self, now: Instant) {
        self.connection.connected = true;
        self.connection.interface_enabled = true;

        if !self.connection.has_connected {
            self.connection.has_connected = true;
            tracing::info!("Connected to backend");
            return;
        }

        tracing::info!("Reconnected to backend");
        self.toasts.show(now, "System Online", ToastKind::Message, false, &[]);
        if let Some(offline) = self.connection.offline_toast.take() {
            self.toasts.dismiss(now, offline);
        }
    }

    fn on_disconnect(&mut self, now: Instant) {
        tracing::warn!("Lost connection to backend");
        self.connection.connected = false;
        self.connection.interface_enabled = false;
        self.telemetry.blank();

        if let Some(previous) = self.connection.offline_toast.take() {
            self.toasts.dismiss(now, previous);
        }
        let offline = self.toasts.show(
            now,
            "System Offline",
            ToastKind::Warning,
            true,
            &["offline-toast"],
        );
        self.connection.offline_toast = Some(offline);
    }
}
