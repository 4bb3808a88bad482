use std::time::{Duration, Instant};

use super::control::ColorMode;

/// Linear brightness animation driven by the frame tick.
#[derive(Debug, Clone)]
pub struct Ramp {
    from: u8,
    to: u8,
    duration: Duration,
    started: Instant,
    /// Color flip held back until the ramp lands
    pub(crate) deferred_color: Option<ColorMode>,
    /// Lock generation to release on completion
    pub(crate) lock_generation: Option<u64>,
    /// Scene ramps drive the on/off toggle from the live value
    pub(crate) follow_toggle: bool,
}

impl Ramp {
    pub fn new(from: u8, to: u8, duration: Duration, started: Instant) -> Self {
        Self {
            from,
            to,
            duration,
            started,
            deferred_color: None,
            lock_generation: None,
            follow_toggle: false,
        }
    }

    pub fn progress(&self, now: Instant) -> f64 {
        if self.duration.is_zero() {
            return 1.0;
        }
        let elapsed = now.saturating_duration_since(self.started);
        (elapsed.as_secs_f64() / self.duration.as_secs_f64()).clamp(0.0, 1.0)
    }

    pub fn value_at(&self, now: Instant) -> u8 {
        interpolate(self.from, self.to, self.progress(now))
    }

    pub fn is_complete(&self, now: Instant) -> bool {
        self.progress(now) >= 1.0
    }
}

/// `round(from + (to - from) * progress)` with progress clamped to [0, 1].
pub fn interpolate(from: u8, to: u8, progress: f64) -> u8 {
    let progress = progress.clamp(0.0, 1.0);
    let from = f64::from(from);
    let to = f64::from(to);
    (from + (to - from) * progress).round().clamp(0.0, 100.0) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interpolates_and_rounds() {
        assert_eq!(interpolate(0, 100, 0.0), 0);
        assert_eq!(interpolate(0, 100, 0.333), 33);
        assert_eq!(interpolate(0, 100, 0.335), 34);
        assert_eq!(interpolate(80, 20, 0.5), 50);
        assert_eq!(interpolate(10, 11, 0.5), 11);
        assert_eq!(interpolate(0, 100, 1.7), 100);
    }

    #[test]
    fn progress_follows_elapsed_time() {
        let t0 = Instant::now();
        let ramp = Ramp::new(20, 60, Duration::from_millis(1000), t0);

        assert_eq!(ramp.value_at(t0), 20);
        assert_eq!(ramp.value_at(t0 + Duration::from_millis(250)), 30);
        assert_eq!(ramp.value_at(t0 + Duration::from_millis(500)), 40);
        assert!(!ramp.is_complete(t0 + Duration::from_millis(999)));
        assert!(ramp.is_complete(t0 + Duration::from_millis(1000)));
        assert_eq!(ramp.value_at(t0 + Duration::from_secs(5)), 60);
    }

    #[test]
    fn zero_duration_completes_immediately() {
        let t0 = Instant::now();
        let ramp = Ramp::new(70, 0, Duration::ZERO, t0);
        assert!(ramp.is_complete(t0));
        assert_eq!(ramp.value_at(t0), 0);
    }

    #[test]
    fn sampling_before_start_clamps_to_origin() {
        let t0 = Instant::now();
        let ramp = Ramp::new(5, 95, Duration::from_millis(400), t0 + Duration::from_millis(100));
        assert_eq!(ramp.progress(t0), 0.0);
        assert_eq!(ramp.value_at(t0), 5);
    }
}
