//! Per-frame elapsed time for adapters that integrate motion.

use std::time::{Duration, Instant};

#[derive(Debug, Clone)]
pub struct TimerDevice {
    last: Instant,
    delta: Duration,
}

impl TimerDevice {
    #[must_use]
    pub fn new() -> Self {
        Self {
            last: Instant::now(),
            delta: Duration::ZERO,
        }
    }

    /// A timer that reports a fixed delta until the next [`update`](Self::update).
    #[must_use]
    pub fn with_delta(delta: Duration) -> Self {
        Self {
            last: Instant::now(),
            delta,
        }
    }

    /// Mark the end of a frame; the delta becomes the time since the last call.
    pub fn update(&mut self) {
        let now = Instant::now();
        self.delta = now.saturating_duration_since(self.last);
        self.last = now;
    }

    #[must_use]
    pub const fn delta(&self) -> Duration {
        self.delta
    }

    #[must_use]
    pub fn delta_secs(&self) -> f32 {
        self.delta.as_secs_f32()
    }
}

impl Default for TimerDevice {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn update_measures_elapsed_time() {
        let mut t = TimerDevice::new();
        std::thread::sleep(Duration::from_millis(2));
        t.update();
        assert!(t.delta() >= Duration::from_millis(2));
    }
}
