//! Frame pacing: audio backpressure nudges, frame-duration calibration and
//! the cooperative wait until the next frame deadline.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use log::{debug, info};

use crate::config::PacingPolicy;

/// Number of one-millisecond histogram buckets.
pub const HISTOGRAM_BUCKETS: usize = 256;

/// Shift applied to a frame deadline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Adjustment {
    None,
    Earlier(Duration),
    Later(Duration),
}

impl Adjustment {
    #[must_use]
    pub fn apply(self, deadline: Instant) -> Instant {
        match self {
            Self::None => deadline,
            Self::Earlier(d) => deadline.checked_sub(d).unwrap_or(deadline),
            Self::Later(d) => deadline + d,
        }
    }
}

/// Deadline nudge for the number of queued audio buffers.
///
/// A negative count means no audio output (closed, unavailable, muted or
/// paused) and never nudges.
#[must_use]
pub fn deadline_adjustment(queued: i32, interval: Duration, policy: &PacingPolicy) -> Adjustment {
    if queued < 0 {
        Adjustment::None
    } else if queued < policy.low_water {
        Adjustment::Earlier(interval / 2)
    } else if queued > policy.high_water {
        Adjustment::Later(interval / 2)
    } else {
        Adjustment::None
    }
}

/// Wall-clock frame durations in whole milliseconds.
#[derive(Debug, Clone)]
pub struct FrameDurationHistogram {
    buckets: [u32; HISTOGRAM_BUCKETS],
    samples: u32,
}

impl FrameDurationHistogram {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            buckets: [0; HISTOGRAM_BUCKETS],
            samples: 0,
        }
    }

    /// Count one frame. Durations past the last bucket are dropped.
    pub fn record(&mut self, duration: Duration) -> bool {
        let ms = duration.as_millis();
        if ms >= HISTOGRAM_BUCKETS as u128 {
            return false;
        }
        self.buckets[ms as usize] += 1;
        self.samples += 1;
        true
    }

    #[must_use]
    pub const fn samples(&self) -> u32 {
        self.samples
    }

    pub fn clear(&mut self) {
        self.buckets = [0; HISTOGRAM_BUCKETS];
        self.samples = 0;
    }

    /// Frame rate sustainable by `percentile` percent of the samples.
    ///
    /// Finds the smallest bucket `d >= 1` whose cumulative count (buckets
    /// `0..=d`) reaches the percentile and returns `1000 / d`, clamped to
    /// the policy's fps range.
    #[must_use]
    pub fn candidate_rate(&self, policy: &PacingPolicy) -> Option<u32> {
        let needed = u64::from(self.samples) * u64::from(policy.calibration_percentile) / 100;
        let mut count = 0u64;
        for (d, &n) in self.buckets.iter().enumerate() {
            count += u64::from(n);
            if d == 0 || count < needed {
                continue;
            }
            let rate = 1000 / d as u32;
            return Some(rate.clamp(policy.min_fps, policy.max_fps));
        }
        None
    }
}

impl Default for FrameDurationHistogram {
    fn default() -> Self {
        Self::new()
    }
}

/// Worker-local frame timing state.
#[derive(Debug, Clone)]
pub struct FrameTiming {
    policy: PacingPolicy,
    histogram: FrameDurationHistogram,
    calibration_needed: bool,
    calibrating: bool,
    rate_change_needed: bool,
    current_rate: u32,
    proposed_rate: u32,
    max_rate: u32,
}

/// Outcome of [`FrameTiming::begin_frame`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateChange {
    pub from: u32,
    pub to: u32,
}

impl FrameTiming {
    /// Timing for a machine whose native rate is `max_rate`.
    #[must_use]
    pub fn new(policy: PacingPolicy, max_rate: u32) -> Self {
        let max_rate = max_rate.max(1);
        Self {
            policy,
            histogram: FrameDurationHistogram::new(),
            calibration_needed: false,
            calibrating: false,
            rate_change_needed: false,
            current_rate: max_rate,
            proposed_rate: max_rate,
            max_rate,
        }
    }

    #[must_use]
    pub const fn current_rate(&self) -> u32 {
        self.current_rate
    }

    #[must_use]
    pub const fn max_rate(&self) -> u32 {
        self.max_rate
    }

    #[must_use]
    pub const fn is_calibrating(&self) -> bool {
        self.calibrating
    }

    #[must_use]
    pub const fn histogram(&self) -> &FrameDurationHistogram {
        &self.histogram
    }

    /// Target duration of one frame at the current rate.
    #[must_use]
    pub fn interval(&self) -> Duration {
        Duration::from_secs(1) / self.current_rate
    }

    /// Start a calibration pass on the next frame.
    pub fn request_calibration(&mut self) {
        self.calibration_needed = true;
    }

    /// Ask for a new frame rate, clamped to `[min_fps, max_rate]`.
    pub fn propose_rate(&mut self, fps: u32) {
        self.proposed_rate = fps.clamp(self.policy.min_fps.min(self.max_rate), self.max_rate);
        self.rate_change_needed = true;
    }

    /// Run calibration and apply any pending rate change.
    ///
    /// A pass only starts while sound is on. Returns the change when the
    /// frame rate was switched, so the caller can reopen audio.
    pub fn begin_frame(&mut self, sound_on: bool) -> Option<RateChange> {
        if self.calibration_needed {
            self.calibration_needed = false;
            self.calibrating = sound_on;
            if self.calibrating {
                self.histogram.clear();
            }
        }

        if self.calibrating && self.histogram.samples() >= self.policy.calibration_samples {
            self.calibrating = false;
            if let Some(candidate) = self.histogram.candidate_rate(&self.policy) {
                info!(
                    "calibration: {} samples, sustainable rate {candidate} fps",
                    self.histogram.samples()
                );
                self.proposed_rate = candidate;
                if candidate < self.current_rate {
                    self.rate_change_needed = true;
                }
            }
        }

        if !self.rate_change_needed {
            return None;
        }
        self.rate_change_needed = false;
        let change = RateChange {
            from: self.current_rate,
            to: self.proposed_rate,
        };
        if change.to > change.from {
            self.calibration_needed = true;
        }
        self.current_rate = change.to;
        debug!("frame rate {} -> {} fps", change.from, change.to);
        Some(change)
    }

    /// Record one frame's wall-clock duration. Ignored while sound is off.
    pub fn record(&mut self, duration: Duration, sound_on: bool) {
        if sound_on {
            self.histogram.record(duration);
        }
    }
}

/// Cooperatively wait until `deadline` or until `stop` is set.
///
/// Sleeps in one-millisecond steps while more than two milliseconds
/// remain, then yields. Returns the time left when the wait ended early.
pub fn wait_until(deadline: Instant, stop: &AtomicBool) -> Duration {
    loop {
        if stop.load(Ordering::Acquire) {
            return deadline.saturating_duration_since(Instant::now());
        }
        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            return remaining;
        }
        if remaining > Duration::from_millis(2) {
            std::thread::sleep(Duration::from_millis(1));
        } else {
            std::thread::yield_now();
        }
    }
}
