//! Host configuration.
//!
//! Every field has a default, so a partial JSON document is enough to
//! override one knob.

use std::time::Duration;

use serde::Deserialize;

/// Frame pacing and calibration policy.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct PacingPolicy {
    /// Samples needed before a calibration pass may propose a rate.
    pub calibration_samples: u32,
    /// Share of samples (percent) the chosen duration bucket must cover.
    pub calibration_percentile: u32,
    /// Fewer queued audio buffers than this pulls the deadline earlier.
    pub low_water: i32,
    /// More queued audio buffers than this pushes the deadline later.
    pub high_water: i32,
    pub min_fps: u32,
    pub max_fps: u32,
}

impl Default for PacingPolicy {
    fn default() -> Self {
        Self {
            calibration_samples: 200,
            calibration_percentile: 90,
            low_water: 2,
            high_water: 4,
            min_fps: 4,
            max_fps: 60,
        }
    }
}

/// Host-wide settings.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct HostConfig {
    pub pacing: PacingPolicy,
    /// How long `stop` waits for the worker before forcing audio closed.
    pub stop_timeout_ms: u64,
    /// Audio buffers the device may hold in flight.
    pub audio_queue_len: usize,
    /// Blend consecutive frames on 160-pixel machines.
    pub blend_frames: bool,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            pacing: PacingPolicy::default(),
            stop_timeout_ms: 5000,
            audio_queue_len: 8,
            blend_frames: true,
        }
    }
}

impl HostConfig {
    #[must_use]
    pub const fn stop_timeout(&self) -> Duration {
        Duration::from_millis(self.stop_timeout_ms)
    }
}
