//! Audio output.
//!
//! [`AudioDriver`] is the platform device. [`AudioOutput`] wraps it with
//! the host's contract: configuration is clamped, the device opens lazily
//! on the first submitted buffer, and a closed or failed device reports
//! `-1` queued buffers so pacing ignores it.

use log::{debug, warn};

use crate::error::AudioError;

/// Largest accepted buffer payload, in bytes.
pub const MAX_BUFFER_LEN: usize = 0x400;
/// Largest accepted queue length, in buffers.
pub const MAX_QUEUE_LEN: usize = 16;

/// Platform audio device playing unsigned 8-bit mono PCM.
pub trait AudioDriver: Send {
    /// Open the device. `buffer_len` bytes are submitted at a time and at
    /// most `queue_len` buffers are held in flight.
    fn open(&mut self, sample_rate: u32, buffer_len: usize, queue_len: usize) -> Result<(), AudioError>;

    /// Buffers submitted but not yet played.
    fn buffers_queued(&self) -> usize;

    fn submit(&mut self, buffer: &[u8]);

    fn close(&mut self);
}

/// Driver with no device behind it. Opening always fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullAudioDriver;

impl AudioDriver for NullAudioDriver {
    fn open(&mut self, _sample_rate: u32, _buffer_len: usize, _queue_len: usize) -> Result<(), AudioError> {
        Err(AudioError::NoDevice)
    }

    fn buffers_queued(&self) -> usize {
        0
    }

    fn submit(&mut self, _buffer: &[u8]) {}

    fn close(&mut self) {}
}

/// Clamped device parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AudioConfig {
    pub sample_rate: u32,
    pub buffer_len: usize,
    pub queue_len: usize,
}

impl AudioConfig {
    #[must_use]
    pub fn new(sample_rate: u32, buffer_len: usize, queue_len: usize) -> Self {
        Self {
            sample_rate,
            buffer_len: buffer_len.min(MAX_BUFFER_LEN),
            queue_len: queue_len.min(MAX_QUEUE_LEN),
        }
    }
}

pub struct AudioOutput {
    driver: Box<dyn AudioDriver>,
    config: Option<AudioConfig>,
    opened: bool,
    unavailable: bool,
}

impl AudioOutput {
    #[must_use]
    pub fn new(driver: Box<dyn AudioDriver>) -> Self {
        Self {
            driver,
            config: None,
            opened: false,
            unavailable: false,
        }
    }

    /// Set the device parameters. An open device with different parameters
    /// is closed and reopens on the next submit.
    pub fn configure(&mut self, sample_rate: u32, buffer_len: usize, queue_len: usize) {
        let config = AudioConfig::new(sample_rate, buffer_len, queue_len);
        if self.config != Some(config) {
            self.close();
        }
        self.config = Some(config);
    }

    /// Whether the output holds a configuration.
    #[must_use]
    pub const fn is_configured(&self) -> bool {
        self.config.is_some()
    }

    #[must_use]
    pub const fn is_open(&self) -> bool {
        self.opened
    }

    #[must_use]
    pub const fn config(&self) -> Option<AudioConfig> {
        self.config
    }

    /// Buffers waiting to play, or `-1` when the device is not open.
    #[must_use]
    pub fn buffers_queued(&self) -> i32 {
        if self.opened {
            i32::try_from(self.driver.buffers_queued()).unwrap_or(i32::MAX)
        } else {
            -1
        }
    }

    /// Queue one buffer, opening the device first if needed.
    ///
    /// Buffers shorter than the configured payload are dropped; longer
    /// ones are truncated. After a failed open the output stays silent
    /// until it is closed or reconfigured.
    pub fn submit(&mut self, buffer: &[u8]) {
        let Some(config) = self.config else {
            return;
        };
        if buffer.len() < config.buffer_len {
            debug!(
                "dropping short audio buffer: {} < {} bytes",
                buffer.len(),
                config.buffer_len
            );
            return;
        }
        if !self.opened {
            if self.unavailable {
                return;
            }
            match self.driver.open(config.sample_rate, config.buffer_len, config.queue_len) {
                Ok(()) => {
                    debug!(
                        "audio open: {} Hz, {} byte buffers, queue {}",
                        config.sample_rate, config.buffer_len, config.queue_len
                    );
                    self.opened = true;
                }
                Err(e) => {
                    warn!("sound unavailable: {e}");
                    self.unavailable = true;
                    return;
                }
            }
        }
        self.driver.submit(&buffer[..config.buffer_len]);
    }

    /// Close the device and forget the configuration.
    pub fn close(&mut self) {
        if self.opened {
            self.driver.close();
            self.opened = false;
        }
        self.config = None;
        self.unavailable = false;
    }
}

impl Default for AudioOutput {
    fn default() -> Self {
        Self::new(Box::new(NullAudioDriver))
    }
}

impl std::fmt::Debug for AudioOutput {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AudioOutput")
            .field("config", &self.config)
            .field("opened", &self.opened)
            .field("unavailable", &self.unavailable)
            .finish_non_exhaustive()
    }
}
