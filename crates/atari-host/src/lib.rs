//! Real-time host for Atari 2600/7800 machines.
//!
//! A [`Host`] runs one machine session at a time on a worker thread. Each
//! frame it steps the machine, feeds the audio device, renders the frame
//! into a shared BGRA pixel buffer and waits for the next deadline. The
//! deadline is nudged by audio backpressure, and the frame rate is
//! calibrated from observed frame durations.
//!
//! Platform services come in through traits: [`AudioDriver`] for sound,
//! [`SessionStore`] for persistence, and [`emu_core::MachineFactory`] for
//! the machine itself. The display copies pixels out of [`SharedFrame`].

use std::sync::{Mutex, MutexGuard, PoisonError};

pub mod audio;
pub mod config;
pub mod error;
pub mod host;
pub mod input;
pub mod pacing;
pub mod palettes;
pub mod renderer;
mod session;
pub mod shared_frame;
mod snow;
pub mod store;
pub mod timer;

pub use audio::{AudioDriver, AudioOutput, NullAudioDriver};
pub use config::{HostConfig, PacingPolicy};
pub use error::{AudioError, SessionError, StoreError};
pub use host::{Host, HostCommand, HostState};
pub use input::{InputEvent, KeyboardKey, Point, Size};
pub use renderer::{HEIGHT, WIDTH};
pub use shared_frame::SharedFrame;
pub use store::{InterpolationMode, NullStore, PersistRequest, RestoredSession, SessionSettings, SessionStore};

/// Lock a mutex, recovering the data if a panicking thread poisoned it.
pub(crate) fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}
