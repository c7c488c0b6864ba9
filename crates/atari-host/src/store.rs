//! Session persistence boundary.
//!
//! The host restores a session at start and persists it exactly once when
//! the worker exits. How and where the data is kept is up to the store.

use emu_core::GameProgram;
use serde::{Deserialize, Serialize};

use crate::error::StoreError;

/// How the display scales the pixel buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum InterpolationMode {
    #[default]
    NearestNeighbor,
    Linear,
}

impl InterpolationMode {
    /// The other mode.
    #[must_use]
    pub const fn toggled(self) -> Self {
        match self {
            Self::NearestNeighbor => Self::Linear,
            Self::Linear => Self::NearestNeighbor,
        }
    }
}

/// Host settings saved alongside the machine state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionSettings {
    /// Keyboard player, 1-based.
    pub current_player_no: usize,
    pub frames_per_second: u32,
    pub interpolation_mode: InterpolationMode,
    pub sound_off: bool,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            current_player_no: 1,
            frames_per_second: 60,
            interpolation_mode: InterpolationMode::NearestNeighbor,
            sound_off: false,
        }
    }
}

/// A previously persisted session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RestoredSession {
    pub settings: SessionSettings,
    /// Bytes from `Machine::save_state`.
    pub machine_state: Vec<u8>,
}

/// Everything written when a session ends.
#[derive(Debug, Clone, Copy)]
pub struct PersistRequest<'a> {
    pub program: &'a GameProgram,
    pub settings: &'a SessionSettings,
    pub machine_state: Option<&'a [u8]>,
    /// BGRA pixels, 320x230.
    pub snapshot: &'a [u8],
}

pub trait SessionStore: Send + Sync {
    fn restore(&self, program: &GameProgram) -> Option<RestoredSession>;

    fn persist(&self, request: PersistRequest<'_>) -> Result<(), StoreError>;
}

/// Store that keeps nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullStore;

impl SessionStore for NullStore {
    fn restore(&self, _program: &GameProgram) -> Option<RestoredSession> {
        None
    }

    fn persist(&self, _request: PersistRequest<'_>) -> Result<(), StoreError> {
        Ok(())
    }
}
