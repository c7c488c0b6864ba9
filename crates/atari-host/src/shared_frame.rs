//! The pixel buffer shared between the worker and the display.
//!
//! The worker renders into the slot while holding the lock; the display
//! copies the bytes out under the same lock and never keeps a reference.

use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::renderer::{HEIGHT, WIDTH};

/// Size in bytes of the BGRA pixel buffer.
pub const FRAME_BYTES: usize = WIDTH * HEIGHT * 4;

/// Lock-protected pixel state.
#[derive(Debug, Clone)]
pub struct PixelSlot {
    /// `WIDTH * HEIGHT` BGRA pixels.
    pub pixels: Vec<u8>,
    /// Set by the producer after each render.
    pub updated: bool,
    /// Set by the consumer after each copy-out, cleared by the blending renderer.
    pub delivered: bool,
}

impl PixelSlot {
    /// A black, opaque buffer.
    #[must_use]
    pub fn new() -> Self {
        let mut pixels = vec![0; FRAME_BYTES];
        for px in pixels.chunks_exact_mut(4) {
            px[3] = 0xFF;
        }
        Self {
            pixels,
            updated: false,
            delivered: false,
        }
    }

    /// Reset to opaque black.
    pub fn clear(&mut self) {
        for px in self.pixels.chunks_exact_mut(4) {
            px[..3].fill(0);
        }
        self.updated = true;
    }
}

impl Default for PixelSlot {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Default)]
pub struct SharedFrame {
    slot: Mutex<PixelSlot>,
}

impl SharedFrame {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, PixelSlot> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Run `f` with exclusive access to the slot.
    pub fn with_slot<R>(&self, f: impl FnOnce(&mut PixelSlot) -> R) -> R {
        f(&mut self.lock())
    }

    /// Copy the pixels into `dst` and mark them delivered.
    ///
    /// Returns whether the producer rendered since the previous copy.
    /// `dst` shorter than the buffer receives a prefix.
    pub fn copy_out(&self, dst: &mut [u8]) -> bool {
        let mut slot = self.lock();
        let n = dst.len().min(slot.pixels.len());
        dst[..n].copy_from_slice(&slot.pixels[..n]);
        let updated = slot.updated;
        slot.updated = false;
        slot.delivered = true;
        updated
    }

    /// An owned copy of the current pixels. Does not affect the handshake.
    #[must_use]
    pub fn snapshot(&self) -> Vec<u8> {
        self.lock().pixels.clone()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }
}
