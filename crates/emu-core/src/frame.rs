//! Raw per-frame machine output.

/// One emulated frame of output.
///
/// `video` holds `visible_pitch` colour indices per scanline, top to bottom.
/// `sound` holds unsigned 8-bit PCM, two samples per scanline.
#[derive(Debug, Clone)]
pub struct FrameBuffer {
    visible_pitch: usize,
    scanlines: usize,
    pub video: Vec<u8>,
    pub sound: Vec<u8>,
}

impl FrameBuffer {
    #[must_use]
    pub fn new(visible_pitch: usize, scanlines: usize) -> Self {
        Self {
            visible_pitch,
            scanlines,
            video: vec![0; visible_pitch * scanlines],
            sound: vec![0; scanlines << 1],
        }
    }

    /// Number of colour indices on one scanline.
    #[must_use]
    pub const fn visible_pitch(&self) -> usize {
        self.visible_pitch
    }

    /// Number of scanlines held in the video buffer.
    #[must_use]
    pub const fn scanlines(&self) -> usize {
        self.scanlines
    }

    /// Colour indices for scanline `line`, or `None` past the end.
    #[must_use]
    pub fn scanline(&self, line: usize) -> Option<&[u8]> {
        let start = line.checked_mul(self.visible_pitch)?;
        self.video.get(start..start + self.visible_pitch)
    }

    /// Mutable colour indices for scanline `line`.
    pub fn scanline_mut(&mut self, line: usize) -> Option<&mut [u8]> {
        let start = line.checked_mul(self.visible_pitch)?;
        self.video.get_mut(start..start + self.visible_pitch)
    }
}
