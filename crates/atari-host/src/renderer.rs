//! Colour-index frames to BGRA pixels.
//!
//! The visible window is a fixed 230 scanlines starting at the machine's
//! first visible scanline. 160-pixel machines are doubled horizontally so
//! every renderer fills the same 320x230 destination.

use emu_core::{FrameBuffer, MachineType, Palette};

use crate::shared_frame::PixelSlot;

/// Destination width in pixels.
pub const WIDTH: usize = 320;
/// Destination height in pixels (visible scanlines).
pub const HEIGHT: usize = 230;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderMode {
    /// One pixel per colour index.
    Scanline320,
    /// Each colour index doubled horizontally.
    Scanline160,
    /// Doubled, and averaged with the previous undelivered frame.
    Scanline160Blender,
}

impl RenderMode {
    /// Colour indices per source scanline.
    #[must_use]
    pub const fn pitch(self) -> usize {
        match self {
            Self::Scanline320 => 320,
            Self::Scanline160 | Self::Scanline160Blender => 160,
        }
    }

    /// Pick the renderer for a machine family.
    #[must_use]
    pub const fn for_machine(machine_type: MachineType, blend: bool) -> Self {
        if machine_type.is_7800() {
            Self::Scanline320
        } else if blend {
            Self::Scanline160Blender
        } else {
            Self::Scanline160
        }
    }
}

#[derive(Debug, Clone)]
pub struct FrameRenderer {
    mode: RenderMode,
    start: usize,
    end: usize,
}

impl FrameRenderer {
    #[must_use]
    pub const fn new(mode: RenderMode, first_scanline: usize) -> Self {
        let pitch = mode.pitch();
        let start = first_scanline * pitch;
        Self {
            mode,
            start,
            end: start + pitch * HEIGHT,
        }
    }

    #[must_use]
    pub const fn mode(&self) -> RenderMode {
        self.mode
    }

    /// Render `frame` into `slot`. A missing palette draws nothing.
    ///
    /// Only the window's available scanlines are drawn when the frame is
    /// shorter than the window. The alpha byte is never written.
    pub fn render(&self, palette: Option<&Palette>, frame: &FrameBuffer, slot: &mut PixelSlot) {
        let Some(palette) = palette else {
            return;
        };
        let end = self.end.min(frame.video.len());
        let src = frame.video.get(self.start..end).unwrap_or_default();
        match self.mode {
            RenderMode::Scanline320 => render_320(palette, src, &mut slot.pixels),
            RenderMode::Scanline160 => render_160(palette, src, &mut slot.pixels),
            RenderMode::Scanline160Blender => {
                render_160_blend(palette, src, &mut slot.pixels, slot.delivered);
                slot.delivered = false;
            }
        }
    }
}

fn put(px: &mut [u8], (r, g, b): (u8, u8, u8)) {
    px[0] = b;
    px[1] = g;
    px[2] = r;
}

fn render_320(palette: &Palette, src: &[u8], dst: &mut [u8]) {
    for (&ci, px) in src.iter().zip(dst.chunks_exact_mut(4)) {
        put(px, palette.rgb(ci));
    }
}

fn render_160(palette: &Palette, src: &[u8], dst: &mut [u8]) {
    for (&ci, pair) in src.iter().zip(dst.chunks_exact_mut(8)) {
        let rgb = palette.rgb(ci);
        put(&mut pair[..4], rgb);
        put(&mut pair[4..], rgb);
    }
}

fn render_160_blend(palette: &Palette, src: &[u8], dst: &mut [u8], delivered: bool) {
    for (&ci, pair) in src.iter().zip(dst.chunks_exact_mut(8)) {
        let rgb = if ci < 2 {
            // Sentinels keep the previous frame's colour until it has been shown.
            if !delivered {
                continue;
            }
            (0, 0, 0)
        } else {
            let (rn, gn, bn) = palette.rgb(ci);
            let (bo, go, ro) = (pair[0], pair[1], pair[2]);
            let mix = |new: u8, old: u8| {
                if delivered || old == 0 {
                    new
                } else {
                    ((u16::from(new) + u16::from(old)) >> 1) as u8
                }
            };
            (mix(rn, ro), mix(gn, go), mix(bn, bo))
        };
        put(&mut pair[..4], rgb);
        put(&mut pair[4..], rgb);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gray_palette() -> Palette {
        let table: Vec<u32> = (0..=255u32).map(|i| (i << 16) | (i << 8) | i).collect();
        Palette::from_slice(&table).expect("palette")
    }

    fn frame_filled(pitch: usize, first: usize, index: u8) -> FrameBuffer {
        let mut fb = FrameBuffer::new(pitch, first + HEIGHT);
        fb.video.fill(index);
        fb
    }

    fn pixel(slot: &PixelSlot, x: usize, y: usize) -> [u8; 4] {
        let i = (y * WIDTH + x) * 4;
        [slot.pixels[i], slot.pixels[i + 1], slot.pixels[i + 2], slot.pixels[i + 3]]
    }

    #[test]
    fn full_width_uniform_frame() {
        let r = FrameRenderer::new(RenderMode::Scanline320, 16);
        let mut slot = PixelSlot::new();
        r.render(Some(&gray_palette()), &frame_filled(320, 16, 5), &mut slot);
        assert!(slot.pixels.chunks_exact(4).all(|px| px == [5, 5, 5, 0xFF]));
    }

    #[test]
    fn full_width_ignores_previous_content() {
        let r = FrameRenderer::new(RenderMode::Scanline320, 0);
        let palette = gray_palette();
        let mut slot = PixelSlot::new();
        let mut fb = frame_filled(320, 0, 200);
        r.render(Some(&palette), &fb, &mut slot);
        fb.video[321] = 9;
        r.render(Some(&palette), &fb, &mut slot);
        assert_eq!(pixel(&slot, 1, 1), [9, 9, 9, 0xFF]);
        assert_eq!(pixel(&slot, 0, 0), [200, 200, 200, 0xFF]);
    }

    #[test]
    fn window_starts_at_first_scanline() {
        let r = FrameRenderer::new(RenderMode::Scanline320, 10);
        let mut fb = frame_filled(320, 10, 3);
        fb.scanline_mut(9).expect("line").fill(77);
        fb.scanline_mut(10).expect("line")[0] = 42;
        let mut slot = PixelSlot::new();
        r.render(Some(&gray_palette()), &fb, &mut slot);
        assert_eq!(pixel(&slot, 0, 0)[0], 42);
        assert!(slot.pixels.chunks_exact(4).all(|px| px[0] != 77));
    }

    #[test]
    fn half_width_doubles_pixels() {
        let r = FrameRenderer::new(RenderMode::Scanline160, 0);
        let mut fb = frame_filled(160, 0, 0);
        fb.video[1] = 50;
        let mut slot = PixelSlot::new();
        r.render(Some(&gray_palette()), &fb, &mut slot);
        assert_eq!(pixel(&slot, 2, 0), [50, 50, 50, 0xFF]);
        assert_eq!(pixel(&slot, 3, 0), [50, 50, 50, 0xFF]);
        assert_eq!(pixel(&slot, 4, 0), [0, 0, 0, 0xFF]);
    }

    #[test]
    fn missing_palette_is_noop() {
        let r = FrameRenderer::new(RenderMode::Scanline320, 0);
        let mut slot = PixelSlot::new();
        slot.pixels[0] = 99;
        r.render(None, &frame_filled(320, 0, 5), &mut slot);
        assert_eq!(slot.pixels[0], 99);
    }

    #[test]
    fn short_frame_renders_available_lines() {
        let r = FrameRenderer::new(RenderMode::Scanline160Blender, 20);
        let fb = FrameBuffer::new(160, 30);
        let mut slot = PixelSlot::new();
        r.render(Some(&gray_palette()), &fb, &mut slot);

        let past_end = FrameBuffer::new(160, 5);
        r.render(Some(&gray_palette()), &past_end, &mut slot);
    }

    #[test]
    fn blend_averages_when_not_delivered() {
        let r = FrameRenderer::new(RenderMode::Scanline160Blender, 0);
        let palette = gray_palette();
        let mut slot = PixelSlot::new();
        r.render(Some(&palette), &frame_filled(160, 0, 100), &mut slot);
        assert!(!slot.delivered);
        r.render(Some(&palette), &frame_filled(160, 0, 200), &mut slot);
        assert_eq!(pixel(&slot, 0, 0), [150, 150, 150, 0xFF]);
    }

    #[test]
    fn blend_overwrites_after_delivery() {
        let r = FrameRenderer::new(RenderMode::Scanline160Blender, 0);
        let palette = gray_palette();
        let mut slot = PixelSlot::new();
        r.render(Some(&palette), &frame_filled(160, 0, 100), &mut slot);
        slot.delivered = true;
        r.render(Some(&palette), &frame_filled(160, 0, 200), &mut slot);
        assert_eq!(pixel(&slot, 5, 5), [200, 200, 200, 0xFF]);
        assert!(!slot.delivered);
    }

    #[test]
    fn blend_does_not_average_twice() {
        let r = FrameRenderer::new(RenderMode::Scanline160Blender, 0);
        let palette = gray_palette();
        let mut slot = PixelSlot::new();
        r.render(Some(&palette), &frame_filled(160, 0, 100), &mut slot);
        slot.delivered = true;
        r.render(Some(&palette), &frame_filled(160, 0, 200), &mut slot);
        slot.delivered = true;
        r.render(Some(&palette), &frame_filled(160, 0, 60), &mut slot);
        assert_eq!(pixel(&slot, 0, 0), [60, 60, 60, 0xFF]);
    }

    #[test]
    fn sentinels_skip_or_black() {
        let r = FrameRenderer::new(RenderMode::Scanline160Blender, 0);
        let palette = gray_palette();
        let mut slot = PixelSlot::new();
        r.render(Some(&palette), &frame_filled(160, 0, 120), &mut slot);

        // Not delivered: sentinel leaves the previous colour in place.
        r.render(Some(&palette), &frame_filled(160, 0, 1), &mut slot);
        assert_eq!(pixel(&slot, 0, 0), [120, 120, 120, 0xFF]);

        // Delivered: sentinel is black.
        slot.delivered = true;
        r.render(Some(&palette), &frame_filled(160, 0, 0), &mut slot);
        assert!(slot.pixels.chunks_exact(4).all(|px| px == [0, 0, 0, 0xFF]));
    }

    #[test]
    fn renderer_choice_by_machine() {
        assert_eq!(
            RenderMode::for_machine(MachineType::A7800Pal, true),
            RenderMode::Scanline320
        );
        assert_eq!(
            RenderMode::for_machine(MachineType::A2600Ntsc, true),
            RenderMode::Scanline160Blender
        );
        assert_eq!(
            RenderMode::for_machine(MachineType::A2600Ntsc, false),
            RenderMode::Scanline160
        );
    }
}
