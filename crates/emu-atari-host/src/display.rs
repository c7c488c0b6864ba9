//! Where the game screen sits inside the window.

use atari_host::{HEIGHT, Point, Size, WIDTH};

/// Integer scale factor for a window, never below 1.
#[must_use]
pub fn scale_for(window_width: u32, window_height: u32) -> u32 {
    let sx = window_width / WIDTH as u32;
    let sy = window_height / HEIGHT as u32;
    sx.min(sy).max(1)
}

/// Screen rectangle in window pixels for an integer-scaled, centred
/// `WIDTH x HEIGHT` image.
#[must_use]
pub fn screen_rect(window_width: u32, window_height: u32) -> (Point, Size) {
    let scale = scale_for(window_width, window_height) as f32;
    let width = WIDTH as f32 * scale;
    let height = HEIGHT as f32 * scale;
    let location = Point {
        x: ((window_width as f32 - width) / 2.0).max(0.0).floor(),
        y: ((window_height as f32 - height) / 2.0).max(0.0).floor(),
    };
    (location, Size { width, height })
}

/// Copy a BGRA frame into an RGBA buffer.
pub fn bgra_to_rgba(src: &[u8], dst: &mut [u8]) {
    for (s, d) in src.chunks_exact(4).zip(dst.chunks_exact_mut(4)) {
        d[0] = s[2];
        d[1] = s[1];
        d[2] = s[0];
        d[3] = 0xFF;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_multiple_fills_window() {
        let (at, size) = screen_rect(960, 690);
        assert_eq!((at.x, at.y), (0.0, 0.0));
        assert_eq!((size.width, size.height), (960.0, 690.0));
    }

    #[test]
    fn odd_window_is_letterboxed() {
        let (at, size) = screen_rect(1000, 700);
        assert_eq!(scale_for(1000, 700), 3);
        assert_eq!((at.x, at.y), (20.0, 5.0));
        assert_eq!(size.width, 960.0);
    }

    #[test]
    fn tiny_window_keeps_scale_one() {
        assert_eq!(scale_for(100, 100), 1);
    }

    #[test]
    fn channels_are_swapped() {
        let mut dst = [0u8; 4];
        bgra_to_rgba(&[1, 2, 3, 0], &mut dst);
        assert_eq!(dst, [3, 2, 1, 0xFF]);
    }
}
