//! 256-entry colour lookup table.
//!
//! Entries are packed `0x00RRGGBB`. Machines may expose shorter tables; the
//! missing entries read as black.

/// Number of entries in a palette (one per 8-bit colour index).
pub const PALETTE_SIZE: usize = 256;

/// Immutable colour-index → RGB table.
#[derive(Clone, PartialEq, Eq)]
pub struct Palette {
    entries: [u32; PALETTE_SIZE],
}

impl Palette {
    /// Build a palette from a machine-provided table.
    ///
    /// Returns `None` for an empty table, which the renderers treat as
    /// "nothing to draw".
    #[must_use]
    pub fn from_slice(colors: &[u32]) -> Option<Self> {
        if colors.is_empty() {
            return None;
        }
        let mut entries = [0u32; PALETTE_SIZE];
        for (dst, &src) in entries.iter_mut().zip(colors) {
            *dst = src & 0x00FF_FFFF;
        }
        Some(Self { entries })
    }

    /// The dimmed variant: every channel halved.
    #[must_use]
    pub fn darker(&self) -> Self {
        let mut entries = [0u32; PALETTE_SIZE];
        for (dst, &color) in entries.iter_mut().zip(&self.entries) {
            let r = ((color >> 16) & 0xFF) >> 1;
            let g = ((color >> 8) & 0xFF) >> 1;
            let b = (color & 0xFF) >> 1;
            *dst = (r << 16) | (g << 8) | b;
        }
        Self { entries }
    }

    /// Packed `0x00RRGGBB` for a colour index.
    #[must_use]
    pub const fn color(&self, index: u8) -> u32 {
        self.entries[index as usize]
    }

    /// `(r, g, b)` for a colour index.
    #[must_use]
    pub const fn rgb(&self, index: u8) -> (u8, u8, u8) {
        let c = self.entries[index as usize];
        ((c >> 16) as u8, (c >> 8) as u8, c as u8)
    }
}

impl std::fmt::Debug for Palette {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Palette")
            .field("entries", &PALETTE_SIZE)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_table_has_no_palette() {
        assert!(Palette::from_slice(&[]).is_none());
    }

    #[test]
    fn short_table_pads_with_black() {
        let p = Palette::from_slice(&[0x00FF_8040]).expect("palette");
        assert_eq!(p.rgb(0), (0xFF, 0x80, 0x40));
        assert_eq!(p.color(1), 0);
        assert_eq!(p.color(255), 0);
    }

    #[test]
    fn alpha_byte_is_dropped() {
        let p = Palette::from_slice(&[0xFF12_3456]).expect("palette");
        assert_eq!(p.color(0), 0x0012_3456);
    }

    #[test]
    fn darker_halves_each_channel() {
        let p = Palette::from_slice(&[0x00FF_8041, 0x0001_0203]).expect("palette");
        let d = p.darker();
        assert_eq!(d.rgb(0), (0x7F, 0x40, 0x20));
        assert_eq!(d.rgb(1), (0x00, 0x01, 0x01));
        // The source is untouched.
        assert_eq!(p.rgb(0), (0xFF, 0x80, 0x41));
    }
}
