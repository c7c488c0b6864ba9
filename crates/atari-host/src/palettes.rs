//! Per-session palette pair: the machine's own colours and a dimmed copy.

use emu_core::Palette;

#[derive(Debug, Clone, Default)]
pub struct SessionPalettes {
    normal: Option<Palette>,
    darker: Option<Palette>,
    use_darker: bool,
}

impl SessionPalettes {
    /// Derive both palettes from a machine colour table.
    ///
    /// An empty table leaves both absent, and rendering becomes a no-op.
    #[must_use]
    pub fn from_machine(colors: &[u32]) -> Self {
        let normal = Palette::from_slice(colors);
        let darker = normal.as_ref().map(Palette::darker);
        Self {
            normal,
            darker,
            use_darker: false,
        }
    }

    /// The palette the renderer should use for the next frame.
    #[must_use]
    pub fn current(&self) -> Option<&Palette> {
        if self.use_darker {
            self.darker.as_ref()
        } else {
            self.normal.as_ref()
        }
    }

    pub fn set_darker(&mut self, darker: bool) {
        self.use_darker = darker;
    }

    #[must_use]
    pub const fn is_darker(&self) -> bool {
        self.use_darker
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn darker_switch_selects_dimmed_palette() {
        let mut p = SessionPalettes::from_machine(&[0x0080_8080]);
        assert_eq!(p.current().map(|c| c.color(0)), Some(0x0080_8080));
        p.set_darker(true);
        assert_eq!(p.current().map(|c| c.color(0)), Some(0x0040_4040));
    }

    #[test]
    fn empty_table_yields_no_palette() {
        let p = SessionPalettes::from_machine(&[]);
        assert!(p.current().is_none());
    }
}
