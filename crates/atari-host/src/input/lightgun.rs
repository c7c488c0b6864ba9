//! Light gun aimed with the pointer.
//!
//! Pointer coordinates are mapped onto the machine's visible window:
//! horizontally onto its native pitch, vertically onto the 230 visible
//! scanlines starting at the first visible one.

use emu_core::{InputState, MachineInput, MachineType};

use super::{InputAdapter, KeyboardKey, Point, Size};
use crate::renderer::HEIGHT;

#[derive(Debug, Clone)]
pub struct LightgunAdapter {
    pitch: f32,
    first_scanline: i32,
    location: Point,
    size: Size,
    sfx: f32,
    sfy: f32,
    tx: f32,
    ty: f32,
}

impl LightgunAdapter {
    #[must_use]
    pub fn new(machine_type: MachineType, first_scanline: usize) -> Self {
        Self {
            pitch: machine_type.native_width() as f32,
            first_scanline: first_scanline as i32,
            location: Point::default(),
            size: Size::default(),
            sfx: 0.0,
            sfy: 0.0,
            tx: 0.0,
            ty: 0.0,
        }
    }

    /// Aim at the last pointer position, unless it is off screen.
    fn raise_position(&self, input: &mut InputState, player_no: usize) {
        if self.tx < 0.0 || self.ty < 0.0 || self.tx > self.size.width || self.ty > self.size.height {
            return;
        }
        let scanline = (self.ty * self.sfy) as i32 + self.first_scanline;
        let hpos = (self.tx * self.sfx) as i32;
        input.raise_lightgun_pos(player_no, scanline, hpos);
    }

    fn trigger(&self, input: &mut InputState, player_no: usize, down: bool) {
        self.raise_position(input, player_no);
        input.raise_input(player_no, MachineInput::Fire, down);
    }
}

impl InputAdapter for LightgunAdapter {
    fn screen_resized(&mut self, location: Point, size: Size) {
        self.location = location;
        self.size = size;
        self.sfx = if size.width > 0.0 { self.pitch / size.width } else { 0.0 };
        self.sfy = if size.height > 0.0 { HEIGHT as f32 / size.height } else { 0.0 };
    }

    fn keyboard_key_pressed(&mut self, input: &mut InputState, player_no: usize, key: KeyboardKey, down: bool) {
        if matches!(key, KeyboardKey::Z | KeyboardKey::X) {
            self.trigger(input, player_no, down);
        }
    }

    fn mouse_moved(&mut self, _input: &mut InputState, _player_no: usize, x: i32, y: i32, _dx: i32, _dy: i32) {
        self.tx = x as f32 - self.location.x;
        self.ty = y as f32 - self.location.y;
    }

    fn mouse_button_changed(
        &mut self,
        input: &mut InputState,
        player_no: usize,
        x: i32,
        y: i32,
        down: bool,
        _touch_mode: bool,
    ) {
        self.mouse_moved(input, player_no, x, y, 0, 0);
        self.trigger(input, player_no, down);
    }
}
