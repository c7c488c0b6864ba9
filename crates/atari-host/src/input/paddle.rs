//! Paddle pair on one jack.
//!
//! Real paddles report absolute positions. Without one, the pointer's x
//! position (in the bottom third of the screen) or held Left/Right keys
//! turn the paddle. Keyboard rotation sweeps one screen width per second.

use emu_core::{InputState, MachineInput};

use super::{InputAdapter, KeyboardKey, Point, Size};
use crate::timer::TimerDevice;

/// Screen widths per second turned by held direction keys.
const ROTATION_VELOCITY: f32 = 1.0;

#[derive(Debug, Clone)]
pub struct PaddleAdapter {
    jack_no: usize,
    left_held: [bool; 2],
    right_held: [bool; 2],
    emulation_off: [bool; 2],
    position: [i32; 2],
    x_location: i32,
    x_width: i32,
    start_y: i32,
}

impl PaddleAdapter {
    #[must_use]
    pub const fn new(jack_no: usize) -> Self {
        Self {
            jack_no: jack_no & 1,
            left_held: [false; 2],
            right_held: [false; 2],
            emulation_off: [false; 2],
            position: [0; 2],
            x_location: 0,
            x_width: 1,
            start_y: 0,
        }
    }

    /// Logical player for paddle `player_no & 1` on this jack.
    const fn paddle_player(&self, player_no: usize) -> usize {
        (self.jack_no << 1) | (player_no & 1)
    }

    const fn direction(&self, paddle: usize) -> i32 {
        self.right_held[paddle] as i32 - self.left_held[paddle] as i32
    }

    fn steer(&mut self, player_no: usize, machine_input: MachineInput, down: bool) {
        match machine_input {
            MachineInput::Left => self.left_held[player_no & 1] = down,
            MachineInput::Right => self.right_held[player_no & 1] = down,
            _ => {}
        }
    }
}

impl InputAdapter for PaddleAdapter {
    fn screen_resized(&mut self, location: Point, size: Size) {
        self.x_location = location.x as i32;
        if size.width > 0.0 {
            self.x_width = size.width as i32;
        }
        self.start_y = (location.y + size.height) as i32 * 2 / 3;
    }

    fn joystick_changed(
        &mut self,
        input: &mut InputState,
        player_no: usize,
        machine_input: MachineInput,
        down: bool,
    ) {
        match machine_input {
            MachineInput::Fire | MachineInput::Fire2 => {
                input.raise_input(self.paddle_player(player_no), MachineInput::Fire, down);
            }
            MachineInput::Left | MachineInput::Right => self.steer(player_no, machine_input, down),
            _ => {}
        }
    }

    fn paddle_changed(&mut self, input: &mut InputState, player_no: usize, val_max: i32, val: i32) {
        self.emulation_off[player_no & 1] = true;
        input.raise_paddle_position(self.paddle_player(player_no), val_max, val);
    }

    fn keyboard_key_pressed(&mut self, input: &mut InputState, player_no: usize, key: KeyboardKey, down: bool) {
        match key {
            KeyboardKey::Z | KeyboardKey::X => {
                input.raise_input(self.paddle_player(player_no), MachineInput::Fire, down);
            }
            KeyboardKey::Left => self.steer(player_no, MachineInput::Left, down),
            KeyboardKey::Right => self.steer(player_no, MachineInput::Right, down),
            _ => {}
        }
    }

    fn mouse_moved(&mut self, input: &mut InputState, player_no: usize, x: i32, y: i32, _dx: i32, _dy: i32) {
        let paddle = player_no & 1;
        if self.emulation_off[paddle] || y < self.start_y {
            return;
        }
        self.position[paddle] = (x - self.x_location).clamp(0, self.x_width);
        input.raise_paddle_position(self.paddle_player(player_no), self.x_width, self.position[paddle]);
    }

    fn mouse_button_changed(
        &mut self,
        input: &mut InputState,
        player_no: usize,
        x: i32,
        y: i32,
        down: bool,
        touch_mode: bool,
    ) {
        if touch_mode {
            return;
        }
        self.mouse_moved(input, player_no, x, y, 0, 0);
        input.raise_input(self.paddle_player(player_no), MachineInput::Fire, down);
    }

    fn update(&mut self, input: &mut InputState, timer: &TimerDevice) {
        for paddle in 0..2 {
            let direction = self.direction(paddle);
            if self.emulation_off[paddle] || direction == 0 {
                continue;
            }
            let step = timer.delta_secs() * ROTATION_VELOCITY * self.x_width as f32 * direction as f32;
            self.position[paddle] = (self.position[paddle] + step as i32).clamp(0, self.x_width);
            input.raise_paddle_position(self.paddle_player(paddle), self.x_width, self.position[paddle]);
        }
    }
}
