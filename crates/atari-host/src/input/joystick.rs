//! Standard joystick and booster grip.
//!
//! Keyboard: arrows move, Z fires, X is the booster grip's second trigger.

use emu_core::{InputState, MachineInput};

use super::{InputAdapter, KeyboardKey};

#[derive(Debug, Clone, Copy, Default)]
pub struct JoystickAdapter;

impl InputAdapter for JoystickAdapter {
    fn joystick_changed(
        &mut self,
        input: &mut InputState,
        player_no: usize,
        machine_input: MachineInput,
        down: bool,
    ) {
        match machine_input {
            MachineInput::Left
            | MachineInput::Right
            | MachineInput::Up
            | MachineInput::Down
            | MachineInput::Fire
            | MachineInput::Fire2 => input.raise_input(player_no, machine_input, down),
            _ => {}
        }
    }

    fn keyboard_key_pressed(&mut self, input: &mut InputState, player_no: usize, key: KeyboardKey, down: bool) {
        let machine_input = match key {
            KeyboardKey::Z => MachineInput::Fire,
            KeyboardKey::X => MachineInput::Fire2,
            KeyboardKey::Left => MachineInput::Left,
            KeyboardKey::Right => MachineInput::Right,
            KeyboardKey::Up => MachineInput::Up,
            KeyboardKey::Down => MachineInput::Down,
            _ => return,
        };
        input.raise_input(player_no, machine_input, down);
    }
}
