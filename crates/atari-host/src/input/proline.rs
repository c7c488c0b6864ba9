//! 7800 two-button ProLine joystick.
//!
//! The left button (Z) is the 7800's second trigger, the right button (X)
//! the first. Plain joystick events are ignored.

use emu_core::{InputState, MachineInput};

use super::{InputAdapter, KeyboardKey};

#[derive(Debug, Clone, Copy, Default)]
pub struct ProLineJoystickAdapter;

impl InputAdapter for ProLineJoystickAdapter {
    fn proline_joystick_changed(
        &mut self,
        input: &mut InputState,
        player_no: usize,
        machine_input: MachineInput,
        down: bool,
    ) {
        let mapped = match machine_input {
            MachineInput::Left | MachineInput::Right | MachineInput::Up | MachineInput::Down => machine_input,
            MachineInput::Fire => MachineInput::Fire2,
            MachineInput::Fire2 => MachineInput::Fire,
            _ => return,
        };
        input.raise_input(player_no, mapped, down);
    }

    fn keyboard_key_pressed(&mut self, input: &mut InputState, player_no: usize, key: KeyboardKey, down: bool) {
        let machine_input = match key {
            KeyboardKey::Z => MachineInput::Fire2,
            KeyboardKey::X => MachineInput::Fire,
            KeyboardKey::Left => MachineInput::Left,
            KeyboardKey::Right => MachineInput::Right,
            KeyboardKey::Up => MachineInput::Up,
            KeyboardKey::Down => MachineInput::Down,
            _ => return,
        };
        input.raise_input(player_no, machine_input, down);
    }
}
