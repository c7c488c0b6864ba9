//! Twelve-button keypad controller, driven from the numeric keypad.

use emu_core::{InputState, MachineInput};

use super::{InputAdapter, KeyboardKey};

#[derive(Debug, Clone, Copy, Default)]
pub struct KeypadAdapter;

impl InputAdapter for KeypadAdapter {
    fn joystick_changed(
        &mut self,
        input: &mut InputState,
        player_no: usize,
        machine_input: MachineInput,
        down: bool,
    ) {
        input.raise_input(player_no, machine_input, down);
    }

    fn proline_joystick_changed(
        &mut self,
        input: &mut InputState,
        player_no: usize,
        machine_input: MachineInput,
        down: bool,
    ) {
        input.raise_input(player_no, machine_input, down);
    }

    fn keyboard_key_pressed(&mut self, input: &mut InputState, player_no: usize, key: KeyboardKey, down: bool) {
        let machine_input = match key {
            KeyboardKey::NumPad0 => MachineInput::NumPad0,
            KeyboardKey::NumPad1 => MachineInput::NumPad1,
            KeyboardKey::NumPad2 => MachineInput::NumPad2,
            KeyboardKey::NumPad3 => MachineInput::NumPad3,
            KeyboardKey::NumPad4 => MachineInput::NumPad4,
            KeyboardKey::NumPad5 => MachineInput::NumPad5,
            KeyboardKey::NumPad6 => MachineInput::NumPad6,
            KeyboardKey::NumPad7 => MachineInput::NumPad7,
            KeyboardKey::NumPad8 => MachineInput::NumPad8,
            KeyboardKey::NumPad9 => MachineInput::NumPad9,
            KeyboardKey::Multiply => MachineInput::NumPadMult,
            KeyboardKey::Add => MachineInput::NumPadHash,
            _ => return,
        };
        input.raise_input(player_no, machine_input, down);
    }
}
