//! Driving controller: a continuously rotating knob reporting a 2-bit gray
//! code. Held Left/Right keys rotate it one step every tenth of a second.

use std::time::Duration;

use emu_core::{InputState, MachineInput};

use super::{InputAdapter, KeyboardKey};
use crate::timer::TimerDevice;

const ROTATION_STEP: Duration = Duration::from_millis(100);

#[derive(Debug, Clone)]
pub struct DrivingAdapter {
    jack_no: usize,
    left_held: bool,
    right_held: bool,
    /// Time until the next rotation step.
    countdown: Duration,
    gray_code: usize,
    emulation_off: bool,
}

impl DrivingAdapter {
    #[must_use]
    pub const fn new(jack_no: usize) -> Self {
        Self {
            jack_no: jack_no & 1,
            left_held: false,
            right_held: false,
            countdown: Duration::ZERO,
            gray_code: 0,
            emulation_off: false,
        }
    }

    fn steer(&mut self, machine_input: MachineInput, down: bool) {
        match machine_input {
            MachineInput::Left => self.left_held = down,
            MachineInput::Right => self.right_held = down,
            _ => {}
        }
    }
}

impl InputAdapter for DrivingAdapter {
    fn joystick_changed(
        &mut self,
        input: &mut InputState,
        _player_no: usize,
        machine_input: MachineInput,
        down: bool,
    ) {
        match machine_input {
            MachineInput::Fire | MachineInput::Fire2 | MachineInput::Up => {
                input.raise_input(self.jack_no, MachineInput::Fire, down);
            }
            MachineInput::Left | MachineInput::Right => self.steer(machine_input, down),
            _ => {}
        }
    }

    fn driving_changed(&mut self, input: &mut InputState, _player_no: usize, machine_input: MachineInput) {
        if MachineInput::DRIVING.contains(&machine_input) {
            self.emulation_off = true;
            input.raise_input(self.jack_no, machine_input, true);
        }
    }

    fn keyboard_key_pressed(&mut self, input: &mut InputState, _player_no: usize, key: KeyboardKey, down: bool) {
        match key {
            KeyboardKey::Z | KeyboardKey::X | KeyboardKey::Up => {
                input.raise_input(self.jack_no, MachineInput::Fire, down);
            }
            KeyboardKey::Left => self.steer(MachineInput::Left, down),
            KeyboardKey::Right => self.steer(MachineInput::Right, down),
            _ => {}
        }
    }

    fn update(&mut self, input: &mut InputState, timer: &TimerDevice) {
        if self.emulation_off {
            return;
        }
        let delta = timer.delta();
        if delta < self.countdown {
            self.countdown -= delta;
            return;
        }
        // Late by `overshoot`; the next step comes that much sooner.
        let overshoot = delta - self.countdown;
        self.countdown = ROTATION_STEP.saturating_sub(overshoot);

        let direction = i32::from(self.right_held) - i32::from(self.left_held);
        if direction == 0 {
            return;
        }
        self.gray_code = (self.gray_code as i32 + direction) as usize & 3;
        input.raise_input(self.jack_no, MachineInput::DRIVING[self.gray_code], true);
    }
}

#[cfg(test)]
mod tests {
    use emu_core::{Controller, ControllerAction};

    use super::*;

    fn tick(adapter: &mut DrivingAdapter, state: &mut InputState, ms: u64) {
        adapter.update(state, &TimerDevice::with_delta(Duration::from_millis(ms)));
    }

    #[test]
    fn held_key_steps_every_tenth_of_a_second() {
        let mut state = InputState::new(Controller::Driving, Controller::Driving);
        let mut adapter = DrivingAdapter::new(1);
        adapter.keyboard_key_pressed(&mut state, 0, KeyboardKey::Right, true);
        tick(&mut adapter, &mut state, 16);
        assert!(state.is_action_set(1, ControllerAction::Driving1));
        tick(&mut adapter, &mut state, 50);
        assert!(state.is_action_set(1, ControllerAction::Driving1));
        tick(&mut adapter, &mut state, 50);
        assert!(state.is_action_set(1, ControllerAction::Driving2));
    }

    #[test]
    fn steps_average_a_tenth_of_a_second_at_uneven_frame_times() {
        let mut state = InputState::new(Controller::Driving, Controller::None);
        let mut adapter = DrivingAdapter::new(0);
        adapter.keyboard_key_pressed(&mut state, 0, KeyboardKey::Right, true);
        // 30 ms frames: steps land at 30, 120, 210 and 300 ms.
        for _ in 0..9 {
            tick(&mut adapter, &mut state, 30);
        }
        assert_eq!(adapter.gray_code, 3);
        tick(&mut adapter, &mut state, 30);
        assert_eq!(adapter.gray_code, 0);
        assert!(state.is_action_set(0, ControllerAction::Driving0));
    }

    #[test]
    fn left_wraps_around() {
        let mut state = InputState::new(Controller::Driving, Controller::None);
        let mut adapter = DrivingAdapter::new(0);
        adapter.keyboard_key_pressed(&mut state, 0, KeyboardKey::Left, true);
        tick(&mut adapter, &mut state, 16);
        assert!(state.is_action_set(0, ControllerAction::Driving3));
    }

    #[test]
    fn real_controller_disables_emulation() {
        let mut state = InputState::new(Controller::Driving, Controller::None);
        let mut adapter = DrivingAdapter::new(0);
        adapter.driving_changed(&mut state, 0, MachineInput::Driving2);
        adapter.keyboard_key_pressed(&mut state, 0, KeyboardKey::Right, true);
        tick(&mut adapter, &mut state, 200);
        assert!(state.is_action_set(0, ControllerAction::Driving2));
    }

    #[test]
    fn up_key_fires() {
        let mut state = InputState::new(Controller::Driving, Controller::None);
        let mut adapter = DrivingAdapter::new(0);
        adapter.keyboard_key_pressed(&mut state, 0, KeyboardKey::Up, true);
        assert!(state.is_action_set(0, ControllerAction::Trigger));
    }
}
