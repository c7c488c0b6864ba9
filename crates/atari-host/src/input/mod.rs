//! Physical input to logical machine input.
//!
//! Each controller jack gets one adapter chosen from the controller plugged
//! into it. Adapters translate keyboard, pointer and gamepad events into
//! [`InputState`] writes; anything an adapter does not understand is
//! ignored. The [`router`] picks which adapter sees an event.

mod driving;
mod joystick;
mod keypad;
mod lightgun;
mod null;
mod paddle;
mod proline;
pub mod router;

pub use driving::DrivingAdapter;
pub use joystick::JoystickAdapter;
pub use keypad::KeypadAdapter;
pub use lightgun::LightgunAdapter;
pub use null::NullAdapter;
pub use paddle::PaddleAdapter;
pub use proline::ProLineJoystickAdapter;
pub use router::{ControllerBindings, InputEvent, InputRouter};

use emu_core::{Controller, InputState, MachineInput, MachineType};

use crate::timer::TimerDevice;

/// Host keys the adapters react to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyboardKey {
    Z,
    X,
    Left,
    Right,
    Up,
    Down,
    NumPad0,
    NumPad1,
    NumPad2,
    NumPad3,
    NumPad4,
    NumPad5,
    NumPad6,
    NumPad7,
    NumPad8,
    NumPad9,
    Multiply,
    Add,
}

/// Top-left corner of the game screen in window coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

/// Size of the game screen in window coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Size {
    pub width: f32,
    pub height: f32,
}

/// Per-jack event translator. Every method defaults to doing nothing.
#[allow(unused_variables)]
pub trait InputAdapter: Send {
    fn screen_resized(&mut self, location: Point, size: Size) {}

    fn joystick_changed(
        &mut self,
        input: &mut InputState,
        player_no: usize,
        machine_input: MachineInput,
        down: bool,
    ) {
    }

    fn proline_joystick_changed(
        &mut self,
        input: &mut InputState,
        player_no: usize,
        machine_input: MachineInput,
        down: bool,
    ) {
    }

    /// A real paddle moved to `val` in `0..=val_max`.
    fn paddle_changed(&mut self, input: &mut InputState, player_no: usize, val_max: i32, val: i32) {}

    /// Paddle buttons are read as the fire input.
    fn paddle_button_changed(&mut self, input: &mut InputState, player_no: usize, down: bool) {
        self.joystick_changed(input, player_no, MachineInput::Fire, down);
    }

    /// A real driving controller reported a gray-code position.
    fn driving_changed(&mut self, input: &mut InputState, player_no: usize, machine_input: MachineInput) {}

    fn keyboard_key_pressed(&mut self, input: &mut InputState, player_no: usize, key: KeyboardKey, down: bool) {}

    fn mouse_moved(&mut self, input: &mut InputState, player_no: usize, x: i32, y: i32, dx: i32, dy: i32) {}

    fn mouse_button_changed(
        &mut self,
        input: &mut InputState,
        player_no: usize,
        x: i32,
        y: i32,
        down: bool,
        touch_mode: bool,
    ) {
    }

    /// Called once per frame with the time since the previous frame.
    fn update(&mut self, input: &mut InputState, timer: &TimerDevice) {}
}

/// The adapter for whatever is plugged into `jack_no`.
#[must_use]
pub fn adapter_for(
    controller: Controller,
    jack_no: usize,
    machine_type: MachineType,
    first_scanline: usize,
) -> Box<dyn InputAdapter> {
    match controller {
        Controller::Joystick | Controller::BoosterGrip => Box::new(JoystickAdapter),
        Controller::ProLineJoystick => Box::new(ProLineJoystickAdapter),
        Controller::Keypad => Box::new(KeypadAdapter),
        Controller::Paddles => Box::new(PaddleAdapter::new(jack_no)),
        Controller::Driving => Box::new(DrivingAdapter::new(jack_no)),
        Controller::Lightgun => Box::new(LightgunAdapter::new(machine_type, first_scanline)),
        Controller::None => Box::new(NullAdapter),
    }
}
