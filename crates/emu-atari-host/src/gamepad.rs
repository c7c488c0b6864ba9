//! Gamepad input via gilrs.
//!
//! Pads are numbered as they first send an event, up to four players.
//! D-pad and face buttons become joystick and Pro-Line events, which the
//! paddle adapter also reads as the paddle button. The left stick's X axis
//! drives a paddle, and past the threshold it counts as a direction.

use std::collections::HashMap;

use atari_host::InputEvent;
use emu_core::MachineInput;
use gilrs::{Axis, Button, EventType, GamepadId, Gilrs};
use log::{info, warn};

/// Threshold for analog stick to register as a direction.
const AXIS_THRESHOLD: f32 = 0.5;

/// Resolution of the emulated paddle position.
const PADDLE_RANGE: i32 = 1000;

const MAX_PLAYERS: usize = 4;

/// Machine input for a pad button, if it has one.
#[must_use]
pub const fn button_input(button: Button) -> Option<MachineInput> {
    match button {
        Button::DPadUp => Some(MachineInput::Up),
        Button::DPadDown => Some(MachineInput::Down),
        Button::DPadLeft => Some(MachineInput::Left),
        Button::DPadRight => Some(MachineInput::Right),
        Button::South | Button::LeftTrigger | Button::LeftTrigger2 => Some(MachineInput::Fire),
        Button::East | Button::RightTrigger | Button::RightTrigger2 => Some(MachineInput::Fire2),
        _ => None,
    }
}

/// Paddle position for a stick value in `-1.0..=1.0`, left end first.
#[must_use]
pub fn paddle_position(value: f32) -> i32 {
    let v = value.clamp(-1.0, 1.0).mul_add(0.5, 0.5);
    (v * PADDLE_RANGE as f32).round() as i32
}

/// Which way an axis value points: `-1`, `0` or `1`.
#[must_use]
pub fn axis_direction(value: f32) -> i8 {
    if value > AXIS_THRESHOLD {
        1
    } else if value < -AXIS_THRESHOLD {
        -1
    } else {
        0
    }
}

/// Events for a change of thresholded direction on one axis.
fn direction_events(
    player_no: usize,
    before: i8,
    after: i8,
    negative: MachineInput,
    positive: MachineInput,
    out: &mut Vec<InputEvent>,
) {
    if before == after {
        return;
    }
    let input_for = |dir: i8| if dir < 0 { negative } else { positive };
    if before != 0 {
        push_button(player_no, input_for(before), false, out);
    }
    if after != 0 {
        push_button(player_no, input_for(after), true, out);
    }
}

fn push_button(player_no: usize, input: MachineInput, down: bool, out: &mut Vec<InputEvent>) {
    out.push(InputEvent::Joystick {
        player_no,
        input,
        down,
    });
    out.push(InputEvent::ProLineJoystick {
        player_no,
        input,
        down,
    });
}

#[derive(Debug, Clone, Copy, Default)]
struct StickState {
    x: i8,
    y: i8,
}

pub struct Gamepads {
    gilrs: Gilrs,
    players: Vec<GamepadId>,
    sticks: HashMap<GamepadId, StickState>,
}

impl Gamepads {
    /// Open the platform gamepad backend. Returns `None` when there is none.
    #[must_use]
    pub fn new() -> Option<Self> {
        let gilrs = match Gilrs::new() {
            Ok(gilrs) => gilrs,
            Err(gilrs::Error::NotImplemented(gilrs)) => {
                warn!("gamepads not supported on this platform");
                gilrs
            }
            Err(e) => {
                warn!("gamepad support unavailable: {e}");
                return None;
            }
        };
        Some(Self {
            gilrs,
            players: Vec::new(),
            sticks: HashMap::new(),
        })
    }

    fn player_for(&mut self, id: GamepadId) -> Option<usize> {
        if let Some(p) = self.players.iter().position(|&known| known == id) {
            return Some(p);
        }
        if self.players.len() >= MAX_PLAYERS {
            return None;
        }
        self.players.push(id);
        info!("gamepad {id:?} is player {}", self.players.len());
        Some(self.players.len() - 1)
    }

    /// Drain pending pad events as host input events.
    pub fn poll(&mut self) -> Vec<InputEvent> {
        let mut out = Vec::new();
        while let Some(event) = self.gilrs.next_event() {
            let Some(player_no) = self.player_for(event.id) else {
                continue;
            };
            match event.event {
                EventType::ButtonPressed(button, _) => {
                    if let Some(input) = button_input(button) {
                        push_button(player_no, input, true, &mut out);
                    }
                }
                EventType::ButtonReleased(button, _) => {
                    if let Some(input) = button_input(button) {
                        push_button(player_no, input, false, &mut out);
                    }
                }
                EventType::AxisChanged(Axis::LeftStickX, value, _) => {
                    out.push(InputEvent::Paddle {
                        player_no,
                        val_max: PADDLE_RANGE,
                        val: paddle_position(value),
                    });
                    let stick = self.sticks.entry(event.id).or_default();
                    let dir = axis_direction(value);
                    direction_events(player_no, stick.x, dir, MachineInput::Left, MachineInput::Right, &mut out);
                    stick.x = dir;
                }
                EventType::AxisChanged(Axis::LeftStickY, value, _) => {
                    let stick = self.sticks.entry(event.id).or_default();
                    let dir = axis_direction(value);
                    direction_events(player_no, stick.y, dir, MachineInput::Down, MachineInput::Up, &mut out);
                    stick.y = dir;
                }
                EventType::Disconnected => {
                    info!("gamepad {:?} disconnected", event.id);
                    self.sticks.remove(&event.id);
                }
                _ => {}
            }
        }
        out
    }
}
