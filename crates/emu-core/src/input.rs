//! Logical machine input surface.
//!
//! The host writes into the *next* input state at any time between frames;
//! the machine calls [`InputState::capture`] at the start of each frame and
//! samples the captured copy while it runs. Players are numbered 0-3: two
//! per jack when paddles are plugged in, otherwise player 0 is the left
//! jack and player 1 the right.

use crate::machine::Controller;

/// A logical input event understood by the machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MachineInput {
    Fire,
    Fire2,
    Left,
    Right,
    Up,
    Down,
    NumPad1,
    NumPad2,
    NumPad3,
    NumPad4,
    NumPad5,
    NumPad6,
    NumPad7,
    NumPad8,
    NumPad9,
    NumPadMult,
    NumPad0,
    NumPadHash,
    Driving0,
    Driving1,
    Driving2,
    Driving3,
    Reset,
    Select,
    Color,
    LeftDifficulty,
    RightDifficulty,
    Pause,
}

impl MachineInput {
    /// Driving-controller gray-code positions, in rotation order.
    pub const DRIVING: [Self; 4] = [Self::Driving0, Self::Driving1, Self::Driving2, Self::Driving3];

    /// Per-player buttons cleared when the keyboard moves to another player.
    pub const PLAYER_BUTTONS: [Self; 6] = [
        Self::Fire,
        Self::Fire2,
        Self::Up,
        Self::Down,
        Self::Left,
        Self::Right,
    ];
}

/// Per-player controller action bit positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ControllerAction {
    Up,
    Down,
    Left,
    Right,
    Trigger,
    Trigger2,
    Keypad1,
    Keypad2,
    Keypad3,
    Keypad4,
    Keypad5,
    Keypad6,
    Keypad7,
    Keypad8,
    Keypad9,
    KeypadA,
    Keypad0,
    KeypadP,
    Driving0,
    Driving1,
    Driving2,
    Driving3,
}

impl ControllerAction {
    const fn mask(self) -> u32 {
        1 << self as u8
    }
}

/// Console front-panel switches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ConsoleSwitch {
    GameReset,
    GameSelect,
    GameBW,
    LeftDifficultyA,
    RightDifficultyA,
    Pause,
}

impl ConsoleSwitch {
    const fn mask(self) -> u8 {
        1 << self as u8
    }
}

/// Paddle resistance is reported in ohms below this bound.
const MAX_OHMS: i32 = 1_000_000;

/// Driving controller gray codes, indexed by rotation position.
const ROT_GRAY_CODES: [u8; 4] = [0x0f, 0x0d, 0x0c, 0x0e];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct Snapshot {
    console: u8,
    actions: [u32; 4],
    ohms: [i32; 4],
    lightgun: [(i32, i32); 2],
}

/// Double-buffered controller and console switch state.
#[derive(Debug, Clone)]
pub struct InputState {
    left_jack: Controller,
    right_jack: Controller,
    next: Snapshot,
    captured: Snapshot,
    rot_state: [usize; 2],
}

impl InputState {
    #[must_use]
    pub fn new(left_jack: Controller, right_jack: Controller) -> Self {
        Self {
            left_jack,
            right_jack,
            next: Snapshot::default(),
            captured: Snapshot::default(),
            rot_state: [0; 2],
        }
    }

    /// Controller plugged into the left jack.
    #[must_use]
    pub const fn left_jack(&self) -> Controller {
        self.left_jack
    }

    /// Controller plugged into the right jack.
    #[must_use]
    pub const fn right_jack(&self) -> Controller {
        self.right_jack
    }

    /// Controller plugged into jack 0 (left) or 1 (right).
    #[must_use]
    pub const fn jack(&self, jack_no: usize) -> Controller {
        if jack_no & 1 == 0 {
            self.left_jack
        } else {
            self.right_jack
        }
    }

    /// Latch the next state for sampling by the machine during this frame.
    pub fn capture(&mut self) {
        self.captured = self.next;
    }

    /// Raise or release a logical input for a player.
    ///
    /// Opposing directions are mutually exclusive: pressing one releases
    /// the other. Console colour and difficulty switches toggle on press.
    pub fn raise_input(&mut self, player_no: usize, input: MachineInput, down: bool) {
        use ControllerAction as A;
        match input {
            MachineInput::Fire => self.set_action(player_no, A::Trigger, down),
            MachineInput::Fire2 => self.set_action(player_no, A::Trigger2, down),
            MachineInput::Left => {
                self.set_action(player_no, A::Left, down);
                if down {
                    self.set_action(player_no, A::Right, false);
                }
            }
            MachineInput::Right => {
                self.set_action(player_no, A::Right, down);
                if down {
                    self.set_action(player_no, A::Left, false);
                }
            }
            MachineInput::Up => {
                self.set_action(player_no, A::Up, down);
                if down {
                    self.set_action(player_no, A::Down, false);
                }
            }
            MachineInput::Down => {
                self.set_action(player_no, A::Down, down);
                if down {
                    self.set_action(player_no, A::Up, false);
                }
            }
            MachineInput::NumPad1 => self.set_action(player_no, A::Keypad1, down),
            MachineInput::NumPad2 => self.set_action(player_no, A::Keypad2, down),
            MachineInput::NumPad3 => self.set_action(player_no, A::Keypad3, down),
            MachineInput::NumPad4 => self.set_action(player_no, A::Keypad4, down),
            MachineInput::NumPad5 => self.set_action(player_no, A::Keypad5, down),
            MachineInput::NumPad6 => self.set_action(player_no, A::Keypad6, down),
            MachineInput::NumPad7 => self.set_action(player_no, A::Keypad7, down),
            MachineInput::NumPad8 => self.set_action(player_no, A::Keypad8, down),
            MachineInput::NumPad9 => self.set_action(player_no, A::Keypad9, down),
            MachineInput::NumPadMult => self.set_action(player_no, A::KeypadA, down),
            MachineInput::NumPad0 => self.set_action(player_no, A::Keypad0, down),
            MachineInput::NumPadHash => self.set_action(player_no, A::KeypadP, down),
            MachineInput::Driving0 => self.set_driving(player_no, A::Driving0),
            MachineInput::Driving1 => self.set_driving(player_no, A::Driving1),
            MachineInput::Driving2 => self.set_driving(player_no, A::Driving2),
            MachineInput::Driving3 => self.set_driving(player_no, A::Driving3),
            MachineInput::Reset => self.set_switch(ConsoleSwitch::GameReset, down),
            MachineInput::Select => self.set_switch(ConsoleSwitch::GameSelect, down),
            MachineInput::Pause => self.set_switch(ConsoleSwitch::Pause, down),
            MachineInput::Color => {
                if down {
                    self.toggle_switch(ConsoleSwitch::GameBW);
                }
            }
            MachineInput::LeftDifficulty => {
                if down {
                    self.toggle_switch(ConsoleSwitch::LeftDifficultyA);
                }
            }
            MachineInput::RightDifficulty => {
                if down {
                    self.toggle_switch(ConsoleSwitch::RightDifficultyA);
                }
            }
        }
    }

    /// Set a paddle's resistance. Out-of-range values are ignored.
    pub fn raise_paddle_input(&mut self, player_no: usize, ohms: i32) {
        if (0..MAX_OHMS).contains(&ohms) {
            self.next.ohms[player_no & 3] = ohms;
        }
    }

    /// Set a paddle from a position `val` in `0..=val_max`.
    ///
    /// Position 0 (fully counter-clockwise) is maximum resistance.
    pub fn raise_paddle_position(&mut self, player_no: usize, val_max: i32, val: i32) {
        if val_max <= 0 {
            return;
        }
        let val = val.clamp(0, val_max) as i64;
        let ohms = (val_max as i64 - val) * (MAX_OHMS as i64 - 1) / val_max as i64;
        self.raise_paddle_input(player_no, ohms as i32);
    }

    /// Set the light-gun aim point for a player.
    pub fn raise_lightgun_pos(&mut self, player_no: usize, scanline: i32, hpos: i32) {
        self.next.lightgun[player_no & 1] = (scanline, hpos);
    }

    /// Release everything: console switches and both jacks.
    pub fn clear_all_input(&mut self) {
        self.next = Snapshot::default();
    }

    /// Release every input belonging to one player.
    pub fn clear_input_by_player(&mut self, player_no: usize) {
        self.next.ohms[player_no & 3] = 0;
        self.next.actions[player_no & 3] = 0;
        self.next.lightgun[player_no & 1] = (0, 0);
    }

    /// Whether an action is set in the pending (next) state.
    #[must_use]
    pub const fn is_action_set(&self, player_no: usize, action: ControllerAction) -> bool {
        self.next.actions[player_no & 3] & action.mask() != 0
    }

    /// Whether a console switch is set in the pending (next) state.
    #[must_use]
    pub const fn is_switch_set(&self, switch: ConsoleSwitch) -> bool {
        self.next.console & switch.mask() != 0
    }

    /// Pending paddle resistance for a player.
    #[must_use]
    pub const fn paddle_ohms(&self, player_no: usize) -> i32 {
        self.next.ohms[player_no & 3]
    }

    /// Pending light-gun `(scanline, hpos)` for a player.
    #[must_use]
    pub const fn lightgun_position(&self, player_no: usize) -> (i32, i32) {
        self.next.lightgun[player_no & 1]
    }

    /// Captured action state, as seen by the machine this frame.
    #[must_use]
    pub const fn sample_action(&self, player_no: usize, action: ControllerAction) -> bool {
        self.captured.actions[player_no & 3] & action.mask() != 0
    }

    /// Captured console switch state.
    #[must_use]
    pub const fn sample_switch(&self, switch: ConsoleSwitch) -> bool {
        self.captured.console & switch.mask() != 0
    }

    /// Captured paddle resistance.
    #[must_use]
    pub const fn sample_ohms(&self, player_no: usize) -> i32 {
        self.captured.ohms[player_no & 3]
    }

    /// Captured light-gun position.
    #[must_use]
    pub const fn sample_lightgun(&self, player_no: usize) -> (i32, i32) {
        self.captured.lightgun[player_no & 1]
    }

    /// Captured driving controller gray code.
    ///
    /// The last seen rotation position is held when no driving bit is set.
    pub fn sample_driving(&mut self, player_no: usize) -> u8 {
        let slot = player_no & 1;
        let positions = [
            ControllerAction::Driving0,
            ControllerAction::Driving1,
            ControllerAction::Driving2,
            ControllerAction::Driving3,
        ];
        if let Some(pos) = positions
            .iter()
            .position(|&a| self.sample_action(player_no, a))
        {
            self.rot_state[slot] = pos;
        }
        ROT_GRAY_CODES[self.rot_state[slot]]
    }

    fn set_action(&mut self, player_no: usize, action: ControllerAction, value: bool) {
        let bits = &mut self.next.actions[player_no & 3];
        if value {
            *bits |= action.mask();
        } else {
            *bits &= !action.mask();
        }
    }

    fn set_driving(&mut self, player_no: usize, position: ControllerAction) {
        use ControllerAction as A;
        for a in [A::Driving0, A::Driving1, A::Driving2, A::Driving3] {
            self.set_action(player_no, a, a == position);
        }
    }

    fn set_switch(&mut self, switch: ConsoleSwitch, value: bool) {
        if value {
            self.next.console |= switch.mask();
        } else {
            self.next.console &= !switch.mask();
        }
    }

    fn toggle_switch(&mut self, switch: ConsoleSwitch) {
        let set = self.is_switch_set(switch);
        self.set_switch(switch, !set);
    }
}

impl Default for InputState {
    fn default() -> Self {
        Self::new(Controller::Joystick, Controller::Joystick)
    }
}
