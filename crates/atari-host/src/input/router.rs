//! Event dispatch to the per-jack adapters.
//!
//! Physical players are mapped to jacks through [`ControllerBindings`]:
//! `player_jack[player]` names the jack whose adapter receives that
//! player's events, and `paddle_swaps` reorders paddle players before the
//! jack lookup. Keyboard and pointer events belong to the current keyboard
//! player.

use emu_core::{Controller, InputState, MachineInput, MachineType};

use super::{InputAdapter, KeyboardKey, NullAdapter, Point, Size, adapter_for};
use crate::timer::TimerDevice;

/// A raw event from the host's input sources.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputEvent {
    Key { key: KeyboardKey, down: bool },
    MouseMoved { x: i32, y: i32, dx: i32, dy: i32 },
    MouseButton { x: i32, y: i32, down: bool },
    Joystick { player_no: usize, input: MachineInput, down: bool },
    ProLineJoystick { player_no: usize, input: MachineInput, down: bool },
    Paddle { player_no: usize, val_max: i32, val: i32 },
    PaddleButton { player_no: usize, down: bool },
    Driving { player_no: usize, input: MachineInput },
    /// A machine input for the keyboard player, bypassing the adapters.
    Machine { input: MachineInput, down: bool },
    ScreenResized { location: Point, size: Size },
}

/// Player-to-jack and paddle-order tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControllerBindings {
    player_jack: [usize; 4],
    paddle_swaps: [usize; 4],
}

impl ControllerBindings {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            player_jack: [0, 1, 0, 1],
            paddle_swaps: [0, 1, 2, 3],
        }
    }

    /// Bindings for the given jack contents: a paddle pair takes two
    /// consecutive players, any other controller one, an empty jack none.
    #[must_use]
    pub const fn for_jacks(left: Controller, right: Controller) -> Self {
        let mut b = Self::new();
        let mut pi = 0;
        match left {
            Controller::Paddles => {
                b.player_jack[0] = 0;
                b.player_jack[1] = 0;
                pi = 2;
            }
            Controller::None => {}
            _ => {
                b.player_jack[0] = 0;
                pi = 1;
            }
        }
        match right {
            Controller::Paddles => {
                b.player_jack[pi] = 1;
                b.player_jack[pi + 1] = 1;
            }
            Controller::None => {}
            _ => b.player_jack[pi] = 1,
        }
        b
    }

    /// Jack serving `player_no`.
    #[must_use]
    pub const fn jack_for(&self, player_no: usize) -> usize {
        self.player_jack[player_no & 3]
    }

    /// Player after paddle reordering.
    #[must_use]
    pub const fn paddle_player(&self, player_no: usize) -> usize {
        self.paddle_swaps[player_no & 3]
    }

    /// Exchange the jacks of every player. Returns whether player 0 now
    /// drives the right jack.
    pub fn swap_jacks(&mut self) -> bool {
        for jack in &mut self.player_jack {
            *jack ^= 1;
        }
        self.player_jack[0] == 1
    }

    /// Exchange the two paddles on the left jack. Returns whether swapped.
    pub fn swap_left_paddles(&mut self) -> bool {
        self.paddle_swaps.swap(0, 1);
        self.paddle_swaps[0] == 1
    }

    /// Exchange the two paddles on the right jack. Returns whether swapped.
    pub fn swap_right_paddles(&mut self) -> bool {
        self.paddle_swaps.swap(2, 3);
        self.paddle_swaps[2] == 3
    }
}

impl Default for ControllerBindings {
    fn default() -> Self {
        Self::new()
    }
}

/// Owns both jack adapters and routes events to them.
pub struct InputRouter {
    adapters: [Box<dyn InputAdapter>; 2],
    bindings: ControllerBindings,
    keyboard_player: usize,
    touch_mode: bool,
}

impl InputRouter {
    #[must_use]
    pub fn new(left: Box<dyn InputAdapter>, right: Box<dyn InputAdapter>, bindings: ControllerBindings) -> Self {
        Self {
            adapters: [left, right],
            bindings,
            keyboard_player: 0,
            touch_mode: false,
        }
    }

    /// Adapters and bindings for the controllers plugged into a machine.
    #[must_use]
    pub fn for_jacks(
        left: Controller,
        right: Controller,
        machine_type: MachineType,
        first_scanline: usize,
    ) -> Self {
        Self::new(
            adapter_for(left, 0, machine_type, first_scanline),
            adapter_for(right, 1, machine_type, first_scanline),
            ControllerBindings::for_jacks(left, right),
        )
    }

    #[must_use]
    pub const fn bindings(&self) -> &ControllerBindings {
        &self.bindings
    }

    pub const fn bindings_mut(&mut self) -> &mut ControllerBindings {
        &mut self.bindings
    }

    #[must_use]
    pub const fn keyboard_player(&self) -> usize {
        self.keyboard_player
    }

    /// Move the keyboard to another player, releasing the old player's
    /// buttons and directions.
    pub fn set_keyboard_player(&mut self, input: &mut InputState, player_no: usize) {
        let player_no = player_no & 3;
        if player_no == self.keyboard_player {
            return;
        }
        for button in MachineInput::PLAYER_BUTTONS {
            input.raise_input(self.keyboard_player, button, false);
        }
        self.keyboard_player = player_no;
    }

    pub const fn set_touch_mode(&mut self, touch_mode: bool) {
        self.touch_mode = touch_mode;
    }

    fn adapter(&mut self, player_no: usize) -> &mut dyn InputAdapter {
        let jack = self.bindings.jack_for(player_no);
        self.adapters[jack & 1].as_mut()
    }

    pub fn dispatch(&mut self, input: &mut InputState, event: InputEvent) {
        let kb = self.keyboard_player;
        let touch_mode = self.touch_mode;
        match event {
            InputEvent::Key { key, down } => {
                self.adapter(kb).keyboard_key_pressed(input, kb, key, down);
            }
            InputEvent::MouseMoved { x, y, dx, dy } => {
                self.adapter(kb).mouse_moved(input, kb, x, y, dx, dy);
            }
            InputEvent::MouseButton { x, y, down } => {
                self.adapter(kb).mouse_button_changed(input, kb, x, y, down, touch_mode);
            }
            InputEvent::Joystick { player_no, input: mi, down } => {
                self.adapter(player_no).joystick_changed(input, player_no, mi, down);
            }
            InputEvent::ProLineJoystick { player_no, input: mi, down } => {
                self.adapter(player_no).proline_joystick_changed(input, player_no, mi, down);
            }
            InputEvent::Paddle { player_no, val_max, val } => {
                let swapped = self.bindings.paddle_player(player_no);
                self.adapter(swapped).paddle_changed(input, swapped, val_max, val);
            }
            InputEvent::PaddleButton { player_no, down } => {
                let swapped = self.bindings.paddle_player(player_no);
                self.adapter(swapped).paddle_button_changed(input, swapped, down);
            }
            InputEvent::Driving { player_no, input: mi } => {
                self.adapter(player_no).driving_changed(input, player_no, mi);
            }
            InputEvent::Machine { input: mi, down } => input.raise_input(kb, mi, down),
            InputEvent::ScreenResized { location, size } => {
                for adapter in &mut self.adapters {
                    adapter.screen_resized(location, size);
                }
            }
        }
    }

    /// Per-frame hook for both adapters.
    pub fn update(&mut self, input: &mut InputState, timer: &TimerDevice) {
        for adapter in &mut self.adapters {
            adapter.update(input, timer);
        }
    }
}

impl Default for InputRouter {
    fn default() -> Self {
        Self::new(Box::new(NullAdapter), Box::new(NullAdapter), ControllerBindings::new())
    }
}

impl std::fmt::Debug for InputRouter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InputRouter")
            .field("bindings", &self.bindings)
            .field("keyboard_player", &self.keyboard_player)
            .field("touch_mode", &self.touch_mode)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use emu_core::ControllerAction;

    use super::*;

    #[test]
    fn jack_swap_is_an_involution() {
        let mut b = ControllerBindings::new();
        assert!(b.swap_jacks());
        assert_eq!(b.jack_for(0), 1);
        assert!(!b.swap_jacks());
        assert_eq!(b, ControllerBindings::new());
    }

    #[test]
    fn paddle_swap_is_an_involution() {
        let mut b = ControllerBindings::for_jacks(Controller::Paddles, Controller::Paddles);
        let original = b;
        assert!(b.swap_left_paddles());
        assert_eq!(b.paddle_player(0), 1);
        assert!(!b.swap_left_paddles());
        assert!(b.swap_right_paddles());
        assert_eq!(b.paddle_player(3), 2);
        assert!(!b.swap_right_paddles());
        assert_eq!(b, original);
    }

    #[test]
    fn paddles_take_two_players() {
        let b = ControllerBindings::for_jacks(Controller::Paddles, Controller::Joystick);
        assert_eq!([0, 1, 2, 3].map(|p| b.jack_for(p)), [0, 0, 1, 1]);
        let b = ControllerBindings::for_jacks(Controller::None, Controller::Paddles);
        assert_eq!([0, 1, 2, 3].map(|p| b.jack_for(p)), [1, 1, 0, 1]);
    }

    #[test]
    fn keyboard_follows_jack_swap() {
        let mut state = InputState::new(Controller::Joystick, Controller::Keypad);
        let mut router = InputRouter::for_jacks(
            Controller::Joystick,
            Controller::Keypad,
            MachineType::A2600Ntsc,
            0,
        );
        router.dispatch(&mut state, InputEvent::Key { key: KeyboardKey::NumPad3, down: true });
        assert!(!state.is_action_set(0, ControllerAction::Keypad3));

        router.bindings_mut().swap_jacks();
        router.dispatch(&mut state, InputEvent::Key { key: KeyboardKey::NumPad3, down: true });
        assert!(state.is_action_set(0, ControllerAction::Keypad3));
    }

    #[test]
    fn swapped_paddles_move_the_other_paddle() {
        let mut state = InputState::new(Controller::Paddles, Controller::None);
        let mut router = InputRouter::for_jacks(
            Controller::Paddles,
            Controller::None,
            MachineType::A2600Ntsc,
            0,
        );
        router.bindings_mut().swap_left_paddles();
        router.dispatch(&mut state, InputEvent::Paddle { player_no: 0, val_max: 10, val: 0 });
        router.dispatch(&mut state, InputEvent::PaddleButton { player_no: 0, down: true });
        assert_eq!(state.paddle_ohms(1), 999_999);
        assert_eq!(state.paddle_ohms(0), 0);
        assert!(state.is_action_set(1, ControllerAction::Trigger));
        assert!(!state.is_action_set(0, ControllerAction::Trigger));
    }

    #[test]
    fn changing_keyboard_player_releases_buttons() {
        let mut state = InputState::default();
        let mut router = InputRouter::for_jacks(
            Controller::Joystick,
            Controller::Joystick,
            MachineType::A7800Ntsc,
            0,
        );
        router.dispatch(&mut state, InputEvent::Key { key: KeyboardKey::Z, down: true });
        router.dispatch(&mut state, InputEvent::Key { key: KeyboardKey::Left, down: true });
        router.set_keyboard_player(&mut state, 5);
        assert_eq!(router.keyboard_player(), 1);
        assert!(!state.is_action_set(0, ControllerAction::Trigger));
        assert!(!state.is_action_set(0, ControllerAction::Left));

        router.dispatch(&mut state, InputEvent::Key { key: KeyboardKey::Z, down: true });
        assert!(state.is_action_set(1, ControllerAction::Trigger));
    }

    #[test]
    fn console_inputs_bypass_adapters() {
        let mut state = InputState::default();
        let mut router = InputRouter::default();
        router.dispatch(&mut state, InputEvent::Machine { input: MachineInput::Reset, down: true });
        assert!(state.is_switch_set(emu_core::ConsoleSwitch::GameReset));
    }
}
