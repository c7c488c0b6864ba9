//! Host keyboard → host input mapping.
//!
//! Default mapping:
//! - Arrows → directions, Z → fire, X → second button
//! - Numpad → keypad controllers, `*` and `+` → keypad star and hash
//! - F1 reset, F2 select, F3 colour/BW, F4/F5 left/right difficulty, P pause
//! - F6 pause emulation, F7 sound, F8 darker palette
//! - F9 swap jacks, F10/F11 swap left/right paddles, F12 next keyboard player
//! - I toggles the recorded interpolation mode
//! - Escape quits

use atari_host::KeyboardKey;
use emu_core::MachineInput;
use winit::keyboard::KeyCode;

/// Actions the frontend handles itself instead of forwarding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrontendCommand {
    TogglePause,
    ToggleSound,
    ToggleDarkerPalette,
    SwapJacks,
    SwapLeftPaddles,
    SwapRightPaddles,
    NextKeyboardPlayer,
    ToggleInterpolation,
    Quit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    /// Routed to the keyboard player's controller adapter.
    Key(KeyboardKey),
    /// Raised directly on the machine's input state.
    Machine(MachineInput),
    /// Acted on when pressed; releases are ignored.
    Command(FrontendCommand),
}

/// Map a host key. Returns `None` for unmapped keys.
#[must_use]
pub fn map_keycode(key: KeyCode) -> Option<KeyAction> {
    use KeyAction::{Command, Key, Machine};

    let action = match key {
        KeyCode::ArrowUp => Key(KeyboardKey::Up),
        KeyCode::ArrowDown => Key(KeyboardKey::Down),
        KeyCode::ArrowLeft => Key(KeyboardKey::Left),
        KeyCode::ArrowRight => Key(KeyboardKey::Right),
        KeyCode::KeyZ => Key(KeyboardKey::Z),
        KeyCode::KeyX => Key(KeyboardKey::X),
        KeyCode::Numpad0 => Key(KeyboardKey::NumPad0),
        KeyCode::Numpad1 => Key(KeyboardKey::NumPad1),
        KeyCode::Numpad2 => Key(KeyboardKey::NumPad2),
        KeyCode::Numpad3 => Key(KeyboardKey::NumPad3),
        KeyCode::Numpad4 => Key(KeyboardKey::NumPad4),
        KeyCode::Numpad5 => Key(KeyboardKey::NumPad5),
        KeyCode::Numpad6 => Key(KeyboardKey::NumPad6),
        KeyCode::Numpad7 => Key(KeyboardKey::NumPad7),
        KeyCode::Numpad8 => Key(KeyboardKey::NumPad8),
        KeyCode::Numpad9 => Key(KeyboardKey::NumPad9),
        KeyCode::NumpadMultiply => Key(KeyboardKey::Multiply),
        KeyCode::NumpadAdd => Key(KeyboardKey::Add),

        KeyCode::F1 => Machine(MachineInput::Reset),
        KeyCode::F2 => Machine(MachineInput::Select),
        KeyCode::F3 => Machine(MachineInput::Color),
        KeyCode::F4 => Machine(MachineInput::LeftDifficulty),
        KeyCode::F5 => Machine(MachineInput::RightDifficulty),
        KeyCode::KeyP => Machine(MachineInput::Pause),

        KeyCode::F6 => Command(FrontendCommand::TogglePause),
        KeyCode::F7 => Command(FrontendCommand::ToggleSound),
        KeyCode::F8 => Command(FrontendCommand::ToggleDarkerPalette),
        KeyCode::F9 => Command(FrontendCommand::SwapJacks),
        KeyCode::F10 => Command(FrontendCommand::SwapLeftPaddles),
        KeyCode::F11 => Command(FrontendCommand::SwapRightPaddles),
        KeyCode::F12 => Command(FrontendCommand::NextKeyboardPlayer),
        KeyCode::KeyI => Command(FrontendCommand::ToggleInterpolation),
        KeyCode::Escape => Command(FrontendCommand::Quit),
        _ => return None,
    };
    Some(action)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn game_keys_reach_adapters() {
        assert_eq!(map_keycode(KeyCode::KeyZ), Some(KeyAction::Key(KeyboardKey::Z)));
        assert_eq!(
            map_keycode(KeyCode::NumpadMultiply),
            Some(KeyAction::Key(KeyboardKey::Multiply))
        );
    }

    #[test]
    fn console_switches_bypass_adapters() {
        assert_eq!(
            map_keycode(KeyCode::F1),
            Some(KeyAction::Machine(MachineInput::Reset))
        );
        assert_eq!(
            map_keycode(KeyCode::KeyP),
            Some(KeyAction::Machine(MachineInput::Pause))
        );
    }

    #[test]
    fn frontend_commands() {
        assert_eq!(
            map_keycode(KeyCode::Escape),
            Some(KeyAction::Command(FrontendCommand::Quit))
        );
        assert_eq!(
            map_keycode(KeyCode::F9),
            Some(KeyAction::Command(FrontendCommand::SwapJacks))
        );
        assert_eq!(
            map_keycode(KeyCode::KeyI),
            Some(KeyAction::Command(FrontendCommand::ToggleInterpolation))
        );
    }

    #[test]
    fn unmapped_keys() {
        assert_eq!(map_keycode(KeyCode::KeyQ), None);
        assert_eq!(map_keycode(KeyCode::Enter), None);
    }
}
