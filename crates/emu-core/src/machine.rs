//! The machine boundary: what the host needs from an emulated console.

use std::fmt;
use std::str::FromStr;

use crate::frame::FrameBuffer;
use crate::input::InputState;

/// Console family and video standard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum MachineType {
    A2600Ntsc,
    A2600Pal,
    A7800Ntsc,
    A7800Pal,
}

impl MachineType {
    #[must_use]
    pub const fn is_2600(self) -> bool {
        matches!(self, Self::A2600Ntsc | Self::A2600Pal)
    }

    #[must_use]
    pub const fn is_7800(self) -> bool {
        matches!(self, Self::A7800Ntsc | Self::A7800Pal)
    }

    #[must_use]
    pub const fn is_pal(self) -> bool {
        matches!(self, Self::A2600Pal | Self::A7800Pal)
    }

    /// Colour indices per scanline: 160 on the 2600, 320 on the 7800.
    #[must_use]
    pub const fn native_width(self) -> usize {
        if self.is_2600() { 160 } else { 320 }
    }
}

impl fmt::Display for MachineType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::A2600Ntsc => "a2600-ntsc",
            Self::A2600Pal => "a2600-pal",
            Self::A7800Ntsc => "a7800-ntsc",
            Self::A7800Pal => "a7800-pal",
        };
        f.write_str(name)
    }
}

impl FromStr for MachineType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "a2600-ntsc" | "2600" | "2600-ntsc" => Ok(Self::A2600Ntsc),
            "a2600-pal" | "2600-pal" => Ok(Self::A2600Pal),
            "a7800-ntsc" | "7800" | "7800-ntsc" => Ok(Self::A7800Ntsc),
            "a7800-pal" | "7800-pal" => Ok(Self::A7800Pal),
            _ => Err(format!("unknown machine type: {s}")),
        }
    }
}

/// Device plugged into a controller jack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Controller {
    #[default]
    None,
    Joystick,
    Paddles,
    Keypad,
    Driving,
    BoosterGrip,
    ProLineJoystick,
    Lightgun,
}

impl FromStr for Controller {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "none" => Ok(Self::None),
            "joystick" => Ok(Self::Joystick),
            "paddles" => Ok(Self::Paddles),
            "keypad" => Ok(Self::Keypad),
            "driving" => Ok(Self::Driving),
            "boostergrip" | "booster-grip" => Ok(Self::BoosterGrip),
            "proline" | "proline-joystick" => Ok(Self::ProLineJoystick),
            "lightgun" => Ok(Self::Lightgun),
            _ => Err(format!("unknown controller: {s}")),
        }
    }
}

/// Identifies a game and the hardware it expects.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GameProgram {
    /// Stable key used by session stores.
    pub id: String,
    pub machine_type: MachineType,
    pub left_controller: Controller,
    pub right_controller: Controller,
}

impl GameProgram {
    #[must_use]
    pub fn new(id: impl Into<String>, machine_type: MachineType) -> Self {
        Self {
            id: id.into(),
            machine_type,
            left_controller: Controller::Joystick,
            right_controller: Controller::Joystick,
        }
    }

    #[must_use]
    pub const fn with_controllers(mut self, left: Controller, right: Controller) -> Self {
        self.left_controller = left;
        self.right_controller = right;
        self
    }
}

/// An emulated console the host can step one frame at a time.
///
/// The host calls every method from its worker thread only.
pub trait Machine: Send {
    fn machine_type(&self) -> MachineType;

    /// Native frame rate.
    fn frame_hz(&self) -> u32;

    /// First scanline shown in the visible window.
    fn first_scanline(&self) -> usize;

    /// Colour table, packed `0x00RRGGBB`. May be shorter than 256 entries.
    fn palette(&self) -> &[u32];

    fn input_state(&self) -> &InputState;

    fn input_state_mut(&mut self) -> &mut InputState;

    /// Controllers plugged into the left and right jacks.
    fn controller_jacks(&self) -> (Controller, Controller) {
        let input = self.input_state();
        (input.left_jack(), input.right_jack())
    }

    /// A frame buffer sized for this machine.
    fn create_frame_buffer(&self) -> FrameBuffer;

    /// Run one frame, filling `frame` with video and sound.
    fn compute_next_frame(&mut self, frame: &mut FrameBuffer);

    /// Serialized machine state for session persistence, if supported.
    fn save_state(&self) -> Option<Vec<u8>> {
        None
    }
}

/// Builds machines for the host.
pub trait MachineFactory: Send + Sync {
    /// A fresh machine for `program`, or `None` when it cannot be built.
    fn create(&self, program: &GameProgram) -> Option<Box<dyn Machine>>;

    /// A machine resumed from bytes previously returned by
    /// [`Machine::save_state`].
    fn restore(&self, program: &GameProgram, state: &[u8]) -> Option<Box<dyn Machine>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn native_width_by_family() {
        assert_eq!(MachineType::A2600Pal.native_width(), 160);
        assert_eq!(MachineType::A7800Ntsc.native_width(), 320);
    }

    #[test]
    fn machine_type_parses_display_form() {
        for mt in [
            MachineType::A2600Ntsc,
            MachineType::A2600Pal,
            MachineType::A7800Ntsc,
            MachineType::A7800Pal,
        ] {
            assert_eq!(mt.to_string().parse::<MachineType>(), Ok(mt));
        }
        assert!("5200".parse::<MachineType>().is_err());
    }

    #[test]
    fn controller_aliases() {
        assert_eq!("ProLine".parse(), Ok(Controller::ProLineJoystick));
        assert_eq!("booster-grip".parse(), Ok(Controller::BoosterGrip));
    }
}
