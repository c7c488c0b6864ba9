//! Core traits and types shared by the Atari host and the machines it drives.
//!
//! The emulated machine is an opaque stepper: it produces one frame of
//! colour indices and sound samples per call, and reads its inputs from an
//! [`InputState`] the host writes to between frames. Everything the host
//! needs to know about a machine goes through the [`Machine`] trait.

mod frame;
mod input;
mod machine;
mod palette;

pub use frame::FrameBuffer;
pub use input::{ConsoleSwitch, ControllerAction, InputState, MachineInput};
pub use machine::{Controller, GameProgram, Machine, MachineFactory, MachineType};
pub use palette::{PALETTE_SIZE, Palette};
