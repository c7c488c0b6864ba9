//! Native frontend for the Atari host.
//!
//! Supplies the platform pieces [`atari_host::Host`] needs: a cpal audio
//! driver, a filesystem session store, winit key and gilrs pad mapping,
//! and a built-in demo machine so the window has something to run.

pub mod config;
pub mod demo;
pub mod display;
pub mod file_store;

#[cfg(feature = "native")]
pub mod audio;
#[cfg(feature = "native")]
pub mod gamepad;
#[cfg(feature = "native")]
pub mod keymap;

pub use demo::{DemoFactory, DemoMachine};
pub use file_store::FileStore;
