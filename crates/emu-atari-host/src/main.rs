//! Atari host binary.
//!
//! Opens a window, runs the demo machine (or snow) on the host's worker
//! thread and shows the shared frame. Keys and gamepads are forwarded as
//! host input; see [`emu_atari_host::keymap`] for the layout.
//!
//! pixels always scales its texture nearest-neighbour, so the session's
//! interpolation mode is only recorded with the session and shown in the
//! title.

use std::collections::HashSet;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::{Duration, Instant};

use atari_host::{
    AudioOutput, HEIGHT, Host, HostConfig, HostState, InputEvent, InterpolationMode, SharedFrame,
    WIDTH,
};
use clap::Parser;
use emu_atari_host::audio::CpalDriver;
use emu_atari_host::gamepad::Gamepads;
use emu_atari_host::keymap::{FrontendCommand, KeyAction, map_keycode};
use emu_atari_host::{DemoFactory, FileStore, config, display};
use emu_core::{Controller, GameProgram, MachineType};
use log::{error, info};
use pixels::{Pixels, SurfaceTexture};
use winit::application::ApplicationHandler;
use winit::dpi::LogicalSize;
use winit::event::{ElementState, MouseButton, WindowEvent};
use winit::event_loop::{ActiveEventLoop, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{Window, WindowAttributes, WindowId};

#[derive(Parser, Debug)]
#[command(name = "emu-atari-host")]
#[command(about = "Real-time host for Atari 2600/7800 machines")]
struct Args {
    /// Game id; selects the saved session directory.
    #[arg(long, default_value = "demo")]
    game: String,

    /// Machine type: a2600-ntsc, a2600-pal, a7800-ntsc, a7800-pal.
    #[arg(long, default_value = "a2600-ntsc")]
    machine: MachineType,

    /// Controller in the left jack.
    #[arg(long, default_value = "joystick")]
    left: Controller,

    /// Controller in the right jack.
    #[arg(long, default_value = "joystick")]
    right: Controller,

    /// Show snow instead of running a machine.
    #[arg(long)]
    snow: bool,

    /// Ignore any saved session.
    #[arg(long)]
    fresh: bool,

    /// Start with sound off.
    #[arg(long)]
    mute: bool,

    /// JSON host configuration file.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Directory for saved sessions.
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Initial window scale.
    #[arg(long, default_value_t = 3)]
    scale: u32,
}

struct App {
    host: Host,
    frame: Arc<SharedFrame>,
    scratch: Vec<u8>,
    title: String,
    scale: u32,
    window: Option<&'static Window>,
    pixels: Option<Pixels<'static>>,
    gamepads: Option<Gamepads>,
    keys_down: HashSet<KeyCode>,
    cursor: (i32, i32),
    last_title_update: Instant,
    failed: bool,
}

impl App {
    fn new(host: Host, title: String, scale: u32) -> Self {
        Self {
            frame: host.frame(),
            host,
            scratch: vec![0; WIDTH * HEIGHT * 4],
            title,
            scale: scale.max(1),
            window: None,
            pixels: None,
            gamepads: Gamepads::new(),
            keys_down: HashSet::new(),
            cursor: (0, 0),
            last_title_update: Instant::now(),
            failed: false,
        }
    }

    fn command(&self, event_loop: &ActiveEventLoop, command: FrontendCommand) {
        let host = &self.host;
        match command {
            FrontendCommand::TogglePause => host.set_paused(!host.is_paused()),
            FrontendCommand::ToggleSound => host.set_sound_on(!host.is_sound_on()),
            FrontendCommand::ToggleDarkerPalette => {
                if host.is_darker_palette() {
                    host.switch_to_normal_palette();
                } else {
                    host.switch_to_darker_palette();
                }
            }
            FrontendCommand::SwapJacks => info!("jacks swapped: {}", host.swap_jacks()),
            FrontendCommand::SwapLeftPaddles => {
                info!("left paddles swapped: {}", host.swap_left_paddles());
            }
            FrontendCommand::SwapRightPaddles => {
                info!("right paddles swapped: {}", host.swap_right_paddles());
            }
            FrontendCommand::NextKeyboardPlayer => {
                let next = (host.keyboard_player() + 1) % 4;
                host.set_keyboard_player(next);
                info!("keyboard is player {}", next + 1);
            }
            FrontendCommand::ToggleInterpolation => {
                let mode = host.interpolation().toggled();
                host.set_interpolation(mode);
                info!("interpolation {mode:?}");
            }
            FrontendCommand::Quit => event_loop.exit(),
        }
    }

    fn handle_key(&mut self, event_loop: &ActiveEventLoop, keycode: KeyCode, pressed: bool) {
        // Drop auto-repeat so each press is forwarded once.
        if pressed && !self.keys_down.insert(keycode) {
            return;
        }
        if !pressed {
            self.keys_down.remove(&keycode);
        }
        match map_keycode(keycode) {
            Some(KeyAction::Key(key)) => self.host.input(InputEvent::Key { key, down: pressed }),
            Some(KeyAction::Machine(input)) => {
                self.host.input(InputEvent::Machine { input, down: pressed });
            }
            Some(KeyAction::Command(command)) if pressed => self.command(event_loop, command),
            _ => {}
        }
    }

    fn screen_resized(&self, width: u32, height: u32) {
        let (location, size) = display::screen_rect(width, height);
        self.host.input(InputEvent::ScreenResized { location, size });
    }

    fn update_pixels(&mut self) {
        let Some(pixels) = self.pixels.as_mut() else {
            return;
        };
        if self.frame.copy_out(&mut self.scratch) {
            display::bgra_to_rgba(&self.scratch, pixels.frame_mut());
        }
    }

    fn update_title(&mut self) {
        let Some(window) = self.window else {
            return;
        };
        if self.last_title_update.elapsed() < Duration::from_secs(1) {
            return;
        }
        self.last_title_update = Instant::now();
        let host = &self.host;
        let mut title = format!(
            "{} - {} fps, idle {:.0}%, audio {}",
            self.title,
            host.current_frame_rate(),
            host.frame_idle_time() * 100.0,
            host.buffers_queued()
        );
        if host.interpolation() == InterpolationMode::Linear {
            title.push_str(" [linear]");
        }
        if host.is_paused() {
            title.push_str(" [paused]");
        }
        window.set_title(&title);
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let window_size = LogicalSize::new(WIDTH as u32 * self.scale, HEIGHT as u32 * self.scale);
        let attrs = WindowAttributes::default()
            .with_title(self.title.clone())
            .with_inner_size(window_size);

        let window = match event_loop.create_window(attrs) {
            Ok(window) => window,
            Err(e) => {
                error!("failed to create window: {e}");
                self.failed = true;
                event_loop.exit();
                return;
            }
        };
        let window: &'static Window = Box::leak(Box::new(window));
        let inner = window.inner_size();
        let surface = SurfaceTexture::new(inner.width, inner.height, window);
        match Pixels::new(WIDTH as u32, HEIGHT as u32, surface) {
            Ok(pixels) => self.pixels = Some(pixels),
            Err(e) => {
                error!("failed to create pixels: {e}");
                self.failed = true;
                event_loop.exit();
                return;
            }
        }
        self.window = Some(window);
        self.screen_resized(inner.width, inner.height);
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _window_id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => event_loop.exit(),
            WindowEvent::Resized(size) => {
                if size.width > 0 && size.height > 0 {
                    if let Some(pixels) = self.pixels.as_mut() {
                        if let Err(e) = pixels.resize_surface(size.width, size.height) {
                            error!("resize failed: {e}");
                        }
                    }
                    self.screen_resized(size.width, size.height);
                }
            }
            WindowEvent::KeyboardInput { event, .. } => {
                if let PhysicalKey::Code(keycode) = event.physical_key {
                    self.handle_key(event_loop, keycode, event.state == ElementState::Pressed);
                }
            }
            WindowEvent::CursorMoved { position, .. } => {
                let (x, y) = (position.x as i32, position.y as i32);
                let (dx, dy) = (x - self.cursor.0, y - self.cursor.1);
                self.cursor = (x, y);
                self.host.input(InputEvent::MouseMoved { x, y, dx, dy });
            }
            WindowEvent::MouseInput {
                state,
                button: MouseButton::Left,
                ..
            } => {
                let (x, y) = self.cursor;
                self.host.input(InputEvent::MouseButton {
                    x,
                    y,
                    down: state == ElementState::Pressed,
                });
            }
            WindowEvent::RedrawRequested => {
                self.update_pixels();
                if let Some(pixels) = self.pixels.as_ref() {
                    if let Err(e) = pixels.render() {
                        error!("render error: {e}");
                        event_loop.exit();
                    }
                }
            }
            _ => {}
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        if let Some(pads) = self.gamepads.as_mut() {
            for event in pads.poll() {
                self.host.input(event);
            }
        }
        if self.host.state() == HostState::Idle && self.host.has_failed() {
            error!("session failed to start");
            self.failed = true;
            event_loop.exit();
            return;
        }
        self.update_title();
        if let Some(window) = self.window {
            window.request_redraw();
        }
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        if !self.host.stop() {
            error!("host did not stop cleanly");
        }
    }
}

fn main() -> ExitCode {
    env_logger::init();
    let args = Args::parse();

    let host_config = match &args.config {
        Some(path) => match config::load(path) {
            Ok(c) => c,
            Err(e) => {
                error!("{e}");
                return ExitCode::FAILURE;
            }
        },
        None => HostConfig::default(),
    };
    let data_dir = args.data_dir.clone().unwrap_or_else(config::default_data_dir);
    info!("sessions stored under {}", data_dir.display());

    let host = Host::new(
        host_config,
        Arc::new(DemoFactory),
        Arc::new(FileStore::new(data_dir)),
        AudioOutput::new(Box::new(CpalDriver::new())),
    );

    let (started, title) = if args.snow {
        (host.start_snow(), "emu-atari-host - snow".to_string())
    } else {
        let program = GameProgram::new(args.game.clone(), args.machine)
            .with_controllers(args.left, args.right);
        let title = format!("emu-atari-host - {} ({})", program.id, program.machine_type);
        (host.start(program, args.fresh), title)
    };
    if !started {
        error!("host failed to start");
        return ExitCode::FAILURE;
    }
    if args.mute {
        host.set_sound_on(false);
    }

    let event_loop = match EventLoop::new() {
        Ok(el) => el,
        Err(e) => {
            error!("failed to create event loop: {e}");
            return ExitCode::FAILURE;
        }
    };
    let mut app = App::new(host, title, args.scale);
    if let Err(e) = event_loop.run_app(&mut app) {
        error!("event loop error: {e}");
        return ExitCode::FAILURE;
    }
    if app.failed {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}
