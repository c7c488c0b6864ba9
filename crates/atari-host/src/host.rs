//! The host handle: starts and stops the worker thread and forwards input
//! and toggles to it.
//!
//! All methods take `&self`, so one `Host` can be shared between the event
//! loop and the display. Everything the worker owns stays on the worker;
//! callers only see the shared pixel buffer and a few published counters.

use std::sync::atomic::{AtomicBool, AtomicI32, AtomicU8, AtomicU32, AtomicUsize, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::{Arc, Mutex, MutexGuard, TryLockError};
use std::thread::{self, JoinHandle};

use emu_core::{GameProgram, MachineFactory};
use log::{error, info, warn};

use crate::audio::AudioOutput;
use crate::config::HostConfig;
use crate::input::{ControllerBindings, InputEvent, Point, Size};
use crate::lock;
use crate::session::{self, SessionContext};
use crate::shared_frame::SharedFrame;
use crate::snow;
use crate::store::{InterpolationMode, SessionStore};

/// Worker lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum HostState {
    Idle,
    Initializing,
    Running,
    Draining,
}

impl HostState {
    const fn from_u8(v: u8) -> Self {
        match v {
            1 => Self::Initializing,
            2 => Self::Running,
            3 => Self::Draining,
            _ => Self::Idle,
        }
    }
}

/// Requests applied by the worker at the top of its next frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum HostCommand {
    Input(InputEvent),
    SetPaused(bool),
    SetSoundOn(bool),
    SetDarkerPalette(bool),
    SetBindings(ControllerBindings),
    SetKeyboardPlayer(usize),
    ProposeFrameRate(u32),
    SetInterpolation(InterpolationMode),
    SetTouchMode(bool),
}

/// State visible to both the worker and the controlling threads.
#[derive(Debug)]
pub(crate) struct Shared {
    state: AtomicU8,
    pub(crate) stop: AtomicBool,
    failed: AtomicBool,
    pub(crate) current_frame_rate: AtomicU32,
    pub(crate) max_frame_rate: AtomicU32,
    pub(crate) buffers_queued: AtomicI32,
    frame_idle_time: AtomicU32,
    pub(crate) paused: AtomicBool,
    pub(crate) sound_on: AtomicBool,
    pub(crate) darker: AtomicBool,
    pub(crate) keyboard_player: AtomicUsize,
    interpolation: AtomicU8,
    pub(crate) bindings: Mutex<ControllerBindings>,
    /// Last reported screen geometry, replayed to new sessions.
    pub(crate) screen: Mutex<Option<(Point, Size)>>,
}

impl Shared {
    fn new() -> Self {
        Self {
            state: AtomicU8::new(HostState::Idle as u8),
            stop: AtomicBool::new(false),
            failed: AtomicBool::new(false),
            current_frame_rate: AtomicU32::new(0),
            max_frame_rate: AtomicU32::new(0),
            buffers_queued: AtomicI32::new(-1),
            frame_idle_time: AtomicU32::new(0),
            paused: AtomicBool::new(false),
            sound_on: AtomicBool::new(true),
            darker: AtomicBool::new(false),
            keyboard_player: AtomicUsize::new(0),
            interpolation: AtomicU8::new(0),
            bindings: Mutex::new(ControllerBindings::new()),
            screen: Mutex::new(None),
        }
    }

    pub(crate) fn state(&self) -> HostState {
        HostState::from_u8(self.state.load(Ordering::Acquire))
    }

    fn transition(&self, from: HostState, to: HostState) -> bool {
        self.state
            .compare_exchange(from as u8, to as u8, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    /// Initialization finished; fails if a stop already began draining.
    pub(crate) fn mark_running(&self) -> bool {
        self.transition(HostState::Initializing, HostState::Running)
    }

    pub(crate) fn mark_idle(&self) {
        self.state.store(HostState::Idle as u8, Ordering::Release);
    }

    pub(crate) fn mark_failed(&self) {
        self.failed.store(true, Ordering::Release);
    }

    pub(crate) fn stop_requested(&self) -> bool {
        self.stop.load(Ordering::Acquire)
    }

    pub(crate) fn set_frame_idle_time(&self, idle: f32) {
        self.frame_idle_time.store(idle.to_bits(), Ordering::Relaxed);
    }

    pub(crate) fn set_interpolation(&self, mode: InterpolationMode) {
        self.interpolation.store(mode as u8, Ordering::Relaxed);
    }

    pub(crate) fn bindings(&self) -> MutexGuard<'_, ControllerBindings> {
        lock(&self.bindings)
    }
}

struct Worker {
    handle: JoinHandle<()>,
    done: Receiver<()>,
}

pub struct Host {
    config: HostConfig,
    factory: Arc<dyn MachineFactory>,
    store: Arc<dyn SessionStore>,
    audio: Arc<Mutex<AudioOutput>>,
    frame: Arc<SharedFrame>,
    shared: Arc<Shared>,
    commands: Mutex<Option<Sender<HostCommand>>>,
    worker: Mutex<Option<Worker>>,
}

impl Host {
    #[must_use]
    pub fn new(
        config: HostConfig,
        factory: Arc<dyn MachineFactory>,
        store: Arc<dyn SessionStore>,
        audio: AudioOutput,
    ) -> Self {
        Self {
            config,
            factory,
            store,
            audio: Arc::new(Mutex::new(audio)),
            frame: Arc::new(SharedFrame::new()),
            shared: Arc::new(Shared::new()),
            commands: Mutex::new(None),
            worker: Mutex::new(None),
        }
    }

    /// The pixel buffer the display copies from.
    #[must_use]
    pub fn frame(&self) -> Arc<SharedFrame> {
        Arc::clone(&self.frame)
    }

    #[must_use]
    pub fn state(&self) -> HostState {
        self.shared.state()
    }

    /// Whether the last session failed to initialize.
    #[must_use]
    pub fn has_failed(&self) -> bool {
        self.shared.failed.load(Ordering::Acquire)
    }

    /// Start a session for `program`, restoring saved state unless
    /// `start_fresh`. Returns `false` while another session is active or
    /// still draining.
    pub fn start(&self, program: GameProgram, start_fresh: bool) -> bool {
        let config = self.config.clone();
        let factory = Arc::clone(&self.factory);
        let store = Arc::clone(&self.store);
        self.spawn("atari-host", move |ctx| {
            session::run(ctx, &config, factory.as_ref(), store.as_ref(), &program, start_fresh);
        })
    }

    /// Start the no-machine noise loop.
    pub fn start_snow(&self) -> bool {
        let policy = self.config.pacing.clone();
        let queue_len = self.config.audio_queue_len;
        self.spawn("atari-snow", move |ctx| snow::run(ctx, &policy, queue_len))
    }

    fn spawn(&self, name: &str, body: impl FnOnce(SessionContext) + Send + 'static) -> bool {
        let mut worker = lock(&self.worker);
        if !self.shared.transition(HostState::Idle, HostState::Initializing) {
            return false;
        }
        if let Some(old) = worker.take() {
            // A worker that outlived a stop timeout; it has finished by now.
            let _ = old.handle.join();
        }
        self.shared.stop.store(false, Ordering::Release);
        self.shared.failed.store(false, Ordering::Release);
        self.frame.clear();

        let (command_tx, command_rx) = mpsc::channel();
        let (done_tx, done_rx) = mpsc::channel();
        let ctx = SessionContext {
            shared: Arc::clone(&self.shared),
            frame: Arc::clone(&self.frame),
            audio: Arc::clone(&self.audio),
            commands: command_rx,
        };
        let shared = Arc::clone(&self.shared);
        let spawned = thread::Builder::new().name(name.to_string()).spawn(move || {
            body(ctx);
            shared.mark_idle();
            let _ = done_tx.send(());
        });
        match spawned {
            Ok(handle) => {
                *lock(&self.commands) = Some(command_tx);
                *worker = Some(Worker {
                    handle,
                    done: done_rx,
                });
                info!("{name} worker started");
                true
            }
            Err(e) => {
                error!("failed to spawn {name} worker: {e}");
                self.shared.mark_failed();
                self.shared.mark_idle();
                false
            }
        }
    }

    /// Stop the session and wait for the worker to persist and exit.
    ///
    /// Returns `false` when the worker did not finish within the stop
    /// timeout. The audio output is then closed from this thread unless
    /// the worker is inside a device call, and the host stays `Draining`
    /// until the worker exits on its own.
    pub fn stop(&self) -> bool {
        let mut guard = lock(&self.worker);
        let Some(worker) = guard.take() else {
            return true;
        };
        self.shared.stop.store(true, Ordering::Release);
        if !self.shared.transition(HostState::Running, HostState::Draining) {
            self.shared.transition(HostState::Initializing, HostState::Draining);
        }
        *lock(&self.commands) = None;

        match worker.done.recv_timeout(self.config.stop_timeout()) {
            Ok(()) | Err(RecvTimeoutError::Disconnected) => {
                if worker.handle.join().is_err() {
                    error!("worker thread panicked");
                    self.shared.mark_failed();
                }
                self.shared.mark_idle();
                true
            }
            Err(RecvTimeoutError::Timeout) => {
                warn!("worker did not stop within {} ms", self.config.stop_timeout_ms);
                match self.audio.try_lock() {
                    Ok(mut audio) => audio.close(),
                    Err(TryLockError::Poisoned(poisoned)) => poisoned.into_inner().close(),
                    // The worker exits through `finish`, which closes the device.
                    Err(TryLockError::WouldBlock) => warn!("audio busy on the worker; not closed"),
                }
                *guard = Some(worker);
                false
            }
        }
    }

    fn send(&self, command: HostCommand) {
        if let Some(tx) = lock(&self.commands).as_ref() {
            let _ = tx.send(command);
        }
    }

    /// Forward a raw input event to the active session.
    pub fn input(&self, event: InputEvent) {
        if let InputEvent::ScreenResized { location, size } = event {
            *lock(&self.shared.screen) = Some((location, size));
        }
        self.send(HostCommand::Input(event));
    }

    pub fn set_paused(&self, paused: bool) {
        self.send(HostCommand::SetPaused(paused));
    }

    pub fn set_sound_on(&self, on: bool) {
        self.send(HostCommand::SetSoundOn(on));
    }

    pub fn switch_to_darker_palette(&self) {
        self.send(HostCommand::SetDarkerPalette(true));
    }

    pub fn switch_to_normal_palette(&self) {
        self.send(HostCommand::SetDarkerPalette(false));
    }

    pub fn set_keyboard_player(&self, player_no: usize) {
        self.send(HostCommand::SetKeyboardPlayer(player_no));
    }

    pub fn propose_frame_rate(&self, fps: u32) {
        self.send(HostCommand::ProposeFrameRate(fps));
    }

    pub fn set_interpolation(&self, mode: InterpolationMode) {
        self.send(HostCommand::SetInterpolation(mode));
    }

    pub fn set_touch_mode(&self, touch_mode: bool) {
        self.send(HostCommand::SetTouchMode(touch_mode));
    }

    fn update_bindings(&self, f: impl FnOnce(&mut ControllerBindings) -> bool) -> bool {
        if self.state() != HostState::Running {
            return false;
        }
        let mut bindings = self.shared.bindings();
        let swapped = f(&mut bindings);
        self.send(HostCommand::SetBindings(*bindings));
        swapped
    }

    /// Exchange the jacks of every player. Returns whether player 0 now
    /// drives the right jack.
    pub fn swap_jacks(&self) -> bool {
        self.update_bindings(ControllerBindings::swap_jacks)
    }

    pub fn swap_left_paddles(&self) -> bool {
        self.update_bindings(ControllerBindings::swap_left_paddles)
    }

    pub fn swap_right_paddles(&self) -> bool {
        self.update_bindings(ControllerBindings::swap_right_paddles)
    }

    #[must_use]
    pub fn is_paused(&self) -> bool {
        self.shared.paused.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn is_sound_on(&self) -> bool {
        self.shared.sound_on.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn is_darker_palette(&self) -> bool {
        self.shared.darker.load(Ordering::Relaxed)
    }

    /// Keyboard player, 0-based.
    #[must_use]
    pub fn keyboard_player(&self) -> usize {
        self.shared.keyboard_player.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn interpolation(&self) -> InterpolationMode {
        match self.shared.interpolation.load(Ordering::Relaxed) {
            1 => InterpolationMode::Linear,
            _ => InterpolationMode::NearestNeighbor,
        }
    }

    #[must_use]
    pub fn current_frame_rate(&self) -> u32 {
        self.shared.current_frame_rate.load(Ordering::Relaxed)
    }

    #[must_use]
    pub const fn min_frame_rate(&self) -> u32 {
        self.config.pacing.min_fps
    }

    #[must_use]
    pub fn max_frame_rate(&self) -> u32 {
        self.shared.max_frame_rate.load(Ordering::Relaxed)
    }

    /// Queued audio buffers seen by the last frame, `-1` without audio.
    #[must_use]
    pub fn buffers_queued(&self) -> i32 {
        self.shared.buffers_queued.load(Ordering::Relaxed)
    }

    /// Share of the last frame interval spent waiting; negative when late.
    #[must_use]
    pub fn frame_idle_time(&self) -> f32 {
        f32::from_bits(self.shared.frame_idle_time.load(Ordering::Relaxed))
    }
}

impl Drop for Host {
    fn drop(&mut self) {
        self.stop();
    }
}

impl std::fmt::Debug for Host {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Host")
            .field("config", &self.config)
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}
