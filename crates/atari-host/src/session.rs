//! The worker side of a machine session.
//!
//! Initialization restores or creates the machine, then the frame loop
//! runs until stop is requested: apply queued commands, poll adapters,
//! calibrate, step the machine, feed audio, render under the frame lock,
//! and wait for the deadline. On exit the audio device is closed and the
//! session is persisted once.

use std::sync::atomic::Ordering;
use std::sync::mpsc::Receiver;
use std::sync::{Arc, Mutex};
use std::time::Instant;

use emu_core::{FrameBuffer, GameProgram, Machine, MachineFactory};
use log::{debug, error, info, warn};

use crate::audio::AudioOutput;
use crate::config::{HostConfig, PacingPolicy};
use crate::error::SessionError;
use crate::host::{HostCommand, Shared};
use crate::input::{InputEvent, InputRouter};
use crate::lock;
use crate::pacing::{FrameTiming, deadline_adjustment, wait_until};
use crate::palettes::SessionPalettes;
use crate::renderer::{FrameRenderer, RenderMode};
use crate::shared_frame::SharedFrame;
use crate::store::{InterpolationMode, PersistRequest, SessionSettings, SessionStore};
use crate::timer::TimerDevice;

/// What a worker thread receives from the host.
pub(crate) struct SessionContext {
    pub(crate) shared: Arc<Shared>,
    pub(crate) frame: Arc<SharedFrame>,
    pub(crate) audio: Arc<Mutex<AudioOutput>>,
    pub(crate) commands: Receiver<HostCommand>,
}

struct Session {
    machine: Box<dyn Machine>,
    frame_buffer: FrameBuffer,
    renderer: FrameRenderer,
    palettes: SessionPalettes,
    router: InputRouter,
    timing: FrameTiming,
    timer: TimerDevice,
    policy: PacingPolicy,
    audio_queue_len: usize,
    sound_on: bool,
    paused: bool,
    interpolation: InterpolationMode,
}

pub(crate) fn run(
    ctx: SessionContext,
    config: &HostConfig,
    factory: &dyn MachineFactory,
    store: &dyn SessionStore,
    program: &GameProgram,
    start_fresh: bool,
) {
    let mut session = match Session::init(&ctx, config, factory, store, program, start_fresh) {
        Ok(session) => session,
        Err(e) => {
            error!("session failed: {e}");
            ctx.shared.mark_failed();
            return;
        }
    };
    if ctx.shared.mark_running() {
        info!(
            "running {} ({}) at {} fps",
            program.id,
            session.machine.machine_type(),
            session.timing.max_rate()
        );
    }
    session.run_frames(&ctx);
    session.finish(&ctx, store, program);
}

impl Session {
    fn init(
        ctx: &SessionContext,
        config: &HostConfig,
        factory: &dyn MachineFactory,
        store: &dyn SessionStore,
        program: &GameProgram,
        start_fresh: bool,
    ) -> Result<Self, SessionError> {
        let restored = if start_fresh { None } else { store.restore(program) };
        let restored = restored.and_then(|saved| {
            let machine = factory.restore(program, &saved.machine_state);
            if machine.is_none() {
                warn!("saved state for {} could not be restored", program.id);
            }
            machine.map(|m| (m, saved.settings))
        });
        let (mut machine, settings, calibrate) = match restored {
            Some((machine, settings)) => (machine, settings, false),
            None => {
                let machine = factory
                    .create(program)
                    .ok_or_else(|| SessionError::MachineUnavailable(program.id.clone()))?;
                (machine, SessionSettings::default(), true)
            }
        };

        let machine_type = machine.machine_type();
        let first_scanline = machine.first_scanline();
        let (left, right) = machine.controller_jacks();
        let mut router = InputRouter::for_jacks(left, right, machine_type, first_scanline);
        *ctx.shared.bindings() = *router.bindings();
        if let Some((location, size)) = *lock(&ctx.shared.screen) {
            router.dispatch(
                machine.input_state_mut(),
                InputEvent::ScreenResized { location, size },
            );
        }
        router.set_keyboard_player(
            machine.input_state_mut(),
            settings.current_player_no.saturating_sub(1),
        );

        let palettes = SessionPalettes::from_machine(machine.palette());
        if palettes.current().is_none() {
            warn!("{} has no palette; video output disabled", program.id);
        }
        let mode = RenderMode::for_machine(machine_type, config.blend_frames);
        let renderer = FrameRenderer::new(mode, first_scanline);
        let frame_buffer = machine.create_frame_buffer();

        let mut timing = FrameTiming::new(config.pacing.clone(), machine.frame_hz());
        timing.propose_rate(settings.frames_per_second);
        if calibrate {
            timing.request_calibration();
        }

        let shared = &ctx.shared;
        shared.max_frame_rate.store(timing.max_rate(), Ordering::Relaxed);
        shared.current_frame_rate.store(timing.current_rate(), Ordering::Relaxed);
        shared.sound_on.store(!settings.sound_off, Ordering::Relaxed);
        shared.paused.store(false, Ordering::Relaxed);
        shared.darker.store(false, Ordering::Relaxed);
        shared.keyboard_player.store(router.keyboard_player(), Ordering::Relaxed);
        shared.set_interpolation(settings.interpolation_mode);
        debug!("{} renderer {mode:?}, jacks {left:?}/{right:?}", program.id);

        Ok(Self {
            machine,
            frame_buffer,
            renderer,
            palettes,
            router,
            timing,
            timer: TimerDevice::new(),
            policy: config.pacing.clone(),
            audio_queue_len: config.audio_queue_len,
            sound_on: !settings.sound_off,
            paused: false,
            interpolation: settings.interpolation_mode,
        })
    }

    fn run_frames(&mut self, ctx: &SessionContext) {
        while !ctx.shared.stop_requested() {
            let start = Instant::now();

            while let Ok(command) = ctx.commands.try_recv() {
                self.apply(ctx, command);
            }
            self.timer.update();
            self.router.update(self.machine.input_state_mut(), &self.timer);

            if let Some(change) = self.timing.begin_frame(self.sound_on) {
                info!("frame rate {} -> {} fps", change.from, change.to);
                lock(&ctx.audio).close();
                ctx.shared.current_frame_rate.store(change.to, Ordering::Relaxed);
            }
            let interval = self.timing.interval();

            let queued = {
                let mut audio = lock(&ctx.audio);
                if self.sound_on && !audio.is_configured() {
                    let len = self.frame_buffer.sound.len();
                    let rate = len as u32 * self.timing.current_rate();
                    audio.configure(rate, len, self.audio_queue_len);
                }
                audio.buffers_queued()
            };
            let pacing_queued = if self.paused || !self.sound_on { -1 } else { queued };
            let deadline = deadline_adjustment(pacing_queued, interval, &self.policy).apply(start + interval);

            if !self.paused {
                self.machine.compute_next_frame(&mut self.frame_buffer);
                if self.sound_on {
                    lock(&ctx.audio).submit(&self.frame_buffer.sound);
                }
            }

            ctx.frame.with_slot(|slot| {
                self.renderer.render(self.palettes.current(), &self.frame_buffer, slot);
                slot.updated = true;
            });

            let now = Instant::now();
            self.timing.record(now - start, self.sound_on);
            let idle = if deadline >= now {
                (deadline - now).as_secs_f32()
            } else {
                -(now - deadline).as_secs_f32()
            };
            ctx.shared.set_frame_idle_time(idle / interval.as_secs_f32());
            ctx.shared.buffers_queued.store(queued, Ordering::Relaxed);

            wait_until(deadline, &ctx.shared.stop);
        }
    }

    fn apply(&mut self, ctx: &SessionContext, command: HostCommand) {
        let shared = &ctx.shared;
        match command {
            HostCommand::Input(event) => self.router.dispatch(self.machine.input_state_mut(), event),
            HostCommand::SetPaused(paused) => {
                if paused != self.paused {
                    self.paused = paused;
                    if !paused {
                        self.timing.request_calibration();
                    }
                }
                shared.paused.store(paused, Ordering::Relaxed);
            }
            HostCommand::SetSoundOn(on) => {
                self.sound_on = on;
                if on {
                    self.timing.request_calibration();
                } else {
                    lock(&ctx.audio).close();
                }
                shared.sound_on.store(on, Ordering::Relaxed);
            }
            HostCommand::SetDarkerPalette(darker) => {
                self.palettes.set_darker(darker);
                shared.darker.store(darker, Ordering::Relaxed);
            }
            HostCommand::SetBindings(bindings) => *self.router.bindings_mut() = bindings,
            HostCommand::SetKeyboardPlayer(player_no) => {
                self.router.set_keyboard_player(self.machine.input_state_mut(), player_no);
                shared.keyboard_player.store(self.router.keyboard_player(), Ordering::Relaxed);
            }
            HostCommand::ProposeFrameRate(fps) => self.timing.propose_rate(fps),
            HostCommand::SetInterpolation(mode) => {
                self.interpolation = mode;
                shared.set_interpolation(mode);
            }
            HostCommand::SetTouchMode(touch_mode) => self.router.set_touch_mode(touch_mode),
        }
    }

    fn finish(self, ctx: &SessionContext, store: &dyn SessionStore, program: &GameProgram) {
        lock(&ctx.audio).close();

        let settings = SessionSettings {
            current_player_no: self.router.keyboard_player() + 1,
            frames_per_second: self.timing.current_rate(),
            interpolation_mode: self.interpolation,
            sound_off: !self.sound_on,
        };
        let machine_state = self.machine.save_state();
        let snapshot = ctx.frame.snapshot();
        let request = PersistRequest {
            program,
            settings: &settings,
            machine_state: machine_state.as_deref(),
            snapshot: &snapshot,
        };
        match store.persist(request) {
            Ok(()) => info!("session {} saved", program.id),
            Err(e) => error!("failed to save session {}: {e}", program.id),
        }
    }
}
