//! Host lifecycle tests against a scripted machine.
//!
//! The machine fills each frame with a running counter and a sample ramp
//! and reports the fire button it sampled; the audio driver and session
//! store record every call so the tests can check what the worker did.

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use atari_host::{
    AudioDriver, AudioError, AudioOutput, Host, HostConfig, HostState, InputEvent,
    InterpolationMode, KeyboardKey, PersistRequest, RestoredSession, SessionSettings, SessionStore, StoreError,
};
use emu_core::{
    ControllerAction, FrameBuffer, GameProgram, InputState, Machine, MachineFactory, MachineType,
};

struct ScriptedMachine {
    input: InputState,
    palette: Vec<u32>,
    frames: u32,
    frame_delay: Duration,
    fire_seen: Arc<AtomicBool>,
    frames_run: Arc<AtomicU32>,
}

impl Machine for ScriptedMachine {
    fn machine_type(&self) -> MachineType {
        MachineType::A2600Ntsc
    }

    fn frame_hz(&self) -> u32 {
        60
    }

    fn first_scanline(&self) -> usize {
        0
    }

    fn palette(&self) -> &[u32] {
        &self.palette
    }

    fn input_state(&self) -> &InputState {
        &self.input
    }

    fn input_state_mut(&mut self) -> &mut InputState {
        &mut self.input
    }

    fn create_frame_buffer(&self) -> FrameBuffer {
        FrameBuffer::new(160, 230)
    }

    fn compute_next_frame(&mut self, frame: &mut FrameBuffer) {
        self.input.capture();
        if self.input.sample_action(0, ControllerAction::Trigger) {
            self.fire_seen.store(true, Ordering::SeqCst);
        }
        thread::sleep(self.frame_delay);
        self.frames += 1;
        frame.video.fill((self.frames % 200) as u8 + 2);
        for (i, sample) in frame.sound.iter_mut().enumerate() {
            *sample = i as u8;
        }
        self.frames_run.fetch_add(1, Ordering::SeqCst);
    }

    fn save_state(&self) -> Option<Vec<u8>> {
        Some(self.frames.to_le_bytes().to_vec())
    }
}

#[derive(Default)]
struct ScriptedFactory {
    fail: bool,
    frame_delay: Duration,
    fire_seen: Arc<AtomicBool>,
    frames_run: Arc<AtomicU32>,
}

impl ScriptedFactory {
    fn machine(&self, frames: u32) -> Box<dyn Machine> {
        Box::new(ScriptedMachine {
            input: InputState::default(),
            palette: (0..256u32).map(|i| (i << 16) | (i << 8) | i).collect(),
            frames,
            frame_delay: self.frame_delay,
            fire_seen: Arc::clone(&self.fire_seen),
            frames_run: Arc::clone(&self.frames_run),
        })
    }
}

impl MachineFactory for ScriptedFactory {
    fn create(&self, _program: &GameProgram) -> Option<Box<dyn Machine>> {
        (!self.fail).then(|| self.machine(0))
    }

    fn restore(&self, _program: &GameProgram, state: &[u8]) -> Option<Box<dyn Machine>> {
        let bytes: [u8; 4] = state.try_into().ok()?;
        Some(self.machine(u32::from_le_bytes(bytes)))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum AudioCall {
    Open(u32, usize, usize),
    Submit(usize),
    Close,
}

struct RecordingDriver {
    calls: Arc<Mutex<Vec<AudioCall>>>,
    last_buffer: Arc<Mutex<Vec<u8>>>,
    /// While set, `submit` spins like a wedged device.
    submit_blocked: Arc<AtomicBool>,
}

impl AudioDriver for RecordingDriver {
    fn open(&mut self, sample_rate: u32, buffer_len: usize, queue_len: usize) -> Result<(), AudioError> {
        self.calls
            .lock()
            .expect("calls")
            .push(AudioCall::Open(sample_rate, buffer_len, queue_len));
        Ok(())
    }

    fn buffers_queued(&self) -> usize {
        3
    }

    fn submit(&mut self, buffer: &[u8]) {
        self.calls.lock().expect("calls").push(AudioCall::Submit(buffer.len()));
        *self.last_buffer.lock().expect("buffer") = buffer.to_vec();
        while self.submit_blocked.load(Ordering::SeqCst) {
            thread::sleep(Duration::from_millis(1));
        }
    }

    fn close(&mut self) {
        self.calls.lock().expect("calls").push(AudioCall::Close);
    }
}

#[derive(Debug, Clone)]
struct Persisted {
    settings: SessionSettings,
    machine_state: Option<Vec<u8>>,
    snapshot_len: usize,
}

#[derive(Default)]
struct MemoryStore {
    saved: Mutex<Option<RestoredSession>>,
    persisted: Mutex<Vec<Persisted>>,
}

impl SessionStore for MemoryStore {
    fn restore(&self, _program: &GameProgram) -> Option<RestoredSession> {
        self.saved.lock().expect("saved").clone()
    }

    fn persist(&self, request: PersistRequest<'_>) -> Result<(), StoreError> {
        self.persisted.lock().expect("persisted").push(Persisted {
            settings: request.settings.clone(),
            machine_state: request.machine_state.map(<[u8]>::to_vec),
            snapshot_len: request.snapshot.len(),
        });
        Ok(())
    }
}

struct Fixture {
    host: Host,
    factory: Arc<ScriptedFactory>,
    store: Arc<MemoryStore>,
    audio_calls: Arc<Mutex<Vec<AudioCall>>>,
    last_buffer: Arc<Mutex<Vec<u8>>>,
    submit_blocked: Arc<AtomicBool>,
}

fn fixture(factory: ScriptedFactory, store: MemoryStore) -> Fixture {
    fixture_with_config(factory, store, HostConfig::default())
}

fn fixture_with_config(factory: ScriptedFactory, store: MemoryStore, config: HostConfig) -> Fixture {
    let factory = Arc::new(factory);
    let store = Arc::new(store);
    let audio_calls = Arc::new(Mutex::new(Vec::new()));
    let last_buffer = Arc::new(Mutex::new(Vec::new()));
    let submit_blocked = Arc::new(AtomicBool::new(false));
    let driver = RecordingDriver {
        calls: Arc::clone(&audio_calls),
        last_buffer: Arc::clone(&last_buffer),
        submit_blocked: Arc::clone(&submit_blocked),
    };
    let host = Host::new(
        config,
        Arc::clone(&factory) as Arc<dyn MachineFactory>,
        Arc::clone(&store) as Arc<dyn SessionStore>,
        AudioOutput::new(Box::new(driver)),
    );
    Fixture {
        host,
        factory,
        store,
        audio_calls,
        last_buffer,
        submit_blocked,
    }
}

fn short_stop_timeout() -> HostConfig {
    HostConfig {
        stop_timeout_ms: 100,
        ..HostConfig::default()
    }
}

fn program() -> GameProgram {
    GameProgram::new("test-cart", MachineType::A2600Ntsc)
}

fn wait_for(what: &str, mut cond: impl FnMut() -> bool) {
    let deadline = Instant::now() + Duration::from_secs(5);
    while !cond() {
        assert!(Instant::now() < deadline, "timed out waiting for {what}");
        thread::sleep(Duration::from_millis(5));
    }
}

#[test]
fn stop_closes_audio_and_persists_once() {
    let f = fixture(ScriptedFactory::default(), MemoryStore::default());
    assert!(f.host.start(program(), false));
    wait_for("frames", || f.factory.frames_run.load(Ordering::SeqCst) >= 5);
    assert_eq!(f.host.state(), HostState::Running);

    assert!(f.host.stop());
    assert_eq!(f.host.state(), HostState::Idle);

    let persisted = f.store.persisted.lock().expect("persisted");
    assert_eq!(persisted.len(), 1);
    let saved = &persisted[0];
    assert_eq!(saved.settings.current_player_no, 1);
    assert_eq!(saved.settings.frames_per_second, 60);
    assert!(!saved.settings.sound_off);
    assert!(saved.machine_state.is_some());
    assert_eq!(saved.snapshot_len, 320 * 230 * 4);

    let calls = f.audio_calls.lock().expect("calls");
    assert_eq!(calls.first(), Some(&AudioCall::Open(460 * 60, 460, 8)));
    assert_eq!(calls.last(), Some(&AudioCall::Close));
    assert!(calls.contains(&AudioCall::Submit(460)));
}

#[test]
fn stop_mid_frame_still_persists_once() {
    let factory = ScriptedFactory {
        frame_delay: Duration::from_millis(40),
        ..ScriptedFactory::default()
    };
    let f = fixture(factory, MemoryStore::default());
    assert!(f.host.start(program(), false));
    wait_for("first frame", || f.factory.frames_run.load(Ordering::SeqCst) >= 1);
    thread::sleep(Duration::from_millis(10));

    assert!(f.host.stop());
    assert_eq!(f.store.persisted.lock().expect("persisted").len(), 1);
    assert_eq!(
        f.audio_calls.lock().expect("calls").last(),
        Some(&AudioCall::Close)
    );

    // A second stop has nothing left to do.
    assert!(f.host.stop());
    assert_eq!(f.store.persisted.lock().expect("persisted").len(), 1);
}

#[test]
fn machine_samples_reach_the_driver_unchanged() {
    let f = fixture(ScriptedFactory::default(), MemoryStore::default());
    assert!(f.host.start(program(), true));
    wait_for("submit", || {
        f.audio_calls.lock().expect("calls").contains(&AudioCall::Submit(460))
    });
    assert!(f.host.stop());

    let expected: Vec<u8> = (0..460).map(|i| i as u8).collect();
    assert_eq!(*f.last_buffer.lock().expect("buffer"), expected);
}

#[test]
fn stop_timeout_closes_audio_and_stays_draining() {
    let factory = ScriptedFactory {
        frame_delay: Duration::from_millis(600),
        ..ScriptedFactory::default()
    };
    let f = fixture_with_config(factory, MemoryStore::default(), short_stop_timeout());
    assert!(f.host.start(program(), true));
    wait_for("first frame", || f.factory.frames_run.load(Ordering::SeqCst) >= 1);
    // Well inside the second frame.
    thread::sleep(Duration::from_millis(60));

    let started = Instant::now();
    assert!(!f.host.stop());
    assert!(started.elapsed() < Duration::from_millis(400));
    assert_eq!(f.host.state(), HostState::Draining);
    assert_eq!(
        f.audio_calls.lock().expect("calls").last(),
        Some(&AudioCall::Close)
    );
    assert!(!f.host.start(program(), true));

    wait_for("worker exit", || f.host.state() == HostState::Idle);
    assert_eq!(f.store.persisted.lock().expect("persisted").len(), 1);
    assert!(f.host.start(program(), true));
    wait_for("second stop", || f.host.stop());
    assert_eq!(f.store.persisted.lock().expect("persisted").len(), 2);
}

#[test]
fn stop_timeout_does_not_wait_on_a_wedged_driver() {
    let f = fixture_with_config(ScriptedFactory::default(), MemoryStore::default(), short_stop_timeout());
    f.submit_blocked.store(true, Ordering::SeqCst);
    assert!(f.host.start(program(), true));
    wait_for("submit", || {
        f.audio_calls.lock().expect("calls").contains(&AudioCall::Submit(460))
    });

    let started = Instant::now();
    assert!(!f.host.stop());
    assert!(started.elapsed() < Duration::from_secs(1));
    assert_eq!(f.host.state(), HostState::Draining);
    assert!(!f.audio_calls.lock().expect("calls").contains(&AudioCall::Close));

    f.submit_blocked.store(false, Ordering::SeqCst);
    wait_for("worker exit", || f.host.state() == HostState::Idle);
    assert_eq!(
        f.audio_calls.lock().expect("calls").last(),
        Some(&AudioCall::Close)
    );
    assert_eq!(f.store.persisted.lock().expect("persisted").len(), 1);
    assert!(f.host.stop());
}

#[test]
fn failed_initialization_returns_to_idle() {
    let factory = ScriptedFactory {
        fail: true,
        ..ScriptedFactory::default()
    };
    let f = fixture(factory, MemoryStore::default());
    assert!(f.host.start(program(), false));
    wait_for("idle", || f.host.state() == HostState::Idle);
    assert!(f.host.has_failed());
    assert!(f.host.stop());
    assert!(f.store.persisted.lock().expect("persisted").is_empty());
    assert!(f.audio_calls.lock().expect("calls").is_empty());
}

#[test]
fn start_is_rejected_while_running() {
    let f = fixture(ScriptedFactory::default(), MemoryStore::default());
    assert!(f.host.start(program(), false));
    assert!(!f.host.start(program(), false));
    assert!(!f.host.start_snow());
    assert!(f.host.stop());

    assert!(f.host.start(program(), true));
    assert!(!f.host.has_failed());
    assert!(f.host.stop());
    assert_eq!(f.store.persisted.lock().expect("persisted").len(), 2);
}

#[test]
fn restored_settings_are_applied() {
    let store = MemoryStore::default();
    *store.saved.lock().expect("saved") = Some(RestoredSession {
        settings: SessionSettings {
            current_player_no: 2,
            frames_per_second: 30,
            sound_off: true,
            ..SessionSettings::default()
        },
        machine_state: 7u32.to_le_bytes().to_vec(),
    });
    let f = fixture(ScriptedFactory::default(), store);
    assert!(f.host.start(program(), false));
    wait_for("frames", || f.factory.frames_run.load(Ordering::SeqCst) >= 2);

    assert_eq!(f.host.current_frame_rate(), 30);
    assert_eq!(f.host.keyboard_player(), 1);
    assert!(!f.host.is_sound_on());
    assert_eq!(f.host.buffers_queued(), -1);
    assert!(f.host.stop());

    let persisted = f.store.persisted.lock().expect("persisted");
    assert_eq!(persisted[0].settings.current_player_no, 2);
    assert!(persisted[0].settings.sound_off);
    let frames = u32::from_le_bytes(
        persisted[0].machine_state.clone().expect("state").try_into().expect("u32"),
    );
    assert!(frames > 7);
    assert!(f.audio_calls.lock().expect("calls").is_empty());
}

#[test]
fn keyboard_input_reaches_the_machine() {
    let f = fixture(ScriptedFactory::default(), MemoryStore::default());
    assert!(f.host.start(program(), true));
    wait_for("running", || f.host.state() == HostState::Running);
    f.host.input(InputEvent::Key {
        key: KeyboardKey::Z,
        down: true,
    });
    wait_for("fire", || f.factory.fire_seen.load(Ordering::SeqCst));
    assert!(f.host.stop());
}

#[test]
fn interpolation_toggle_is_published_and_saved() {
    let f = fixture(ScriptedFactory::default(), MemoryStore::default());
    assert!(f.host.start(program(), true));
    wait_for("running", || f.host.state() == HostState::Running);
    f.host.set_interpolation(f.host.interpolation().toggled());
    wait_for("linear", || f.host.interpolation() == InterpolationMode::Linear);
    assert!(f.host.stop());

    let persisted = f.store.persisted.lock().expect("persisted");
    assert_eq!(persisted[0].settings.interpolation_mode, InterpolationMode::Linear);
}

#[test]
fn jack_swaps_report_state() {
    let f = fixture(ScriptedFactory::default(), MemoryStore::default());
    assert!(!f.host.swap_jacks());
    assert!(f.host.start(program(), true));
    wait_for("running", || f.host.state() == HostState::Running);
    assert!(f.host.swap_jacks());
    assert!(!f.host.swap_jacks());
    assert!(f.host.stop());
}

#[test]
fn frame_is_rendered_and_marked_updated() {
    let f = fixture(ScriptedFactory::default(), MemoryStore::default());
    let frame = f.host.frame();
    assert!(f.host.start(program(), true));
    wait_for("frames", || f.factory.frames_run.load(Ordering::SeqCst) >= 3);
    let mut pixels = vec![0; 320 * 230 * 4];
    wait_for("update", || frame.copy_out(&mut pixels));
    assert!(pixels.chunks_exact(4).any(|px| px[0] != 0));
    assert!(f.host.stop());
}

#[test]
fn snow_fills_grey_noise() {
    let f = fixture(ScriptedFactory::default(), MemoryStore::default());
    assert!(f.host.start_snow());
    wait_for("running", || f.host.state() == HostState::Running);
    let frame = f.host.frame();
    let mut pixels = vec![0; 320 * 230 * 4];
    wait_for("noise", || {
        frame.copy_out(&mut pixels);
        pixels.chunks_exact(4).any(|px| px[0] != 0)
    });
    assert!(pixels
        .chunks_exact(4)
        .all(|px| px[0] == px[1] && px[1] == px[2] && px[0] < 0xC0 && px[3] == 0xFF));
    assert_eq!(f.host.current_frame_rate(), 60);
    assert!(f.host.stop());
    assert!(f.store.persisted.lock().expect("persisted").is_empty());
}
