//! Demo machine sessions saved to and restored from disk.
//!
//! Runs the real host with the demo factory and a file store rooted in a
//! fresh temporary directory, with no audio device.

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use atari_host::{AudioOutput, Host, HostConfig, HostState, SessionSettings, SessionStore};
use emu_atari_host::{DemoFactory, FileStore};
use emu_core::{GameProgram, MachineType};

fn temp_root(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("emu-atari-host-{name}-{}", std::process::id()));
    let _ = fs::remove_dir_all(&dir);
    dir
}

fn host(root: &PathBuf) -> Host {
    Host::new(
        HostConfig::default(),
        Arc::new(DemoFactory),
        Arc::new(FileStore::new(root.clone())),
        AudioOutput::default(),
    )
}

fn run_for(host: &Host, program: GameProgram, fresh: bool, time: Duration) {
    assert!(host.start(program, fresh));
    let deadline = Instant::now() + Duration::from_secs(5);
    while host.state() != HostState::Running {
        assert!(Instant::now() < deadline, "session never started");
        thread::sleep(Duration::from_millis(5));
    }
    thread::sleep(time);
    assert!(host.stop());
}

fn saved_frames(root: &PathBuf, program: &GameProgram) -> u32 {
    let state = fs::read(FileStore::new(root.clone()).game_dir(program).join("state.bin"))
        .expect("state.bin");
    u32::from_le_bytes(state[..4].try_into().expect("frame word"))
}

#[test]
fn stop_writes_settings_state_and_snapshot() {
    let root = temp_root("write");
    let program = GameProgram::new("bars", MachineType::A2600Ntsc);
    let host = host(&root);
    run_for(&host, program.clone(), true, Duration::from_millis(100));

    let dir = FileStore::new(root.clone()).game_dir(&program);
    let settings: SessionSettings =
        serde_json::from_str(&fs::read_to_string(dir.join("settings.json")).expect("settings"))
            .expect("json");
    assert_eq!(settings.current_player_no, 1);
    assert_eq!(settings.frames_per_second, 60);
    assert!(saved_frames(&root, &program) > 0);

    let png = fs::read(dir.join("snapshot.png")).expect("snapshot");
    assert_eq!(&png[1..4], b"PNG");

    let _ = fs::remove_dir_all(&root);
}

#[test]
fn second_run_resumes_from_saved_state() {
    let root = temp_root("resume");
    let program = GameProgram::new("bars-7800", MachineType::A7800Ntsc);
    let host = host(&root);

    run_for(&host, program.clone(), true, Duration::from_millis(100));
    let first = saved_frames(&root, &program);

    run_for(&host, program.clone(), false, Duration::from_millis(100));
    let second = saved_frames(&root, &program);
    assert!(second > first, "{second} should continue from {first}");

    run_for(&host, program.clone(), true, Duration::from_millis(20));
    assert!(saved_frames(&root, &program) < second);

    let _ = fs::remove_dir_all(&root);
}

#[test]
fn missing_session_is_not_restored() {
    let root = temp_root("missing");
    let store = FileStore::new(root.clone());
    assert!(store.restore(&GameProgram::new("nothing", MachineType::A2600Pal)).is_none());
}
