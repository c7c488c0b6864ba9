//! Session persistence on the local filesystem.
//!
//! Each game gets a directory under the data root named after its id:
//!
//! - `settings.json` holds the [`SessionSettings`]
//! - `state.bin` holds the machine's saved state
//! - `snapshot.png` holds the last displayed frame

use std::fs;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use atari_host::{
    HEIGHT, PersistRequest, RestoredSession, SessionSettings, SessionStore, StoreError, WIDTH,
};
use emu_core::GameProgram;
use log::{debug, warn};

use crate::display::bgra_to_rgba;

const SETTINGS_FILE: &str = "settings.json";
const STATE_FILE: &str = "state.bin";
const SNAPSHOT_FILE: &str = "snapshot.png";

#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory holding `program`'s files. Characters outside
    /// `[A-Za-z0-9._-]` in the id are replaced with `_`.
    #[must_use]
    pub fn game_dir(&self, program: &GameProgram) -> PathBuf {
        let name: String = program
            .id
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        let name = if name.is_empty() || name.chars().all(|c| c == '.') {
            "_".to_string()
        } else {
            name
        };
        self.root.join(name)
    }

    fn read(&self, program: &GameProgram) -> Result<RestoredSession, StoreError> {
        let dir = self.game_dir(program);
        let json = fs::read_to_string(dir.join(SETTINGS_FILE))?;
        let settings: SessionSettings =
            serde_json::from_str(&json).map_err(|e| StoreError::Encode(e.to_string()))?;
        let machine_state = fs::read(dir.join(STATE_FILE))?;
        Ok(RestoredSession {
            settings,
            machine_state,
        })
    }
}

impl SessionStore for FileStore {
    fn restore(&self, program: &GameProgram) -> Option<RestoredSession> {
        match self.read(program) {
            Ok(session) => {
                debug!("restored {} from {}", program.id, self.game_dir(program).display());
                Some(session)
            }
            Err(StoreError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => None,
            Err(e) => {
                warn!("ignoring saved session for {}: {e}", program.id);
                None
            }
        }
    }

    fn persist(&self, request: PersistRequest<'_>) -> Result<(), StoreError> {
        let dir = self.game_dir(request.program);
        fs::create_dir_all(&dir)?;

        let json = serde_json::to_string_pretty(request.settings)
            .map_err(|e| StoreError::Encode(e.to_string()))?;
        fs::write(dir.join(SETTINGS_FILE), json)?;

        let state_path = dir.join(STATE_FILE);
        match request.machine_state {
            Some(state) => fs::write(&state_path, state)?,
            None => {
                if state_path.exists() {
                    fs::remove_file(&state_path)?;
                }
            }
        }

        write_snapshot(&dir.join(SNAPSHOT_FILE), request.snapshot)
    }
}

/// Encode a BGRA frame as an RGBA PNG.
pub fn write_snapshot(path: &Path, bgra: &[u8]) -> Result<(), StoreError> {
    if bgra.len() != WIDTH * HEIGHT * 4 {
        return Err(StoreError::Encode(format!(
            "snapshot is {} bytes, expected {}",
            bgra.len(),
            WIDTH * HEIGHT * 4
        )));
    }
    let file = fs::File::create(path)?;
    let mut encoder = png::Encoder::new(BufWriter::new(file), WIDTH as u32, HEIGHT as u32);
    encoder.set_color(png::ColorType::Rgba);
    encoder.set_depth(png::BitDepth::Eight);
    let mut writer = encoder
        .write_header()
        .map_err(|e| StoreError::Encode(e.to_string()))?;

    let mut rgba = vec![0; bgra.len()];
    bgra_to_rgba(bgra, &mut rgba);
    writer
        .write_image_data(&rgba)
        .map_err(|e| StoreError::Encode(e.to_string()))
}
