//! Built-in demo machine: scrolling colour bars and a square-wave tone.
//!
//! It stands in for a real console core so the frontend can be run and
//! tested end to end. The left joystick steers the scroll, fire changes
//! the tone pitch, and the console switches behave like the real ones
//! (reset rewinds, colour/BW greys the bars).

use emu_core::{
    ConsoleSwitch, ControllerAction, FrameBuffer, GameProgram, InputState, Machine,
    MachineFactory, MachineType,
};

/// Bytes written by [`DemoMachine::save_state`].
const STATE_LEN: usize = 12;

/// Width of one colour bar in colour indices.
const BAR_WIDTH: usize = 20;

/// Square wave levels, unsigned 8-bit around the 0x80 midpoint.
const TONE_HIGH: u8 = 0x8C;
const TONE_LOW: u8 = 0x74;

/// Scanline count, first visible scanline and frame rate.
const fn timing(machine_type: MachineType) -> (usize, usize, u32) {
    match machine_type {
        MachineType::A2600Ntsc => (262, 28, 60),
        MachineType::A2600Pal => (312, 48, 50),
        MachineType::A7800Ntsc => (263, 16, 60),
        MachineType::A7800Pal => (313, 16, 50),
    }
}

/// 16 hues by 16 luminances, hue in the high nibble like the console
/// palettes. Hue 0 is grey.
fn demo_palette() -> Vec<u32> {
    (0..=255u32)
        .map(|i| {
            let hue = i >> 4;
            let lum = (i & 0x0F) * 0x11;
            if hue == 0 {
                return (lum << 16) | (lum << 8) | lum;
            }
            let angle = (hue - 1) as f32 / 15.0 * std::f32::consts::TAU;
            let channel = |offset: f32| {
                let c = (angle + offset).cos().mul_add(0.5, 0.5);
                (c * lum as f32) as u32
            };
            (channel(0.0) << 16) | (channel(2.094) << 8) | channel(4.189)
        })
        .collect()
}

pub struct DemoMachine {
    machine_type: MachineType,
    input: InputState,
    palette: Vec<u32>,
    scanlines: usize,
    first_scanline: usize,
    frame_hz: u32,
    frame: u32,
    scroll: i32,
    tone_phase: u32,
}

impl DemoMachine {
    #[must_use]
    pub fn new(program: &GameProgram) -> Self {
        let (scanlines, first_scanline, frame_hz) = timing(program.machine_type);
        Self {
            machine_type: program.machine_type,
            input: InputState::new(program.left_controller, program.right_controller),
            palette: demo_palette(),
            scanlines,
            first_scanline,
            frame_hz,
            frame: 0,
            scroll: 0,
            tone_phase: 0,
        }
    }

    /// Rebuild a machine from [`Machine::save_state`] output.
    #[must_use]
    pub fn restore(program: &GameProgram, state: &[u8]) -> Option<Self> {
        if state.len() != STATE_LEN {
            return None;
        }
        let word = |i: usize| {
            let mut bytes = [0u8; 4];
            bytes.copy_from_slice(&state[i * 4..i * 4 + 4]);
            bytes
        };
        let mut machine = Self::new(program);
        machine.frame = u32::from_le_bytes(word(0));
        machine.scroll = i32::from_le_bytes(word(1));
        machine.tone_phase = u32::from_le_bytes(word(2));
        Some(machine)
    }

    /// Frames computed since power-on.
    #[must_use]
    pub const fn frame_count(&self) -> u32 {
        self.frame
    }

    #[must_use]
    pub const fn scroll(&self) -> i32 {
        self.scroll
    }

    fn step_scroll(&mut self) {
        let left = self.input.sample_action(0, ControllerAction::Left);
        let right = self.input.sample_action(0, ControllerAction::Right);
        self.scroll += match (left, right) {
            (true, false) => -2,
            (false, true) => 2,
            _ => 1,
        };
    }

    fn draw(&self, frame: &mut FrameBuffer) {
        let pitch = frame.visible_pitch();
        let bar_width = BAR_WIDTH * pitch / 160;
        let grey = self.input.sample_switch(ConsoleSwitch::GameBW);
        let offset = self.scroll.rem_euclid(pitch as i32) as usize;
        for line in 0..frame.scanlines() {
            let Some(row) = frame.scanline_mut(line) else {
                break;
            };
            let lum = (line / 16 % 7) as u8 * 2 + 2;
            for (x, ci) in row.iter_mut().enumerate() {
                let bar = ((x + offset) / bar_width % 15) as u8 + 1;
                let hue = if grey { 0 } else { bar << 4 };
                *ci = hue | lum;
            }
        }
    }

    fn play(&mut self, frame: &mut FrameBuffer) {
        let fire = self.input.sample_action(0, ControllerAction::Trigger);
        let half_period = if fire { 6 } else { 12 };
        for sample in &mut frame.sound {
            self.tone_phase = (self.tone_phase + 1) % (half_period * 2);
            *sample = if self.tone_phase < half_period { TONE_HIGH } else { TONE_LOW };
        }
    }
}

impl Machine for DemoMachine {
    fn machine_type(&self) -> MachineType {
        self.machine_type
    }

    fn frame_hz(&self) -> u32 {
        self.frame_hz
    }

    fn first_scanline(&self) -> usize {
        self.first_scanline
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
        FrameBuffer::new(self.machine_type.native_width(), self.scanlines)
    }

    fn compute_next_frame(&mut self, frame: &mut FrameBuffer) {
        self.input.capture();
        if self.input.sample_switch(ConsoleSwitch::GameReset) {
            self.frame = 0;
            self.scroll = 0;
        }
        self.frame = self.frame.wrapping_add(1);
        self.step_scroll();
        self.draw(frame);
        self.play(frame);
    }

    fn save_state(&self) -> Option<Vec<u8>> {
        let mut state = Vec::with_capacity(STATE_LEN);
        state.extend_from_slice(&self.frame.to_le_bytes());
        state.extend_from_slice(&self.scroll.to_le_bytes());
        state.extend_from_slice(&self.tone_phase.to_le_bytes());
        Some(state)
    }
}

/// Creates [`DemoMachine`]s for any game program.
#[derive(Debug, Clone, Copy, Default)]
pub struct DemoFactory;

impl MachineFactory for DemoFactory {
    fn create(&self, program: &GameProgram) -> Option<Box<dyn Machine>> {
        Some(Box::new(DemoMachine::new(program)))
    }

    fn restore(&self, program: &GameProgram, state: &[u8]) -> Option<Box<dyn Machine>> {
        DemoMachine::restore(program, state).map(|m| Box::new(m) as Box<dyn Machine>)
    }
}
