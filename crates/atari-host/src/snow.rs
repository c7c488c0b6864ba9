//! Noise loop shown when there is no machine to run.
//!
//! Grey static at a fixed 60 fps with a faint hiss, paced the same way as
//! a machine session.

use std::sync::atomic::Ordering;
use std::time::{Duration, Instant};

use log::debug;
use rand::Rng;

use crate::config::PacingPolicy;
use crate::host::HostCommand;
use crate::lock;
use crate::pacing::{deadline_adjustment, wait_until};
use crate::session::SessionContext;

const SNOW_FPS: u32 = 60;
/// Bytes of audio per snow frame.
const SOUND_LEN: usize = 524;

pub(crate) fn run(ctx: SessionContext, policy: &PacingPolicy, queue_len: usize) {
    let shared = &ctx.shared;
    shared.mark_running();
    shared.current_frame_rate.store(SNOW_FPS, Ordering::Relaxed);
    shared.max_frame_rate.store(SNOW_FPS, Ordering::Relaxed);

    let interval = Duration::from_secs(1) / SNOW_FPS;
    let mut rng = rand::rng();
    let mut sound_bytes = [0u8; SOUND_LEN];
    let mut sound_on = shared.sound_on.load(Ordering::Relaxed);
    let configure = |on: bool| {
        let mut audio = lock(&ctx.audio);
        if on {
            audio.configure(SOUND_LEN as u32 * SNOW_FPS, SOUND_LEN, queue_len);
        } else {
            audio.close();
        }
    };
    configure(sound_on);
    debug!("snow running, sound {}", if sound_on { "on" } else { "off" });

    while !shared.stop_requested() {
        let start = Instant::now();

        while let Ok(command) = ctx.commands.try_recv() {
            if let HostCommand::SetSoundOn(on) = command {
                sound_on = on;
                configure(on);
                shared.sound_on.store(on, Ordering::Relaxed);
            }
        }

        let queued = if sound_on { lock(&ctx.audio).buffers_queued() } else { -1 };
        let deadline = deadline_adjustment(queued, interval, policy).apply(start + interval);

        if sound_on {
            for b in &mut sound_bytes {
                *b = rng.random_range(0..2u8) | 0x80;
            }
            lock(&ctx.audio).submit(&sound_bytes);
        }

        ctx.frame.with_slot(|slot| {
            for px in slot.pixels.chunks_exact_mut(4) {
                let c = rng.random_range(0..0xC0u8);
                px[..3].fill(c);
            }
            slot.updated = true;
        });
        shared.buffers_queued.store(queued, Ordering::Relaxed);

        wait_until(deadline, &shared.stop);
    }

    lock(&ctx.audio).close();
}
