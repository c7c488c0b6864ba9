//! cpal audio output behind the host's [`AudioDriver`] trait.
//!
//! The cpal stream is not `Send`, so it lives on its own thread for as
//! long as the device is open. Submitted buffers are converted to `f32`,
//! resampled to the device rate and pushed into a ring buffer that the
//! stream callback drains. Queued buffers are the ring's occupancy divided
//! by one buffer's length at the device rate.

use std::sync::mpsc;
use std::thread::{self, JoinHandle};

use atari_host::{AudioDriver, AudioError};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{SampleRate, StreamConfig};
use log::{debug, error};
use ringbuf::HeapRb;
use ringbuf::traits::{Consumer, Observer, Producer, Split};

/// Convert an unsigned 8-bit sample to `-1.0..1.0`.
#[must_use]
pub fn to_f32(sample: u8) -> f32 {
    (f32::from(sample) - 128.0) / 128.0
}

/// Nearest-sample rate converter. The fractional position carries over
/// between buffers so consecutive buffers join without gaps.
#[derive(Debug, Clone)]
pub struct Resampler {
    step: f64,
    phase: f64,
}

impl Resampler {
    #[must_use]
    pub fn new(source_rate: u32, device_rate: u32) -> Self {
        Self {
            step: f64::from(source_rate) / f64::from(device_rate.max(1)),
            phase: 0.0,
        }
    }

    /// Device samples produced for `source_len` source samples, rounded up.
    #[must_use]
    pub fn output_len(&self, source_len: usize) -> usize {
        (source_len as f64 / self.step).ceil() as usize
    }

    pub fn run(&mut self, source: &[u8], mut emit: impl FnMut(f32)) {
        let len = source.len() as f64;
        while self.phase < len {
            emit(to_f32(source[self.phase as usize]));
            self.phase += self.step;
        }
        self.phase -= len;
    }
}

struct OpenStream {
    producer: ringbuf::HeapProd<f32>,
    resampler: Resampler,
    /// One submitted buffer's length in device samples.
    device_buffer_len: usize,
    stop: mpsc::Sender<()>,
    thread: JoinHandle<()>,
}

/// Default cpal output device.
#[derive(Default)]
pub struct CpalDriver {
    stream: Option<OpenStream>,
}

impl CpalDriver {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

/// Body of the stream thread: build and play the stream, hand the ring
/// producer back, then hold the stream until told to stop.
fn stream_thread(
    ring_len: impl FnOnce(u32) -> usize,
    ready: mpsc::Sender<Result<(ringbuf::HeapProd<f32>, u32), AudioError>>,
    stop: mpsc::Receiver<()>,
) {
    let host = cpal::default_host();
    let Some(device) = host.default_output_device() else {
        let _ = ready.send(Err(AudioError::NoDevice));
        return;
    };
    let supported = match device.default_output_config() {
        Ok(config) => config,
        Err(e) => {
            let _ = ready.send(Err(AudioError::Unsupported(e.to_string())));
            return;
        }
    };
    let device_rate = supported.sample_rate().0;
    let channels = usize::from(supported.channels().max(1));
    let config = StreamConfig {
        channels: supported.channels(),
        sample_rate: SampleRate(device_rate),
        buffer_size: cpal::BufferSize::Default,
    };

    let (producer, mut consumer) = HeapRb::<f32>::new(ring_len(device_rate).max(1)).split();
    let stream = device.build_output_stream(
        &config,
        move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
            for frame in data.chunks_mut(channels) {
                frame.fill(consumer.try_pop().unwrap_or(0.0));
            }
        },
        |err| error!("audio stream error: {err}"),
        None,
    );
    let stream = match stream {
        Ok(stream) => stream,
        Err(e) => {
            let _ = ready.send(Err(AudioError::Stream(e.to_string())));
            return;
        }
    };
    if let Err(e) = stream.play() {
        let _ = ready.send(Err(AudioError::Stream(e.to_string())));
        return;
    }
    if ready.send(Ok((producer, device_rate))).is_err() {
        return;
    }
    // Returns when the driver sends stop or drops the sender.
    let _ = stop.recv();
    drop(stream);
}

impl AudioDriver for CpalDriver {
    fn open(&mut self, sample_rate: u32, buffer_len: usize, queue_len: usize) -> Result<(), AudioError> {
        self.close();

        let (ready_tx, ready_rx) = mpsc::channel();
        let (stop_tx, stop_rx) = mpsc::channel();
        let ring_len = move |device_rate: u32| {
            Resampler::new(sample_rate, device_rate).output_len(buffer_len) * queue_len
        };
        let thread = thread::Builder::new()
            .name("cpal-output".to_string())
            .spawn(move || stream_thread(ring_len, ready_tx, stop_rx))
            .map_err(|e| AudioError::Stream(e.to_string()))?;

        let (producer, device_rate) = match ready_rx.recv() {
            Ok(Ok(opened)) => opened,
            Ok(Err(e)) => {
                let _ = thread.join();
                return Err(e);
            }
            Err(_) => {
                let _ = thread.join();
                return Err(AudioError::Stream("audio thread exited".to_string()));
            }
        };
        let resampler = Resampler::new(sample_rate, device_rate);
        debug!("cpal output at {device_rate} Hz for {sample_rate} Hz source");
        self.stream = Some(OpenStream {
            device_buffer_len: resampler.output_len(buffer_len).max(1),
            producer,
            resampler,
            stop: stop_tx,
            thread,
        });
        Ok(())
    }

    fn buffers_queued(&self) -> usize {
        self.stream
            .as_ref()
            .map_or(0, |s| s.producer.occupied_len() / s.device_buffer_len)
    }

    fn submit(&mut self, buffer: &[u8]) {
        let Some(stream) = self.stream.as_mut() else {
            return;
        };
        let producer = &mut stream.producer;
        // A full ring drops the overflow; pacing catches up from the queue count.
        stream.resampler.run(buffer, |sample| {
            let _ = producer.try_push(sample);
        });
    }

    fn close(&mut self) {
        if let Some(stream) = self.stream.take() {
            let _ = stream.stop.send(());
            if stream.thread.join().is_err() {
                error!("audio thread panicked");
            }
        }
    }
}

impl Drop for CpalDriver {
    fn drop(&mut self) {
        self.close();
    }
}
