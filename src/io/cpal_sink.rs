use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use rtrb::{Producer, RingBuffer};

use super::sink::{AudioSink, SinkFactory};
use crate::error::{Result, SynthError};

/*
Device Sink
===========

The playback loop is a blocking writer; cpal pulls samples from a
real-time callback. An rtrb ring buffer sits between them:

    worker ── write(block) ──▶ [ ring: 2 blocks ] ──▶ callback ──▶ device
               sleeps while full                      silence when empty

The ring holds two blocks, so a voice runs at most two blocks ahead of the
speaker. Mono samples are duplicated to every device channel.
*/

const POLL: Duration = Duration::from_millis(1);

/// Opens a [`CpalSink`] on the default output device for each voice.
#[derive(Debug, Clone)]
pub struct CpalSinkFactory {
    sample_rate: u32,
}

impl CpalSinkFactory {
    /// Check that an output device exists before any note is played.
    pub fn new(sample_rate: u32) -> Result<Self> {
        let device = default_device()?;
        let name = device.name().unwrap_or_else(|_| "<unnamed>".into());
        tracing::info!(device = %name, sample_rate, "audio output");
        Ok(Self { sample_rate })
    }
}

impl SinkFactory for CpalSinkFactory {
    fn open(&self, block_len: usize) -> Result<Box<dyn AudioSink>> {
        Ok(Box::new(CpalSink::open(self.sample_rate, block_len)?))
    }
}

pub struct CpalSink {
    producer: Producer<i16>,
    sample_rate: u32,
    started: Arc<AtomicBool>,
    failed: Arc<AtomicBool>,
    underruns: Arc<AtomicUsize>,
    _stream: cpal::Stream,
}

impl CpalSink {
    pub fn open(sample_rate: u32, block_len: usize) -> Result<Self> {
        let device = default_device()?;
        let supported = device.default_output_config().map_err(unavailable)?;
        let channels = usize::from(supported.channels());
        let config = cpal::StreamConfig {
            channels: supported.channels(),
            sample_rate: cpal::SampleRate(sample_rate),
            buffer_size: cpal::BufferSize::Default,
        };

        let (producer, mut consumer) = RingBuffer::<i16>::new(block_len.max(1) * 2);
        let started = Arc::new(AtomicBool::new(false));
        let failed = Arc::new(AtomicBool::new(false));
        let underruns = Arc::new(AtomicUsize::new(0));

        let (cb_started, cb_underruns, err_failed) =
            (Arc::clone(&started), Arc::clone(&underruns), Arc::clone(&failed));
        let stream = device
            .build_output_stream(
                &config,
                move |data: &mut [f32], _| {
                    for frame in data.chunks_mut(channels) {
                        let sample = match consumer.pop() {
                            Ok(s) => {
                                cb_started.store(true, Ordering::Relaxed);
                                f32::from(s) / 32768.0
                            }
                            Err(_) => {
                                if cb_started.load(Ordering::Relaxed) {
                                    cb_underruns.fetch_add(1, Ordering::Relaxed);
                                }
                                0.0
                            }
                        };
                        frame.fill(sample);
                    }
                },
                move |err| {
                    tracing::error!("audio stream error: {err}");
                    err_failed.store(true, Ordering::Relaxed);
                },
                None,
            )
            .map_err(unavailable)?;
        stream.play().map_err(unavailable)?;

        Ok(Self {
            producer,
            sample_rate,
            started,
            failed,
            underruns,
            _stream: stream,
        })
    }

    fn check_alive(&self) -> Result<()> {
        if self.failed.load(Ordering::Relaxed) || self.producer.is_abandoned() {
            return Err(SynthError::DeviceUnavailable("output stream stopped".into()));
        }
        Ok(())
    }
}

impl AudioSink for CpalSink {
    fn write(&mut self, block: &[i16]) -> Result<()> {
        let mut rest = block;
        while !rest.is_empty() {
            self.check_alive()?;
            let n = self.producer.slots().min(rest.len());
            if n == 0 {
                thread::sleep(POLL);
                continue;
            }
            let chunk = self
                .producer
                .write_chunk_uninit(n)
                .map_err(|err| SynthError::DeviceUnavailable(err.to_string()))?;
            let written = chunk.fill_from_iter(rest[..n].iter().copied());
            rest = &rest[written..];
        }
        Ok(())
    }

    /// Wait until the ring is drained, or a little longer than it could
    /// possibly take to play.
    fn flush(&mut self) -> Result<()> {
        let capacity = self.producer.buffer().capacity();
        let ring_time = Duration::from_secs_f64(capacity as f64 / f64::from(self.sample_rate));
        let deadline = Instant::now() + ring_time * 2 + Duration::from_millis(100);

        while self.producer.slots() < capacity && Instant::now() < deadline {
            self.check_alive()?;
            thread::sleep(POLL);
        }

        let underruns = self.underruns.load(Ordering::Relaxed);
        if underruns > 0 && self.started.load(Ordering::Relaxed) {
            tracing::warn!(frames = underruns, "audio underrun");
        }
        Ok(())
    }
}

fn default_device() -> Result<cpal::Device> {
    cpal::default_host()
        .default_output_device()
        .ok_or_else(|| SynthError::DeviceUnavailable("no default output device available".into()))
}

fn unavailable(err: impl std::fmt::Display) -> SynthError {
    SynthError::DeviceUnavailable(err.to_string())
}
