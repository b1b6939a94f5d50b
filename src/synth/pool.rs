use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};

use super::controls::SharedControls;
use super::voice::{play_voice, PlayTask};
use crate::error::{Result, SynthError};
use crate::io::sink::SinkFactory;

/// Fixed set of audio worker threads fed by a bounded task queue.
///
/// Submitting never blocks: when every worker is busy and the queue is full
/// the note is dropped.
pub struct VoicePool {
    sender: Option<Sender<PlayTask>>,
    workers: Vec<JoinHandle<()>>,
}

impl VoicePool {
    pub fn new(
        workers: usize,
        queue_depth: usize,
        controls: Arc<SharedControls>,
        sinks: Arc<dyn SinkFactory>,
    ) -> Result<Self> {
        if workers == 0 {
            return Err(SynthError::invalid("workers", "need at least one audio worker"));
        }

        let (sender, receiver) = bounded::<PlayTask>(queue_depth);
        let handles = (0..workers)
            .map(|id| {
                let name = format!("voice-{id}");
                let receiver = receiver.clone();
                let controls = Arc::clone(&controls);
                let sinks = Arc::clone(&sinks);
                thread::Builder::new()
                    .name(name.clone())
                    .spawn(move || worker_loop(id, receiver, &controls, &*sinks))
                    .map_err(|source| SynthError::Spawn { name, source })
            })
            .collect::<Result<Vec<_>>>()?;

        tracing::debug!(workers, queue_depth, "voice pool started");
        Ok(Self {
            sender: Some(sender),
            workers: handles,
        })
    }

    /// Queue a voice. Returns false if it was dropped.
    pub fn submit(&self, task: PlayTask) -> bool {
        let Some(sender) = &self.sender else {
            return false;
        };
        match sender.try_send(task) {
            Ok(()) => true,
            Err(TrySendError::Full(task)) => {
                tracing::warn!(note = %task.note, "all audio workers busy, dropping note");
                false
            }
            Err(TrySendError::Disconnected(task)) => {
                tracing::warn!(note = %task.note, "voice pool is shut down, dropping note");
                false
            }
        }
    }

    /// Stop accepting work and wait for sounding voices to finish.
    pub fn shutdown(&mut self) {
        self.sender = None;
        for worker in self.workers.drain(..) {
            if worker.join().is_err() {
                tracing::error!("audio worker panicked");
            }
        }
    }
}

impl Drop for VoicePool {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn worker_loop(
    id: usize,
    tasks: Receiver<PlayTask>,
    controls: &SharedControls,
    sinks: &dyn SinkFactory,
) {
    for task in tasks.iter() {
        let mut sink = match sinks.open(task.wave.len()) {
            Ok(sink) => sink,
            Err(err) => {
                tracing::error!(worker = id, note = %task.note, "voice aborted: {err}");
                continue;
            }
        };

        tracing::debug!(worker = id, note = %task.note, block = task.wave.len(), "voice started");
        match play_voice(&task.wave, &task.envelope, controls, sink.as_mut()) {
            Ok(blocks) => tracing::debug!(worker = id, note = %task.note, blocks, "voice finished"),
            Err(err) => tracing::error!(worker = id, note = %task.note, "voice aborted: {err}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use super::*;
    use crate::dsp::envelope::{AdsrParams, Envelope};
    use crate::dsp::tone::{Tone, ToneSettings};
    use crate::dsp::volume::Volume;
    use crate::error::Result;
    use crate::io::sink::{AudioSink, MemorySink};

    const RATE: u32 = 1_000;

    fn controls() -> Arc<SharedControls> {
        let tone = Tone::new(ToneSettings {
            taps: 15,
            first_stop: 50.0,
            second_stop: 200.0,
            sample_rate: RATE,
            ..ToneSettings::default()
        })
        .unwrap();
        Arc::new(SharedControls::new(Volume::default(), tone, false))
    }

    fn released_task() -> PlayTask {
        let mut env = Envelope::triggered(AdsrParams::default(), RATE).unwrap();
        env.note_off();
        PlayTask {
            note: "A4".parse().unwrap(),
            wave: Arc::from(vec![500i16; 30]),
            envelope: Arc::new(Mutex::new(env)),
        }
    }

    #[test]
    fn plays_submitted_voices() {
        let sink = MemorySink::new();
        let mut pool = VoicePool::new(2, 4, controls(), Arc::new(sink.clone())).unwrap();
        assert!(pool.submit(released_task()));
        assert!(pool.submit(released_task()));
        pool.shutdown();

        // Default release is 150 samples at 1 kHz: five 30-sample blocks each.
        assert_eq!(sink.blocks().len(), 10);
        assert!(!pool.submit(released_task()));
    }

    /// Fails the first `open`, then records into a shared memory sink.
    struct FirstOpenFails {
        opened: AtomicUsize,
        sink: MemorySink,
    }

    impl SinkFactory for FirstOpenFails {
        fn open(&self, _block_len: usize) -> Result<Box<dyn AudioSink>> {
            if self.opened.fetch_add(1, Ordering::SeqCst) == 0 {
                return Err(SynthError::DeviceUnavailable("unplugged".into()));
            }
            Ok(Box::new(self.sink.clone()))
        }
    }

    #[test]
    fn sink_failure_only_aborts_that_voice() {
        let sink = MemorySink::new();
        let factory = Arc::new(FirstOpenFails {
            opened: AtomicUsize::new(0),
            sink: sink.clone(),
        });
        // One worker, so the two voices run in submission order.
        let mut pool = VoicePool::new(1, 2, controls(), factory.clone()).unwrap();
        assert!(pool.submit(released_task()));
        assert!(pool.submit(released_task()));
        pool.shutdown();

        assert_eq!(factory.opened.load(Ordering::SeqCst), 2);
        // Only the second voice reached the device: 150 release samples.
        assert_eq!(sink.blocks().len(), 5);
        assert!(sink.blocks().iter().all(|block| block.len() == 30));
    }

    #[test]
    fn zero_workers_rejected() {
        assert!(VoicePool::new(0, 1, controls(), Arc::new(MemorySink::new())).is_err());
    }
}
