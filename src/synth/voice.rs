use std::sync::{Arc, Mutex, PoisonError};

use super::controls::SharedControls;
use super::note::Note;
use crate::dsp::envelope::{Envelope, EnvelopeState};
use crate::dsp::saturate_i16;
use crate::dsp::tone::ToneHistory;
use crate::error::Result;
use crate::io::sink::AudioSink;

/*
Playback Loop
=============

One voice = one precomputed wave buffer + one envelope, played until the
envelope goes idle:

    ┌──────────────────────────────────────────────────────────────┐
    │  block[i] = envelope.process(wave[i])   (None → 0)           │
    │  block    = tone(block)                 (when enabled)        │
    │  block    = volume(block)                                    │
    │  sink.write(block)                      ← blocks: real time  │
    └──────────── repeat until envelope == Idle ───────────────────┘

Every block is exactly one wave buffer long, so the short buffer loops
gaplessly while the envelope shapes it over a much longer span.

The envelope is shared with the dispatcher, which may call note_off or
change a ramp at any time. The loop holds the lock for one block of
processing only, so a note-off is seen within one block and the cursor is
never read half-updated.

Once the envelope reaches Idle the rest of that block stays silent and the
loop ends.

With the tone stage on, the FIR filter keeps ringing for up to taps - 1
samples after the envelope's last non-zero output, so silence arrives that
much later than the release ramp alone would give. The tail is cut at the
end of the final block.

A failed write aborts the voice at that block with the sink's error.
*/

/// A note ready to be played by an audio worker.
#[derive(Debug, Clone)]
pub struct PlayTask {
    pub note: Note,
    pub wave: Arc<[i16]>,
    pub envelope: Arc<Mutex<Envelope>>,
}

/// Run one voice to completion and return the number of blocks written.
pub fn play_voice(
    wave: &[i16],
    envelope: &Mutex<Envelope>,
    controls: &SharedControls,
    sink: &mut dyn AudioSink,
) -> Result<usize> {
    if wave.is_empty() {
        tracing::warn!("empty wave buffer, nothing to play");
        return Ok(0);
    }

    let mut history: Option<ToneHistory> = None;
    let mut written = 0;

    loop {
        let snapshot = controls.snapshot();
        let mut block = vec![0i16; wave.len()];

        let finished = {
            let mut env = envelope.lock().unwrap_or_else(PoisonError::into_inner);
            for (out, &sample) in block.iter_mut().zip(wave) {
                if env.state() == EnvelopeState::Idle {
                    break;
                }
                *out = env.process(sample).map_or(0, saturate_i16);
            }
            env.state() == EnvelopeState::Idle
        };

        match &snapshot.tone {
            Some(tone) => {
                let history = history.get_or_insert_with(|| ToneHistory::new(tone));
                let input: Vec<f64> = block.iter().map(|&s| f64::from(s)).collect();
                for (out, y) in block.iter_mut().zip(tone.filter_with_history(&input, history)) {
                    *out = saturate_i16(y);
                }
            }
            None => history = None,
        }

        snapshot.volume.apply(&mut block);
        sink.write(&block)?;
        written += 1;

        if finished {
            break;
        }
    }

    sink.flush()?;
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dsp::envelope::AdsrParams;
    use crate::dsp::tone::{Tone, ToneSettings};
    use crate::dsp::volume::Volume;
    use crate::error::SynthError;
    use crate::io::sink::MemorySink;

    const RATE: u32 = 1_000;

    fn controls() -> SharedControls {
        let tone = Tone::new(ToneSettings {
            first_stop: 50.0,
            second_stop: 200.0,
            taps: 31,
            sample_rate: RATE,
            ..ToneSettings::default()
        })
        .unwrap();
        SharedControls::new(Volume::default(), tone, false)
    }

    fn params() -> AdsrParams {
        // 1 knob step = 50 samples at 1 kHz.
        AdsrParams {
            attack: 1.0,
            decay: 1.0,
            sustain: 10.0,
            release: 1.0,
        }
    }

    #[test]
    fn released_voice_drains_to_silence() {
        let envelope = Mutex::new(Envelope::triggered(params(), RATE).unwrap());
        envelope.lock().unwrap().note_off();

        let mut sink = MemorySink::new();
        let blocks = play_voice(&[1000; 20], &envelope, &controls(), &mut sink).unwrap();

        // 50 release samples over 20-sample blocks.
        assert_eq!(blocks, 3);
        let samples = sink.samples();
        assert_eq!(samples.len(), 60);
        assert!(samples[0] > 0);
        assert!(samples[50..].iter().all(|&s| s == 0));
        assert_eq!(envelope.lock().unwrap().state(), EnvelopeState::Idle);
    }

    #[test]
    fn idle_envelope_writes_one_silent_block() {
        let envelope = Mutex::new(Envelope::new(params(), RATE).unwrap());
        let mut sink = MemorySink::new();
        let blocks = play_voice(&[1000; 8], &envelope, &controls(), &mut sink).unwrap();
        assert_eq!(blocks, 1);
        assert_eq!(sink.samples(), vec![0; 8]);
    }

    #[test]
    fn volume_applies_per_block() {
        let controls = controls();
        controls.set_volume(0.0);
        let envelope = Mutex::new(Envelope::triggered(params(), RATE).unwrap());
        envelope.lock().unwrap().note_off();

        let mut sink = MemorySink::new();
        play_voice(&[1000; 25], &envelope, &controls, &mut sink).unwrap();
        assert!(sink.samples().iter().all(|&s| s == 0));
    }

    #[test]
    fn tone_stage_runs_when_enabled() {
        let controls = controls();
        controls.set_tone_enabled(true);
        controls.update_tone(|tone| {
            tone.set_bass(0.0);
            tone.set_mid(0.0);
            tone.set_treble(0.0);
        });
        let envelope = Mutex::new(Envelope::triggered(params(), RATE).unwrap());
        envelope.lock().unwrap().note_off();

        let mut sink = MemorySink::new();
        play_voice(&[1000; 10], &envelope, &controls, &mut sink).unwrap();
        assert!(sink.samples().iter().all(|&s| s == 0));
    }

    #[test]
    fn tone_tail_is_bounded_by_filter_length() {
        const TAPS: usize = 31;
        let controls = controls();
        controls.set_tone_enabled(true);
        let envelope = Mutex::new(Envelope::triggered(params(), RATE).unwrap());
        envelope.lock().unwrap().note_off();

        // One block long enough to hold the release plus the whole tail.
        let mut sink = MemorySink::new();
        let blocks = play_voice(&[1000; 100], &envelope, &controls, &mut sink).unwrap();
        assert_eq!(blocks, 1);

        let samples = sink.samples();
        assert!(samples[..50].iter().any(|&s| s != 0));
        assert!(samples[50 + TAPS - 1..].iter().all(|&s| s == 0));
    }

    /// Records blocks until write number `fail_at`, which fails.
    struct FailsAt {
        fail_at: usize,
        inner: MemorySink,
    }

    impl AudioSink for FailsAt {
        fn write(&mut self, block: &[i16]) -> Result<()> {
            if self.inner.blocks().len() == self.fail_at {
                return Err(SynthError::DeviceUnavailable("stream closed".into()));
            }
            self.inner.write(block)
        }
    }

    #[test]
    fn write_error_aborts_voice() {
        let envelope = Mutex::new(Envelope::triggered(params(), RATE).unwrap());
        let recorded = MemorySink::new();
        let mut sink = FailsAt {
            fail_at: 2,
            inner: recorded.clone(),
        };

        let result = play_voice(&[1000; 20], &envelope, &controls(), &mut sink);
        assert!(matches!(result, Err(SynthError::DeviceUnavailable(_))));
        assert_eq!(recorded.blocks().len(), 2);
        // The note was still held; nothing advanced it past the failed block.
        assert_eq!(envelope.lock().unwrap().state(), EnvelopeState::Decay);
    }

    #[test]
    fn empty_wave_returns_immediately() {
        let envelope = Mutex::new(Envelope::triggered(params(), RATE).unwrap());
        let mut sink = MemorySink::new();
        assert_eq!(play_voice(&[], &envelope, &controls(), &mut sink).unwrap(), 0);
        assert!(sink.blocks().is_empty());
    }
}
