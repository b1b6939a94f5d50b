use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};

use crossbeam_channel::{unbounded, Receiver, Sender};

use super::bank::WaveBank;
use super::controls::SharedControls;
use super::message::{MessageReceiver, SynthMessage};
use super::note::Note;
use super::pool::VoicePool;
use super::voice::PlayTask;
use crate::config::SynthConfig;
use crate::dsp::envelope::Envelope;
use crate::dsp::oscillator::Waveform;
use crate::dsp::tone::Tone;
use crate::dsp::volume::Volume;
use crate::error::{Result, SynthError};
use crate::io::sink::SinkFactory;

/*
Dispatch
========

    keyboard ─┐                                  ┌─ voice-0 ─┐
    MIDI ─────┼── SynthHandle ══ channel ══ Engine ── queue ──┼─ voice-1 ─┼── sinks
    UI ───────┘   (never blocks)    (owns params)    (bounded) └─ ... ─────┘

The engine is the only writer of synthesis parameters. It keeps an idle
"template" envelope holding the current ADSR settings; every note-on clones
it, so a new voice starts with whatever the knobs say right now. ADSR
changes go to the template and to every voice still sounding.

The instrument is monophonic: a note-on releases the previous voice (which
fades out on its own worker) before starting the new one.

The waveform and octave shift are read at note-on and fixed for the life
of that voice.
*/

/// Cheap, clonable sender for [`SynthMessage`]s. Every method returns
/// immediately.
#[derive(Debug, Clone)]
pub struct SynthHandle {
    sender: Sender<SynthMessage>,
}

/// A connected handle and the receiving end for an [`Engine`].
pub fn channel() -> (SynthHandle, Receiver<SynthMessage>) {
    let (sender, receiver) = unbounded();
    (SynthHandle { sender }, receiver)
}

impl SynthHandle {
    pub fn send(&self, message: SynthMessage) {
        if self.sender.send(message).is_err() {
            tracing::debug!(?message, "engine stopped, message dropped");
        }
    }

    pub fn note_on(&self, note: Note) {
        self.send(SynthMessage::NoteOn(note));
    }

    pub fn note_off(&self) {
        self.send(SynthMessage::NoteOff(None));
    }

    pub fn update_attack(&self, knob: f64) {
        self.send(SynthMessage::UpdateAttack(knob));
    }

    pub fn update_decay(&self, knob: f64) {
        self.send(SynthMessage::UpdateDecay(knob));
    }

    pub fn update_sustain(&self, knob: f64) {
        self.send(SynthMessage::UpdateSustain(knob));
    }

    pub fn update_release(&self, knob: f64) {
        self.send(SynthMessage::UpdateRelease(knob));
    }

    pub fn set_volume(&self, level: f64) {
        self.send(SynthMessage::SetVolume(level));
    }

    pub fn set_bass(&self, knob: f64) {
        self.send(SynthMessage::SetBass(knob));
    }

    pub fn set_mid(&self, knob: f64) {
        self.send(SynthMessage::SetMid(knob));
    }

    pub fn set_treble(&self, knob: f64) {
        self.send(SynthMessage::SetTreble(knob));
    }

    pub fn set_tone_enabled(&self, enabled: bool) {
        self.send(SynthMessage::SetToneEnabled(enabled));
    }

    pub fn select_waveform(&self, waveform: Waveform) {
        self.send(SynthMessage::SelectWaveform(waveform));
    }

    pub fn set_octave_shift(&self, octaves: i8) {
        self.send(SynthMessage::SetOctaveShift(octaves));
    }

    pub fn shutdown(&self) {
        self.send(SynthMessage::Shutdown);
    }
}

struct ActiveVoice {
    note: Note,
    envelope: Arc<Mutex<Envelope>>,
}

pub struct Engine {
    bank: WaveBank,
    controls: Arc<SharedControls>,
    template: Envelope,
    waveform: Waveform,
    octave_shift: i8,
    active: Option<ActiveVoice>,
    sounding: Vec<Arc<Mutex<Envelope>>>,
    // Dropped last: joining the workers waits for released voices to drain.
    pool: VoicePool,
}

impl Engine {
    pub fn new(config: &SynthConfig, bank: WaveBank, sinks: Arc<dyn SinkFactory>) -> Result<Self> {
        config.validate()?;

        let tone = Tone::new(config.tone_settings())?;
        let volume = Volume::new(config.volume, config.volume_offset);
        let controls = Arc::new(SharedControls::new(volume, tone, config.tone_enabled));
        let pool = VoicePool::new(
            config.workers,
            config.queue_depth,
            Arc::clone(&controls),
            sinks,
        )?;

        Ok(Self {
            bank,
            controls,
            template: Envelope::new(config.adsr(), config.sample_rate)?,
            waveform: config.waveform,
            octave_shift: config.octave_shift,
            active: None,
            sounding: Vec::new(),
            pool,
        })
    }

    /// Build the full wave bank, start the engine on its own thread and
    /// return a handle to it.
    pub fn start(
        config: &SynthConfig,
        sinks: Arc<dyn SinkFactory>,
    ) -> Result<(SynthHandle, JoinHandle<()>)> {
        let bank = WaveBank::build(config)?;
        let engine = Self::new(config, bank, sinks)?;
        let (handle, receiver) = channel();
        let thread = engine.spawn(receiver)?;
        Ok((handle, thread))
    }

    pub fn spawn(self, receiver: impl MessageReceiver + Send + 'static) -> Result<JoinHandle<()>> {
        thread::Builder::new()
            .name("dispatch".into())
            .spawn(move || self.run(receiver))
            .map_err(|source| SynthError::Spawn {
                name: "dispatch".into(),
                source,
            })
    }

    /// Apply messages in order until `Shutdown` or every sender is gone,
    /// then release all voices and wait for them to drain.
    pub fn run(mut self, mut receiver: impl MessageReceiver) {
        tracing::info!(waveform = %self.waveform, "synth engine running");
        while let Some(message) = receiver.recv() {
            if !self.handle_message(message) {
                break;
            }
        }
        tracing::info!("synth engine stopping");
    }

    /// Apply one message. Returns false for `Shutdown`.
    pub fn handle_message(&mut self, message: SynthMessage) -> bool {
        tracing::debug!(?message, "dispatch");
        match message {
            SynthMessage::NoteOn(note) => self.note_on(note),
            SynthMessage::NoteOff(None) => self.release_active(),
            SynthMessage::NoteOff(Some(note)) => {
                if self.active_note() == Some(note) {
                    self.release_active();
                }
            }
            SynthMessage::UpdateAttack(knob) => self.update_envelopes(|env| env.update_attack(knob)),
            SynthMessage::UpdateDecay(knob) => self.update_envelopes(|env| env.update_decay(knob)),
            SynthMessage::UpdateSustain(knob) => {
                self.update_envelopes(|env| env.update_sustain(knob))
            }
            SynthMessage::UpdateRelease(knob) => {
                self.update_envelopes(|env| env.update_release(knob))
            }
            SynthMessage::SetVolume(level) => self.controls.set_volume(level),
            SynthMessage::SetBass(knob) => self.controls.update_tone(|tone| tone.set_bass(knob)),
            SynthMessage::SetMid(knob) => self.controls.update_tone(|tone| tone.set_mid(knob)),
            SynthMessage::SetTreble(knob) => {
                self.controls.update_tone(|tone| tone.set_treble(knob))
            }
            SynthMessage::SetToneEnabled(enabled) => self.controls.set_tone_enabled(enabled),
            SynthMessage::SelectWaveform(waveform) => self.waveform = waveform,
            SynthMessage::SetOctaveShift(octaves) => self.octave_shift = octaves,
            SynthMessage::Shutdown => return false,
        }
        true
    }

    /// The note that is currently held, as triggered (before octave shift).
    pub fn active_note(&self) -> Option<Note> {
        self.active.as_ref().map(|voice| voice.note)
    }

    pub fn active_envelope(&self) -> Option<Arc<Mutex<Envelope>>> {
        self.active.as_ref().map(|voice| Arc::clone(&voice.envelope))
    }

    /// Idle envelope carrying the current ADSR settings.
    pub fn envelope_template(&self) -> &Envelope {
        &self.template
    }

    pub fn controls(&self) -> &Arc<SharedControls> {
        &self.controls
    }

    pub fn waveform(&self) -> Waveform {
        self.waveform
    }

    pub fn octave_shift(&self) -> i8 {
        self.octave_shift
    }

    fn note_on(&mut self, note: Note) {
        let Some(wave) = note
            .transpose(self.octave_shift)
            .and_then(|shifted| self.bank.get(self.waveform, shifted))
        else {
            tracing::debug!(%note, shift = self.octave_shift, "note outside wave bank, ignored");
            return;
        };

        self.release_active();

        let mut envelope = self.template.clone();
        envelope.note_on();
        let envelope = Arc::new(Mutex::new(envelope));
        let task = PlayTask {
            note,
            wave,
            envelope: Arc::clone(&envelope),
        };
        if self.pool.submit(task) {
            self.prune();
            self.sounding.push(Arc::clone(&envelope));
            self.active = Some(ActiveVoice { note, envelope });
        }
    }

    fn release_active(&mut self) {
        if let Some(voice) = self.active.take() {
            lock(&voice.envelope).note_off();
            tracing::debug!(note = %voice.note, "released");
        }
    }

    fn update_envelopes(&mut self, apply: impl Fn(&mut Envelope) -> Result<()>) {
        if let Err(err) = apply(&mut self.template) {
            tracing::warn!("ignoring envelope update: {err}");
            return;
        }
        self.prune();
        for envelope in &self.sounding {
            if let Err(err) = apply(&mut lock(envelope)) {
                tracing::warn!("envelope update failed on a sounding voice: {err}");
            }
        }
    }

    fn prune(&mut self) {
        self.sounding.retain(|envelope| lock(envelope).is_active());
    }
}

impl Drop for Engine {
    fn drop(&mut self) {
        self.active = None;
        for envelope in self.sounding.drain(..) {
            lock(&envelope).note_off();
        }
    }
}

fn lock(envelope: &Mutex<Envelope>) -> MutexGuard<'_, Envelope> {
    envelope.lock().unwrap_or_else(PoisonError::into_inner)
}
