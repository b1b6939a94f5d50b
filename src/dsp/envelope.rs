use crate::error::{Result, SynthError};

/*
ADSR Envelope (precomputed ramps)
=================================

The envelope shapes a looping oscillator buffer into a note: it fades in,
settles to a held level, and fades out after the key is released.

Vocabulary
----------

  unit        Knob values are not seconds. Every duration knob is scaled by a
              fixed unit of 0.05 before use, so attack = 2 means 0.1 s.
              The sustain knob is scaled by the same unit: sustain = 8 → 0.4.

  ramp        A precomputed run of gain multipliers for one phase, built by
              linear interpolation between the phase's endpoints:

                attack    0.0     → 1.0
                decay     1.0     → sustain
                release   sustain → 0.0

              A ramp of n samples includes both endpoints. n = 1 holds only
              the start value, n = 0 is empty.

  cursor      Index into the active ramp. Reset to 0 on every transition.


The State Machine
-----------------

    ┌──────┐ note_on  ┌────────┐ ramp done ┌───────┐ ramp done ┌─────────┐
    │ Idle │ ───────→ │ Attack │ ────────→ │ Decay │ ────────→ │ Sustain │
    └──────┘          └────────┘           └───────┘           └─────────┘
        ↑                  │ note_off          │ note_off           │ note_off
        │                  ↓                   ↓                    ↓
        │  ramp done  ┌─────────┐ ←────────────┴────────────────────┘
        └──────────── │ Release │
                      └─────────┘

note_on re-triggers from any state, including Release. note_off from Idle
is ignored. Release always walks the full sustain → 0 ramp.

Auto-advance happens on the same sample that consumes the last ramp value:
the cursor is incremented, found to be at the ramp's end, and the state
moves on with the cursor back at 0. The next sample is the first one of the
new phase.


Empty Ramps
-----------

A duration knob at 0 produces an empty ramp. When a sample arrives in a
phase whose ramp has nothing left at the cursor (empty, or shortened by a
knob change mid-phase), the phase is skipped: the state advances, and that
sample yields no output (`None`). The caller renders silence for it. This
also guarantees Release always terminates.
*/

/// Scale applied to every duration and sustain knob value.
pub const UNIT: f64 = 0.05;

/// Longest allowed attack, decay or release, in seconds (knob 1200).
pub const MAX_PHASE_SECONDS: f64 = 60.0;

/// The current stage of the envelope state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvelopeState {
    Idle,
    Attack,
    Decay,
    Sustain,
    Release,
}

/// Knob settings that define an envelope's shape.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AdsrParams {
    pub attack: f64,
    pub decay: f64,
    pub sustain: f64,
    pub release: f64,
}

impl Default for AdsrParams {
    fn default() -> Self {
        Self {
            attack: 2.0,
            decay: 7.0,
            sustain: 8.0,
            release: 3.0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Envelope {
    sample_rate: u32,

    state: EnvelopeState,
    cursor: usize,

    sustain: f64,
    attack_ramp: Vec<f64>,
    decay_ramp: Vec<f64>,
    release_ramp: Vec<f64>,
}

impl Envelope {
    /// Build an idle envelope from knob values.
    pub fn new(params: AdsrParams, sample_rate: u32) -> Result<Self> {
        if sample_rate == 0 {
            return Err(SynthError::invalid("sample_rate", "must be positive, got 0"));
        }

        let attack = phase_samples("attack", params.attack, sample_rate)?;
        let decay = phase_samples("decay", params.decay, sample_rate)?;
        let release = phase_samples("release", params.release, sample_rate)?;
        let sustain = sustain_level(params.sustain)?;

        Ok(Self {
            sample_rate,
            state: EnvelopeState::Idle,
            cursor: 0,
            sustain,
            attack_ramp: linspace(0.0, 1.0, attack),
            decay_ramp: linspace(1.0, sustain, decay),
            release_ramp: linspace(sustain, 0.0, release),
        })
    }

    /// Build an envelope already in Attack, as a voice does at note-on.
    pub fn triggered(params: AdsrParams, sample_rate: u32) -> Result<Self> {
        let mut env = Self::new(params, sample_rate)?;
        env.note_on();
        Ok(env)
    }

    /// Gate high: restart from the beginning of the attack ramp.
    pub fn note_on(&mut self) {
        self.transition(EnvelopeState::Attack);
    }

    /// Gate low: start the release ramp, unless already idle.
    pub fn note_off(&mut self) {
        if self.state != EnvelopeState::Idle {
            self.transition(EnvelopeState::Release);
        }
    }

    /// Apply the envelope to one sample and advance by one tick.
    ///
    /// Returns `None` when the active phase has no ramp value left at the
    /// cursor; the phase is skipped and the caller should emit silence.
    pub fn process(&mut self, sample: i16) -> Option<f64> {
        let sample = f64::from(sample);

        let (ramp, next) = match self.state {
            EnvelopeState::Idle => return Some(0.0),
            EnvelopeState::Sustain => return Some(sample * self.sustain),
            EnvelopeState::Attack => (&self.attack_ramp, EnvelopeState::Decay),
            EnvelopeState::Decay => (&self.decay_ramp, EnvelopeState::Sustain),
            EnvelopeState::Release => (&self.release_ramp, EnvelopeState::Idle),
        };

        let len = ramp.len();
        let Some(gain) = ramp.get(self.cursor).copied() else {
            tracing::trace!(state = ?self.state, "empty ramp, skipping phase");
            self.transition(next);
            return None;
        };

        self.cursor += 1;
        if self.cursor >= len {
            self.transition(next);
        }

        Some(sample * gain)
    }

    /// Set the attack knob and rebuild the attack ramp.
    pub fn update_attack(&mut self, attack: f64) -> Result<()> {
        let n = phase_samples("attack", attack, self.sample_rate)?;
        self.attack_ramp = linspace(0.0, 1.0, n);
        Ok(())
    }

    /// Set the decay knob and rebuild the decay ramp.
    pub fn update_decay(&mut self, decay: f64) -> Result<()> {
        let n = phase_samples("decay", decay, self.sample_rate)?;
        self.decay_ramp = linspace(1.0, self.sustain, n);
        Ok(())
    }

    /// Set the sustain knob. Decay and release both end or start at the
    /// sustain level, so both ramps are rebuilt with their current lengths.
    pub fn update_sustain(&mut self, sustain: f64) -> Result<()> {
        self.sustain = sustain_level(sustain)?;
        self.decay_ramp = linspace(1.0, self.sustain, self.decay_ramp.len());
        self.release_ramp = linspace(self.sustain, 0.0, self.release_ramp.len());
        Ok(())
    }

    /// Set the release knob and rebuild the release ramp.
    pub fn update_release(&mut self, release: f64) -> Result<()> {
        let n = phase_samples("release", release, self.sample_rate)?;
        self.release_ramp = linspace(self.sustain, 0.0, n);
        Ok(())
    }

    /// Apply every knob in `params` at once.
    pub fn update(&mut self, params: AdsrParams) -> Result<()> {
        self.update_sustain(params.sustain)?;
        self.update_attack(params.attack)?;
        self.update_decay(params.decay)?;
        self.update_release(params.release)
    }

    pub fn state(&self) -> EnvelopeState {
        self.state
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Returns true if the envelope is producing output (not idle).
    pub fn is_active(&self) -> bool {
        self.state != EnvelopeState::Idle
    }

    pub fn sustain(&self) -> f64 {
        self.sustain
    }

    pub fn attack_ramp(&self) -> &[f64] {
        &self.attack_ramp
    }

    pub fn decay_ramp(&self) -> &[f64] {
        &self.decay_ramp
    }

    pub fn release_ramp(&self) -> &[f64] {
        &self.release_ramp
    }

    fn transition(&mut self, state: EnvelopeState) {
        tracing::trace!(from = ?self.state, to = ?state, "envelope transition");
        self.state = state;
        self.cursor = 0;
    }
}

/// Number of ramp samples for a duration knob: round(knob · UNIT · rate).
///
/// Durations past [`MAX_PHASE_SECONDS`] are rejected before any ramp is
/// allocated.
pub fn phase_samples(param: &'static str, knob: f64, sample_rate: u32) -> Result<usize> {
    if !(knob.is_finite() && knob >= 0.0) {
        return Err(SynthError::invalid(
            param,
            format!("duration must be non-negative, got {knob}"),
        ));
    }
    let seconds = knob * UNIT;
    if seconds > MAX_PHASE_SECONDS {
        return Err(SynthError::invalid(
            param,
            format!("{seconds} s is longer than {MAX_PHASE_SECONDS} s (knob {knob})"),
        ));
    }
    Ok((seconds * f64::from(sample_rate)).round() as usize)
}

fn sustain_level(knob: f64) -> Result<f64> {
    if !(knob.is_finite() && knob >= 0.0) {
        return Err(SynthError::invalid(
            "sustain",
            format!("level must be non-negative, got {knob}"),
        ));
    }
    Ok(knob * UNIT)
}

/// `n` evenly spaced values from `start` to `stop`, both included.
fn linspace(start: f64, stop: f64, n: usize) -> Vec<f64> {
    match n {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (stop - start) / (n - 1) as f64;
            let mut ramp: Vec<f64> = (0..n).map(|i| start + step * i as f64).collect();
            ramp[n - 1] = stop;
            ramp
        }
    }
}
