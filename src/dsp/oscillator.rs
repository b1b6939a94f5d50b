use std::f64::consts::TAU;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::saturate_i16;
use crate::error::{Result, SynthError};

/*
Loopable Oscillator Buffers
===========================

Instead of running a phase accumulator per voice, every note is rendered
once, up front, into a short buffer of 16-bit samples. The playback loop
replays that buffer back to back for as long as the envelope is open.

Vocabulary
----------

  step size     Radians advanced per sample: 2π · frequency / sample_rate.

  time index    The integer sample positions 0, 1, 2, ... N-1 where
                N = floor(sample_rate · duration).

  period        sample_rate / frequency samples. Generally NOT an integer.


Cropping
--------

A buffer of N samples rarely holds a whole number of periods. Replaying it
back to back would jump at the seam:

    ╱╲  ╱╲  ╱|╱╲  ╱╲  ╱|
      ╲╱  ╲╱ |  ╲╱  ╲╱ |     ← discontinuity at every repeat
            seam      seam

So the tail is dropped: round(N mod period) samples come off the end, which
leaves the buffer ending close to a zero crossing. The buffer gets at most
one period shorter.

Waveform formulas (t = time index, a = amplitude, f = frequency, r = rate)
------------------------------------------------------------------------

  Sine       a · sin(step · t)
  Square     +a where sin(step · t) >= 0, otherwise -a
  Triangle   hp = 1 / 2f
             2a/hp · (hp - |((t/r + hp/2) mod 2hp) - hp|) - a
  Sawtooth   2 · ((t·f·a/r + a/2) fmod a) - a
*/

/// The closed set of waveform shapes the oscillator bank renders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Waveform {
    Sine,
    Square,
    Triangle,
    Sawtooth,
}

impl Waveform {
    pub const ALL: [Waveform; 4] = [
        Waveform::Sine,
        Waveform::Square,
        Waveform::Triangle,
        Waveform::Sawtooth,
    ];
}

impl fmt::Display for Waveform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Waveform::Sine => "sine",
            Waveform::Square => "square",
            Waveform::Triangle => "triangle",
            Waveform::Sawtooth => "sawtooth",
        };
        f.write_str(name)
    }
}

impl FromStr for Waveform {
    type Err = SynthError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "sine" => Ok(Waveform::Sine),
            "square" => Ok(Waveform::Square),
            "triangle" => Ok(Waveform::Triangle),
            "sawtooth" | "saw" => Ok(Waveform::Sawtooth),
            other => Err(SynthError::invalid(
                "waveform",
                format!("expected sine, square, triangle or sawtooth, got '{other}'"),
            )),
        }
    }
}

/// Immutable description of one note's buffer: what to render and how long.
#[derive(Debug, Clone)]
pub struct Oscillator {
    frequency: f64,
    sample_rate: u32,
    amplitude: f64,
    step_size: f64,
    len: usize,
}

impl Oscillator {
    pub fn new(frequency: f64, sample_rate: u32, amplitude: i16, duration: f64) -> Result<Self> {
        if !(frequency.is_finite() && frequency > 0.0) {
            return Err(SynthError::invalid(
                "frequency",
                format!("must be positive, got {frequency}"),
            ));
        }
        if sample_rate == 0 {
            return Err(SynthError::invalid("sample_rate", "must be positive, got 0"));
        }
        if !(duration.is_finite() && duration >= 0.0) {
            return Err(SynthError::invalid(
                "duration",
                format!("must be non-negative, got {duration}"),
            ));
        }

        let rate = f64::from(sample_rate);
        Ok(Self {
            frequency,
            sample_rate,
            amplitude: f64::from(amplitude),
            step_size: TAU * frequency / rate,
            len: (rate * duration) as usize,
        })
    }

    pub fn frequency(&self) -> f64 {
        self.frequency
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Number of time indices before cropping.
    pub fn uncropped_len(&self) -> usize {
        self.len
    }

    /// Samples dropped from the tail so the buffer loops cleanly.
    pub fn crop_len(&self) -> usize {
        let samples_per_period = f64::from(self.sample_rate) / self.frequency;
        let remainder = (self.len as f64 % samples_per_period).round_ties_even() as usize;
        remainder.min(self.len)
    }

    /// Render the cropped, loopable buffer for `waveform`.
    pub fn generate(&self, waveform: Waveform) -> Vec<i16> {
        let keep = self.len - self.crop_len();
        (0..keep)
            .map(|t| saturate_i16(self.sample_at(waveform, t as f64)))
            .collect()
    }

    #[inline]
    fn sample_at(&self, waveform: Waveform, t: f64) -> f64 {
        let a = self.amplitude;
        let rate = f64::from(self.sample_rate);

        match waveform {
            Waveform::Sine => a * (self.step_size * t).sin(),
            Waveform::Square => {
                if (self.step_size * t).sin() >= 0.0 {
                    a
                } else {
                    -a
                }
            }
            Waveform::Triangle => {
                let hp = 1.0 / (2.0 * self.frequency);
                let folded = ((t / rate + hp / 2.0).rem_euclid(2.0 * hp) - hp).abs();
                (2.0 * a) / hp * (hp - folded) - a
            }
            Waveform::Sawtooth => {
                2.0 * ((t * self.frequency * a / rate + a / 2.0) % a) - a
            }
        }
    }
}

/// One-shot form of [`Oscillator::new`] followed by [`Oscillator::generate`].
pub fn generate_wave(
    waveform: Waveform,
    frequency: f64,
    sample_rate: u32,
    amplitude: i16,
    duration: f64,
) -> Result<Vec<i16>> {
    Ok(Oscillator::new(frequency, sample_rate, amplitude, duration)?.generate(waveform))
}
