//! Knob-driven gain stage.

use super::saturate_i16;

/*
Knob-to-Gain Law
================

Volume and the three tone bands share one law. A knob value is turned into
decibels relative to a reference point (the offset), 3 dB per knob step:

    dB   = 3 · (knob - offset)
    gain = 10^(dB / 20)

Reference points:

    knob = offset       →  0 dB   gain 1.0   (unity, no change)
    knob = offset - 1   → -3 dB   gain 0.708
    knob = offset - 2   → -6 dB   gain 0.501 (about half amplitude)
    knob = offset + 2   → +6 dB   gain 1.995 (about double)

Below a small floor the knob is treated as "off" and the gain snaps to 0.0,
since the dB law never reaches true silence on its own:

    volume floor  0.1
    tone floor    1.0


Overflow
--------

Boosting a 16-bit signal can push it past ±32767. Samples are clamped to the
16-bit range rather than wrapped, since a wrapped sample flips sign and is
heard as a loud click.
*/

/// Knob value below which the volume is muted.
pub const VOLUME_FLOOR: f64 = 0.1;

/// Convert a knob value into a linear gain: 0 below `floor`, otherwise
/// 3 dB per knob step relative to `offset`.
#[inline]
pub fn knob_to_gain(knob: f64, offset: f64, floor: f64) -> f64 {
    if knob < floor {
        return 0.0;
    }
    let decibels = 3.0 * (knob - offset);
    10.0_f64.powf(decibels / 20.0)
}

/// Master volume: the last stage before the audio sink.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Volume {
    level: f64,
    offset: f64,
    gain: f64,
}

impl Volume {
    pub fn new(level: f64, offset: f64) -> Self {
        Self {
            level,
            offset,
            gain: knob_to_gain(level, offset, VOLUME_FLOOR),
        }
    }

    /// Store a new knob level and recompute the gain.
    pub fn configure(&mut self, level: f64) {
        self.level = level;
        self.gain = knob_to_gain(level, self.offset, VOLUME_FLOOR);
    }

    pub fn level(&self) -> f64 {
        self.level
    }

    pub fn offset(&self) -> f64 {
        self.offset
    }

    pub fn gain(&self) -> f64 {
        self.gain
    }

    /// Return a copy of `samples` scaled by the gain, clamped to 16 bits.
    pub fn change_gain(&self, samples: &[i16]) -> Vec<i16> {
        samples
            .iter()
            .map(|&s| saturate_i16(f64::from(s) * self.gain))
            .collect()
    }

    /// In-place form of [`Volume::change_gain`].
    #[inline]
    pub fn apply(&self, samples: &mut [i16]) {
        for sample in samples.iter_mut() {
            *sample = saturate_i16(f64::from(*sample) * self.gain);
        }
    }
}

impl Default for Volume {
    fn default() -> Self {
        Self::new(9.0, 9.0)
    }
}
