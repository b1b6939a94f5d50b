//! Three-band tone control (bass / mid / treble).

use super::filter::{FilterType, FirFilter};
use super::volume::knob_to_gain;
use crate::error::Result;

/*
Tone Control
============

The signal is split into three bands by FIR filters that all see the same
input, each band is scaled by its own knob, and the bands are summed:

              ┌─ low-pass  (< first_stop)            × bass gain ──┐
    input ────┼─ band-pass (first_stop..second_stop) × mid gain  ──┼── Σ ── out
              └─ high-pass (> second_stop)           × treble gain ┘

With all knobs at the reference value (5) every gain is 1.0 and the bands
sum back to roughly the original signal. Turning a knob down cuts that
band, turning it up boosts it, 3 dB per step.

Crossover frequencies are fixed for the lifetime of a `Tone`; only the
gains move at runtime. Changing a gain never touches the coefficients.
*/

pub const DEFAULT_KNOB: f64 = 5.0;
pub const DEFAULT_OFFSET: f64 = 5.0;
pub const DEFAULT_FIRST_STOP: f64 = 300.0;
pub const DEFAULT_SECOND_STOP: f64 = 4_000.0;
pub const DEFAULT_TAPS: usize = 255;

/// Knob value below which a band is muted.
pub const TONE_FLOOR: f64 = 1.0;

/// One band: its filter and the gain its knob currently maps to.
#[derive(Debug, Clone)]
pub struct ToneBand {
    filter: FirFilter,
    knob: f64,
    offset: f64,
    gain: f64,
}

impl ToneBand {
    fn new(filter: FirFilter, knob: f64, offset: f64) -> Self {
        Self {
            filter,
            knob,
            offset,
            gain: knob_to_gain(knob, offset, TONE_FLOOR),
        }
    }

    /// Update the knob and recompute the gain.
    pub fn config(&mut self, knob: f64) {
        self.knob = knob;
        self.gain = knob_to_gain(knob, self.offset, TONE_FLOOR);
    }

    pub fn knob(&self) -> f64 {
        self.knob
    }

    pub fn gain(&self) -> f64 {
        self.gain
    }

    pub fn filter(&self) -> &FirFilter {
        &self.filter
    }
}

/// Crossovers and starting knob values for a [`Tone`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ToneSettings {
    pub bass: f64,
    pub mid: f64,
    pub treble: f64,
    pub offset: f64,
    pub first_stop: f64,
    pub second_stop: f64,
    pub taps: usize,
    pub sample_rate: u32,
}

impl Default for ToneSettings {
    fn default() -> Self {
        Self {
            bass: DEFAULT_KNOB,
            mid: DEFAULT_KNOB,
            treble: DEFAULT_KNOB,
            offset: DEFAULT_OFFSET,
            first_stop: DEFAULT_FIRST_STOP,
            second_stop: DEFAULT_SECOND_STOP,
            taps: DEFAULT_TAPS,
            sample_rate: 48_000,
        }
    }
}

/// Input tail carried between blocks by [`Tone::filter_with_history`].
#[derive(Debug, Clone)]
pub struct ToneHistory {
    samples: Vec<f64>,
}

impl ToneHistory {
    /// Silence, sized for `tone`'s tap count.
    pub fn new(tone: &Tone) -> Self {
        Self {
            samples: vec![0.0; tone.order()],
        }
    }

    fn advance(&mut self, block: &[f64]) {
        let order = self.samples.len();
        if order == 0 {
            return;
        }
        if block.len() >= order {
            self.samples.copy_from_slice(&block[block.len() - order..]);
        } else {
            self.samples.rotate_left(block.len());
            self.samples[order - block.len()..].copy_from_slice(block);
        }
    }
}

#[derive(Debug, Clone)]
pub struct Tone {
    bass: ToneBand,
    mid: ToneBand,
    treble: ToneBand,
}

impl Tone {
    /// Design the three band filters. This is the only place coefficients
    /// are computed.
    pub fn new(settings: ToneSettings) -> Result<Self> {
        let ToneSettings {
            bass,
            mid,
            treble,
            offset,
            first_stop,
            second_stop,
            taps,
            sample_rate,
        } = settings;

        let low = FirFilter::design(FilterType::LowPass { cutoff: first_stop }, taps, sample_rate)?;
        let band = FirFilter::design(
            FilterType::BandPass {
                low: first_stop,
                high: second_stop,
            },
            taps,
            sample_rate,
        )?;
        let high = FirFilter::design(
            FilterType::HighPass {
                cutoff: second_stop,
            },
            taps,
            sample_rate,
        )?;

        tracing::debug!(first_stop, second_stop, taps, "designed tone filters");

        Ok(Self {
            bass: ToneBand::new(low, bass, offset),
            mid: ToneBand::new(band, mid, offset),
            treble: ToneBand::new(high, treble, offset),
        })
    }

    pub fn set_bass(&mut self, knob: f64) {
        self.bass.config(knob);
    }

    pub fn set_mid(&mut self, knob: f64) {
        self.mid.config(knob);
    }

    pub fn set_treble(&mut self, knob: f64) {
        self.treble.config(knob);
    }

    pub fn bass(&self) -> &ToneBand {
        &self.bass
    }

    pub fn mid(&self) -> &ToneBand {
        &self.mid
    }

    pub fn treble(&self) -> &ToneBand {
        &self.treble
    }

    /// Filter a block with silence assumed before it.
    pub fn filter(&self, samples: &[f64]) -> Vec<f64> {
        let low = self.bass.filter.apply(samples);
        let band = self.mid.filter.apply(samples);
        let high = self.treble.filter.apply(samples);
        self.sum_bands(&low, &band, &high)
    }

    /// Filter a block that continues from `history`, then advance it.
    pub fn filter_with_history(&self, samples: &[f64], history: &mut ToneHistory) -> Vec<f64> {
        let past = &history.samples;
        let low = self.bass.filter.apply_with_history(past, samples);
        let band = self.mid.filter.apply_with_history(past, samples);
        let high = self.treble.filter.apply_with_history(past, samples);
        history.advance(samples);
        self.sum_bands(&low, &band, &high)
    }

    fn order(&self) -> usize {
        self.bass.filter.taps() - 1
    }

    fn sum_bands(&self, low: &[f64], band: &[f64], high: &[f64]) -> Vec<f64> {
        let (gl, gm, gh) = (self.bass.gain, self.mid.gain, self.treble.gain);
        low.iter()
            .zip(band)
            .zip(high)
            .map(|((&l, &m), &h)| l * gl + m * gm + h * gh)
            .collect()
    }
}
