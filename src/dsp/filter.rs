use std::f64::consts::PI;
use std::sync::Arc;

use crate::error::{Result, SynthError};

/*
Windowed-Sinc FIR Filters
=========================

| type      | passes                | design bands (normalized) |
| --------- | --------------------- | ------------------------- |
| low-pass  | below cutoff          | [0, fc]                   |
| band-pass | between low and high  | [fl, fh]                  |
| high-pass | above cutoff          | [fc, 1]                   |

Frequencies are normalized to Nyquist: fn = 2 · f / sample_rate, so 1.0 is
half the sample rate.

Design
------

The ideal response of a band [l, r] is the difference of two sinc kernels
centered on the middle tap (m = n - (taps - 1) / 2):

    h[n] = r · sinc(r · m) - l · sinc(l · m)        sinc(x) = sin(πx) / πx

The ideal kernel is infinitely long. Truncating it to `taps` coefficients
causes ripple, so it is multiplied by a Hamming window:

    w[n] = 0.54 - 0.46 · cos(2πn / (taps - 1))

Finally the taps are scaled for unity gain at a reference frequency: DC for
low-pass, Nyquist for high-pass, the band center for band-pass.

A high-pass needs an odd tap count: an even-length symmetric FIR always has
a zero at Nyquist.

Application
-----------

    y[n] = Σ b[k] · x[n - k]     k = 0 .. taps-1

`apply` assumes silence before the block. `apply_with_history` continues
from the previous block's tail so a signal split into blocks filters
exactly like the unsplit signal.
*/

/// Which band a filter passes, with its cutoff frequencies in Hz.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FilterType {
    LowPass { cutoff: f64 },
    BandPass { low: f64, high: f64 },
    HighPass { cutoff: f64 },
}

/// Immutable FIR coefficients. Cloning shares the taps.
#[derive(Debug, Clone)]
pub struct FirFilter {
    filter_type: FilterType,
    coefficients: Arc<[f64]>,
}

impl FirFilter {
    /// Design a Hamming-windowed filter with `taps` coefficients.
    pub fn design(filter_type: FilterType, taps: usize, sample_rate: u32) -> Result<Self> {
        if taps == 0 {
            return Err(SynthError::invalid("fir_taps", "must be at least 1"));
        }
        if sample_rate == 0 {
            return Err(SynthError::invalid("sample_rate", "must be positive, got 0"));
        }

        let nyquist = f64::from(sample_rate) / 2.0;
        let normalize = |hz: f64| -> Result<f64> {
            if !(hz.is_finite() && hz > 0.0 && hz < nyquist) {
                return Err(SynthError::invalid(
                    "cutoff",
                    format!("{hz} Hz must lie strictly between 0 and {nyquist} Hz"),
                ));
            }
            Ok(hz / nyquist)
        };

        let (left, right) = match filter_type {
            FilterType::LowPass { cutoff } => (0.0, normalize(cutoff)?),
            FilterType::HighPass { cutoff } => {
                if taps % 2 == 0 {
                    return Err(SynthError::invalid(
                        "fir_taps",
                        format!("a high-pass filter needs an odd tap count, got {taps}"),
                    ));
                }
                (normalize(cutoff)?, 1.0)
            }
            FilterType::BandPass { low, high } => {
                let (l, r) = (normalize(low)?, normalize(high)?);
                if l >= r {
                    return Err(SynthError::invalid(
                        "cutoff",
                        format!("band-pass needs low < high, got {low} Hz and {high} Hz"),
                    ));
                }
                (l, r)
            }
        };

        let alpha = 0.5 * (taps - 1) as f64;
        let mut h: Vec<f64> = (0..taps)
            .map(|n| {
                let m = n as f64 - alpha;
                (right * sinc(right * m) - left * sinc(left * m)) * hamming(n, taps)
            })
            .collect();

        let scale_frequency = if left == 0.0 {
            0.0
        } else if right == 1.0 {
            1.0
        } else {
            0.5 * (left + right)
        };
        let scale: f64 = h
            .iter()
            .enumerate()
            .map(|(n, &c)| c * (PI * (n as f64 - alpha) * scale_frequency).cos())
            .sum();
        for c in h.iter_mut() {
            *c /= scale;
        }

        Ok(Self {
            filter_type,
            coefficients: h.into(),
        })
    }

    pub fn filter_type(&self) -> FilterType {
        self.filter_type
    }

    pub fn coefficients(&self) -> &[f64] {
        &self.coefficients
    }

    pub fn taps(&self) -> usize {
        self.coefficients.len()
    }

    /// Filter a block assuming silence before it.
    pub fn apply(&self, input: &[f64]) -> Vec<f64> {
        let b = &self.coefficients;
        (0..input.len())
            .map(|n| {
                b.iter()
                    .take(n + 1)
                    .enumerate()
                    .map(|(k, &c)| c * input[n - k])
                    .sum()
            })
            .collect()
    }

    /// Filter a block whose preceding `taps - 1` input samples are `history`
    /// (oldest first). `history` must hold exactly `taps - 1` samples.
    pub fn apply_with_history(&self, history: &[f64], input: &[f64]) -> Vec<f64> {
        debug_assert_eq!(history.len() + 1, self.taps());

        let b = &self.coefficients;
        let order = b.len() - 1;
        let at = |i: usize| -> f64 {
            if i < order {
                history[i]
            } else {
                input[i - order]
            }
        };

        (0..input.len())
            .map(|n| {
                b.iter()
                    .enumerate()
                    .map(|(k, &c)| c * at(n + order - k))
                    .sum()
            })
            .collect()
    }

    /// Magnitude of the frequency response at `hz`.
    pub fn response_at(&self, hz: f64, sample_rate: u32) -> f64 {
        let w = 2.0 * PI * hz / f64::from(sample_rate);
        let (re, im) = self
            .coefficients
            .iter()
            .enumerate()
            .fold((0.0, 0.0), |(re, im), (n, &c)| {
                let phase = w * n as f64;
                (re + c * phase.cos(), im - c * phase.sin())
            });
        (re * re + im * im).sqrt()
    }
}

#[inline]
fn sinc(x: f64) -> f64 {
    if x == 0.0 {
        1.0
    } else {
        let px = PI * x;
        px.sin() / px
    }
}

#[inline]
fn hamming(n: usize, taps: usize) -> f64 {
    if taps == 1 {
        return 1.0;
    }
    0.54 - 0.46 * (2.0 * PI * n as f64 / (taps - 1) as f64).cos()
}
