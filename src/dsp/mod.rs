//! Signal-processing stages of the synthesizer.
//!
//! Everything here is plain data plus math: no threads, no devices. The
//! synth layer wires these stages into a playback loop and shares them
//! across threads.

/// Attack/decay/sustain/release envelope over precomputed ramps.
pub mod envelope;
/// Windowed-sinc FIR filter design and application.
pub mod filter;
/// Loopable waveform buffers for the oscillator bank.
pub mod oscillator;
/// Bass/mid/treble tone control.
pub mod tone;
/// Volume stage and the knob-to-gain law.
pub mod volume;

pub use envelope::{AdsrParams, Envelope, EnvelopeState};
pub use oscillator::{generate_wave, Oscillator, Waveform};
pub use tone::{Tone, ToneHistory, ToneSettings};
pub use volume::Volume;

/// Convert to a 16-bit sample, truncating toward zero and clamping to range.
#[inline]
pub fn saturate_i16(value: f64) -> i16 {
    if value.is_nan() {
        return 0;
    }
    value.clamp(f64::from(i16::MIN), f64::from(i16::MAX)) as i16
}
