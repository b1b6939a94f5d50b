//! Configuration constants and TOML loading.
//!
//! Every option has a default, so an empty file (or no file) yields the
//! stock instrument:
//!
//! ```toml
//! sample_rate = 48000
//! waveform = "triangle"
//! attack = 1.5
//! tone_enabled = true
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::dsp::envelope::{self, AdsrParams};
use crate::dsp::oscillator::Waveform;
use crate::dsp::tone::{self, ToneSettings};
use crate::error::{Result, SynthError};

/// Largest octave shift that can still reach a note in the wave bank.
pub const MAX_OCTAVE_SHIFT: i8 = 8;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SynthConfig {
    /// Output sample rate in Hz.
    pub sample_rate: u32,
    /// Peak amplitude of the precomputed waves.
    pub max_amplitude: i16,
    /// Length in seconds of each precomputed wave (before cropping).
    pub wave_duration: f64,

    pub attack: f64,
    pub decay: f64,
    pub sustain: f64,
    pub release: f64,

    pub volume: f64,
    pub volume_offset: f64,

    pub bass: f64,
    pub mid: f64,
    pub treble: f64,
    pub tone_offset: f64,
    /// Bass/mid crossover in Hz.
    pub first_stop: f64,
    /// Mid/treble crossover in Hz.
    pub second_stop: f64,
    pub fir_taps: usize,
    /// Insert the tone filter between envelope and volume.
    pub tone_enabled: bool,

    pub waveform: Waveform,
    /// Whole-octave transpose applied to every note trigger.
    pub octave_shift: i8,

    /// Audio worker threads (maximum simultaneously sounding voices).
    pub workers: usize,
    /// Voice tasks allowed to wait for a free worker.
    pub queue_depth: usize,
    /// MIDI input port name to connect to; the first port when unset.
    pub midi_port: Option<String>,
}

impl Default for SynthConfig {
    fn default() -> Self {
        let adsr = AdsrParams::default();
        Self {
            sample_rate: 48_000,
            max_amplitude: 8192,
            wave_duration: 0.2,

            attack: adsr.attack,
            decay: adsr.decay,
            sustain: adsr.sustain,
            release: adsr.release,

            volume: 9.0,
            volume_offset: 9.0,

            bass: tone::DEFAULT_KNOB,
            mid: tone::DEFAULT_KNOB,
            treble: tone::DEFAULT_KNOB,
            tone_offset: tone::DEFAULT_OFFSET,
            first_stop: tone::DEFAULT_FIRST_STOP,
            second_stop: tone::DEFAULT_SECOND_STOP,
            fir_taps: tone::DEFAULT_TAPS,
            tone_enabled: false,

            waveform: Waveform::Sine,
            octave_shift: 0,

            workers: 4,
            queue_depth: 8,
            midi_port: None,
        }
    }
}

impl SynthConfig {
    /// Read and validate a TOML config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| SynthError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml(&text)?;
        tracing::info!(path = %path.display(), "loaded config");
        Ok(config)
    }

    /// Parse and validate TOML text.
    pub fn from_toml(text: &str) -> Result<Self> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.sample_rate == 0 {
            return Err(SynthError::invalid("sample_rate", "must be positive, got 0"));
        }
        if !(self.wave_duration.is_finite() && self.wave_duration > 0.0) {
            return Err(SynthError::invalid(
                "wave_duration",
                format!("must be positive, got {}", self.wave_duration),
            ));
        }
        for (param, knob) in [
            ("attack", self.attack),
            ("decay", self.decay),
            ("release", self.release),
        ] {
            envelope::phase_samples(param, knob, self.sample_rate)?;
        }
        if !(self.sustain.is_finite() && self.sustain >= 0.0) {
            return Err(SynthError::invalid(
                "sustain",
                format!("must be non-negative, got {}", self.sustain),
            ));
        }
        if !(-MAX_OCTAVE_SHIFT..=MAX_OCTAVE_SHIFT).contains(&self.octave_shift) {
            return Err(SynthError::invalid(
                "octave_shift",
                format!(
                    "must be within ±{MAX_OCTAVE_SHIFT}, got {}",
                    self.octave_shift
                ),
            ));
        }

        let nyquist = f64::from(self.sample_rate) / 2.0;
        if !(self.first_stop > 0.0 && self.first_stop < self.second_stop && self.second_stop < nyquist)
        {
            return Err(SynthError::invalid(
                "first_stop",
                format!(
                    "crossovers must satisfy 0 < {} < {} < {nyquist} Hz",
                    self.first_stop, self.second_stop
                ),
            ));
        }
        if self.fir_taps % 2 == 0 {
            return Err(SynthError::invalid(
                "fir_taps",
                format!("must be odd, got {}", self.fir_taps),
            ));
        }
        if self.workers == 0 {
            return Err(SynthError::invalid("workers", "need at least one audio worker"));
        }
        if self.queue_depth == 0 {
            return Err(SynthError::invalid("queue_depth", "must be at least 1"));
        }
        Ok(())
    }

    pub fn adsr(&self) -> AdsrParams {
        AdsrParams {
            attack: self.attack,
            decay: self.decay,
            sustain: self.sustain,
            release: self.release,
        }
    }

    pub fn tone_settings(&self) -> ToneSettings {
        ToneSettings {
            bass: self.bass,
            mid: self.mid,
            treble: self.treble,
            offset: self.tone_offset,
            first_stop: self.first_stop,
            second_stop: self.second_stop,
            taps: self.fir_taps,
            sample_rate: self.sample_rate,
        }
    }
}
