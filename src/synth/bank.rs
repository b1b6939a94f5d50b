use std::collections::HashMap;
use std::sync::Arc;

use super::note::Note;
use crate::config::SynthConfig;
use crate::dsp::oscillator::{Oscillator, Waveform};
use crate::error::Result;

/// Precomputed, read-only wave buffers for every (waveform, note) pair.
///
/// Buffers are `Arc<[i16]>` so voices share them without copying or locking.
#[derive(Debug, Clone, Default)]
pub struct WaveBank {
    waves: HashMap<(Waveform, Note), Arc<[i16]>>,
}

impl WaveBank {
    /// Render C0..B8 for all four waveforms.
    pub fn build(config: &SynthConfig) -> Result<Self> {
        Self::build_notes(config, Note::bank_range())
    }

    /// Render only `notes`. Useful when startup time matters more than range.
    pub fn build_notes(config: &SynthConfig, notes: impl IntoIterator<Item = Note>) -> Result<Self> {
        let mut waves: HashMap<(Waveform, Note), Arc<[i16]>> = HashMap::new();
        for note in notes {
            let osc = Oscillator::new(
                note.frequency(),
                config.sample_rate,
                config.max_amplitude,
                config.wave_duration,
            )?;
            for waveform in Waveform::ALL {
                waves.insert((waveform, note), Arc::from(osc.generate(waveform)));
            }
        }
        tracing::info!(buffers = waves.len(), "wave bank ready");
        Ok(Self { waves })
    }

    pub fn get(&self, waveform: Waveform, note: Note) -> Option<Arc<[i16]>> {
        self.waves.get(&(waveform, note)).cloned()
    }

    pub fn len(&self) -> usize {
        self.waves.len()
    }

    pub fn is_empty(&self) -> bool {
        self.waves.is_empty()
    }
}
