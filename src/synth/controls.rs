use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{PoisonError, RwLock};

use crate::dsp::tone::Tone;
use crate::dsp::volume::Volume;

/// Volume and tone shared between the dispatcher (writer) and playback
/// workers (readers).
///
/// Workers never hold a lock while rendering: they copy a [`ControlSnapshot`]
/// once per block, so a change lands on the next block and a half-written
/// gain is never observed.
#[derive(Debug)]
pub struct SharedControls {
    volume: RwLock<Volume>,
    tone: RwLock<Tone>,
    tone_enabled: AtomicBool,
}

/// Consistent view of the output stages for one block.
#[derive(Debug, Clone)]
pub struct ControlSnapshot {
    pub volume: Volume,
    /// `None` while the tone stage is bypassed.
    pub tone: Option<Tone>,
}

impl SharedControls {
    pub fn new(volume: Volume, tone: Tone, tone_enabled: bool) -> Self {
        Self {
            volume: RwLock::new(volume),
            tone: RwLock::new(tone),
            tone_enabled: AtomicBool::new(tone_enabled),
        }
    }

    pub fn snapshot(&self) -> ControlSnapshot {
        let volume = *self.volume.read().unwrap_or_else(PoisonError::into_inner);
        let tone = self
            .tone_enabled()
            .then(|| self.tone.read().unwrap_or_else(PoisonError::into_inner).clone());
        ControlSnapshot { volume, tone }
    }

    pub fn set_volume(&self, level: f64) {
        self.volume
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .configure(level);
    }

    /// Change the tone in place (gains only; coefficients never move).
    pub fn update_tone(&self, f: impl FnOnce(&mut Tone)) {
        let mut tone = self.tone.write().unwrap_or_else(PoisonError::into_inner);
        f(&mut *tone);
    }

    pub fn set_tone_enabled(&self, enabled: bool) {
        self.tone_enabled.store(enabled, Ordering::Release);
    }

    pub fn tone_enabled(&self) -> bool {
        self.tone_enabled.load(Ordering::Acquire)
    }
}
