use std::sync::{Arc, Mutex, PoisonError};

use crate::error::Result;

/// Where a voice's finished blocks go: mono, 16-bit, at the configured rate.
///
/// `write` may block until the device has room; that wait is what paces a
/// playback loop to real time.
pub trait AudioSink {
    fn write(&mut self, block: &[i16]) -> Result<()>;

    /// Wait for written samples to be played.
    fn flush(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Opens one sink per voice. Called from the audio worker that will use it.
pub trait SinkFactory: Send + Sync {
    fn open(&self, block_len: usize) -> Result<Box<dyn AudioSink>>;
}

/// Records every block in memory. Clones share the same recording, so a
/// test can keep one handle and give another to the engine.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    blocks: Arc<Mutex<Vec<Vec<i16>>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn blocks(&self) -> Vec<Vec<i16>> {
        self.blocks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// All recorded samples, concatenated.
    pub fn samples(&self) -> Vec<i16> {
        self.blocks().concat()
    }

    pub fn clear(&self) {
        self.blocks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

impl AudioSink for MemorySink {
    fn write(&mut self, block: &[i16]) -> Result<()> {
        self.blocks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(block.to_vec());
        Ok(())
    }
}

impl SinkFactory for MemorySink {
    fn open(&self, _block_len: usize) -> Result<Box<dyn AudioSink>> {
        Ok(Box::new(self.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_recording() {
        let sink = MemorySink::new();
        let mut opened = sink.open(3).unwrap();
        opened.write(&[1, 2, 3]).unwrap();
        opened.write(&[4]).unwrap();
        opened.flush().unwrap();
        assert_eq!(sink.blocks(), vec![vec![1, 2, 3], vec![4]]);
        assert_eq!(sink.samples(), vec![1, 2, 3, 4]);
        sink.clear();
        assert!(sink.samples().is_empty());
    }
}
