//! Benchmarks for the DSP stages.

mod envelope;
mod oscillator;
mod tone;
mod volume;

pub use envelope::bench_envelope;
pub use oscillator::bench_oscillator;
pub use tone::bench_tone;
pub use volume::bench_volume;
