//! Benchmarks for the synthesis stages.
//!
//! Run with: cargo bench
//!
//! Every block a voice renders must be ready before the device drains the
//! previous one. Reference timing at 48kHz sample rate:
//!   - 64 samples   = 1.33ms deadline
//!   - 256 samples  = 5.33ms deadline
//!   - 1024 samples = 21.3ms deadline
//!   - 9491 samples = 198ms deadline (one A4 wave buffer)
//!
//! Benchmark groups:
//!   - dsp/oscillator  Wave bank generation
//!   - dsp/envelope    Envelope processing per phase
//!   - dsp/tone        Three-band FIR tone stage
//!   - dsp/volume      Gain stage

use criterion::{criterion_group, criterion_main};

mod dsp;

/// Block sizes to measure, up to a full wave buffer.
pub const BLOCK_SIZES: &[usize] = &[64, 256, 1024, 9491];

criterion_group!(
    benches,
    dsp::bench_oscillator,
    dsp::bench_envelope,
    dsp::bench_tone,
    dsp::bench_volume,
);
criterion_main!(benches);
