//! Benchmarks for wave buffer generation.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use snake_synth::dsp::oscillator::{Oscillator, Waveform};

pub fn bench_oscillator(c: &mut Criterion) {
    let mut group = c.benchmark_group("dsp/oscillator");

    // One bank entry: 0.2 s at 48 kHz.
    let osc = Oscillator::new(440.0, 48_000, 8192, 0.2).unwrap();
    for waveform in Waveform::ALL {
        group.bench_with_input(
            BenchmarkId::new("buffer", waveform),
            &waveform,
            |b, &waveform| b.iter(|| black_box(osc.generate(black_box(waveform)))),
        );
    }

    group.finish();
}
