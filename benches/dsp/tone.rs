//! Benchmarks for the three-band tone stage.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use snake_synth::dsp::tone::{Tone, ToneHistory, ToneSettings};

use crate::BLOCK_SIZES;

pub fn bench_tone(c: &mut Criterion) {
    let mut group = c.benchmark_group("dsp/tone");

    group.bench_function("design", |b| {
        b.iter(|| Tone::new(black_box(ToneSettings::default())).unwrap())
    });

    let tone = Tone::new(ToneSettings::default()).unwrap();
    for &size in BLOCK_SIZES {
        let input: Vec<f64> = (0..size).map(|i| ((i * 37) % 200) as f64 - 100.0).collect();

        // 255 taps x 3 bands per sample
        let mut history = ToneHistory::new(&tone);
        group.bench_with_input(BenchmarkId::new("filter", size), &size, |b, _| {
            b.iter(|| tone.filter_with_history(black_box(&input), &mut history))
        });
    }

    group.finish();
}
