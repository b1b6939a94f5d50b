//! Benchmarks for the ADSR envelope.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use snake_synth::dsp::envelope::{AdsrParams, Envelope};

use crate::BLOCK_SIZES;

fn render(env: &mut Envelope, input: &[i16], out: &mut [f64]) {
    for (o, &s) in out.iter_mut().zip(input) {
        *o = env.process(s).unwrap_or(0.0);
    }
}

pub fn bench_envelope(c: &mut Criterion) {
    let mut group = c.benchmark_group("dsp/envelope");
    let slow = AdsrParams {
        attack: 1_000.0,
        decay: 1_000.0,
        sustain: 8.0,
        release: 1_000.0,
    };

    for &size in BLOCK_SIZES {
        let input = vec![8192i16; size];
        let mut out = vec![0.0f64; size];

        // Attack phase (ramp lookup per sample)
        let mut env = Envelope::triggered(slow, 48_000).unwrap();
        group.bench_with_input(BenchmarkId::new("attack", size), &size, |b, _| {
            b.iter(|| render(&mut env, black_box(&input), black_box(&mut out)))
        });

        // Sustain phase (constant multiply)
        let fast = AdsrParams {
            attack: 0.0,
            decay: 0.0,
            ..slow
        };
        let mut env = Envelope::triggered(fast, 48_000).unwrap();
        env.process(0);
        env.process(0);
        group.bench_with_input(BenchmarkId::new("sustain", size), &size, |b, _| {
            b.iter(|| render(&mut env, black_box(&input), black_box(&mut out)))
        });

        // Release phase
        let mut env = Envelope::triggered(slow, 48_000).unwrap();
        env.note_off();
        group.bench_with_input(BenchmarkId::new("release", size), &size, |b, _| {
            b.iter(|| render(&mut env, black_box(&input), black_box(&mut out)))
        });
    }

    group.finish();
}
