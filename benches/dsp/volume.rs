//! Benchmarks for the gain stage.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use snake_synth::dsp::volume::Volume;

use crate::BLOCK_SIZES;

pub fn bench_volume(c: &mut Criterion) {
    let mut group = c.benchmark_group("dsp/volume");
    let volume = Volume::new(7.0, 9.0);

    for &size in BLOCK_SIZES {
        let mut buffer = vec![12_000i16; size];
        group.bench_with_input(BenchmarkId::new("apply", size), &size, |b, _| {
            b.iter(|| volume.apply(black_box(&mut buffer)))
        });
    }

    group.finish();
}
