//! Benchmarks for RBJ-designed biquads.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use fxcore::dsp::rbj::{FilterType, RbjFilter};

use crate::{test_signal, BLOCK_SIZES};

pub fn bench_biquad(c: &mut Criterion) {
    let mut group = c.benchmark_group("dsp/biquad");

    for &size in BLOCK_SIZES {
        let input = test_signal(size);
        let mut output = vec![0.0; size];

        for filter_type in [FilterType::LowPass, FilterType::Peak, FilterType::HighShelf] {
            let mut filter = RbjFilter::new(filter_type, 1_000.0, 48_000.0)
                .and_then(|f| f.with_shelf_gain(6.0))
                .expect("valid filter");
            group.bench_with_input(BenchmarkId::new(filter_type.name(), size), &size, |b, _| {
                b.iter(|| {
                    filter.process(black_box(&mut output), black_box(&input));
                })
            });
        }

        // Coefficient recomputation on every block (parameter automation)
        let mut filter = RbjFilter::lowpass(1_000.0, 48_000.0).expect("valid filter");
        let mut cutoff = 1_000.0;
        group.bench_with_input(BenchmarkId::new("lowpass_sweep", size), &size, |b, _| {
            b.iter(|| {
                cutoff = if cutoff > 8_000.0 { 1_000.0 } else { cutoff * 1.01 };
                filter.set_cutoff(cutoff).expect("cutoff in range");
                filter.process(black_box(&mut output), black_box(&input));
            })
        });
    }

    group.finish();
}
