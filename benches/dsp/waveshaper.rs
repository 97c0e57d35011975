//! Benchmarks for the oversampled waveshaper.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use fxcore::dsp::{shaper::ShapeKind, waveshaper::Waveshaper};

use crate::{test_signal, BLOCK_SIZES};

pub fn bench_waveshaper(c: &mut Criterion) {
    let mut group = c.benchmark_group("dsp/waveshaper");

    for &size in BLOCK_SIZES {
        let input = test_signal(size);
        let mut output = vec![0.0; size];

        for ratio in [1, 2, 4, 8] {
            let mut shaper = Waveshaper::new(ShapeKind::SoftClip, ratio).expect("valid ratio");
            shaper.set_pre_gain(4.0).expect("finite gain");
            shaper.set_mix(0.7).expect("mix in range");
            let id = BenchmarkId::new(format!("softclip_x{ratio}"), size);
            group.bench_with_input(id, &size, |b, _| {
                b.iter(|| {
                    shaper.process(black_box(&mut output), black_box(&input));
                })
            });
        }
    }

    // Callback-sized blocks at the highest ratio, where the decimator's
    // kernel is long enough to take the FFT path
    for size in [1, 16, 64] {
        let input = test_signal(size);
        let mut output = vec![0.0; size];
        let mut shaper = Waveshaper::new(ShapeKind::SoftClip, 16).expect("valid ratio");
        shaper.set_pre_gain(4.0).expect("finite gain");

        let id = BenchmarkId::new("softclip_x16_small", size);
        group.bench_with_input(id, &size, |b, _| {
            b.iter(|| {
                shaper.process(black_box(&mut output), black_box(&input));
            })
        });
    }

    group.finish();
}
