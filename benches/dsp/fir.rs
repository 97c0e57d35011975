//! Benchmarks for overlap-add FIR filtering, direct vs FFT.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use fxcore::dsp::fir::{ConvolutionMode, FirFilter};
use fxcore::dsp::window::{windowed_sinc_lowpass, WindowType};

use crate::{test_signal, BLOCK_SIZES};

pub fn bench_fir(c: &mut Criterion) {
    let mut group = c.benchmark_group("dsp/fir");

    for taps in [31, 255] {
        let kernel = windowed_sinc_lowpass(taps, 0.1, WindowType::Hann).expect("valid kernel");

        for &size in BLOCK_SIZES {
            let input = test_signal(size);
            let mut output = vec![0.0; size];

            for (label, mode) in [("direct", ConvolutionMode::Direct), ("fft", ConvolutionMode::Fft)] {
                let mut filter = FirFilter::with_mode(&kernel, mode).expect("valid filter");
                let id = BenchmarkId::new(format!("{label}_{taps}"), size);
                group.bench_with_input(id, &size, |b, _| {
                    b.iter(|| {
                        filter.process(black_box(&mut output), black_box(&input));
                    })
                });
            }
        }
    }

    group.finish();
}
