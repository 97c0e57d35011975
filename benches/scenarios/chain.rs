//! A typical drive chain: highpass, oversampled soft clip, tone lowpass.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use fxcore::dsp::{rbj::FilterType, shaper::ShapeKind};
use fxcore::graph::Processor;
use fxcore::patch::{FilterDescriptor, Patch, StageDescriptor, WaveshaperDescriptor};

use crate::{test_signal, BLOCK_SIZES};

fn drive_patch() -> Patch {
    let mut drive = WaveshaperDescriptor::new(ShapeKind::SoftClip, 4);
    drive.pre_gain = 6.0;
    drive.post_gain = 0.5;

    Patch::new("drive")
        .expect("valid name")
        .with_stage(StageDescriptor::Rbj(FilterDescriptor::new(
            FilterType::HighPass,
            80.0,
            48_000.0,
        )))
        .with_stage(StageDescriptor::Waveshaper(drive))
        .with_stage(StageDescriptor::Rbj(FilterDescriptor::new(
            FilterType::LowPass,
            6_000.0,
            48_000.0,
        )))
}

pub fn bench_chain(c: &mut Criterion) {
    let mut group = c.benchmark_group("scenarios/chain");

    for &size in BLOCK_SIZES {
        let input = test_signal(size);
        let mut output = vec![0.0; size];
        let mut chain = drive_patch().build().expect("valid patch");

        group.bench_with_input(BenchmarkId::new("drive", size), &size, |b, _| {
            b.iter(|| {
                chain.process(black_box(&mut output), black_box(&input));
            })
        });
    }

    group.finish();
}
