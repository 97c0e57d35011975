//! Benchmarks for low-level DSP primitives.

mod biquad;
mod fir;
mod waveshaper;

pub use biquad::bench_biquad;
pub use fir::bench_fir;
pub use waveshaper::bench_waveshaper;
