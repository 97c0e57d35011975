//! Low-level DSP primitives.
//!
//! Every component here does its allocation and validation at construction
//! or in a parameter setter. The `process` calls never allocate and never
//! fail, so they are safe to drive from a realtime audio callback. Streaming
//! state (biquad registers, FIR overlap tails, resampler history) persists
//! between calls until `reset`/`flush`.

/// Direct Form II Transposed biquad engine.
pub mod biquad;
/// Direct and FFT block convolution.
pub mod convolution;
/// Biquad state registers and fixed sample delays.
pub mod delay;
/// Overlap-add FIR filter.
pub mod fir;
/// Dry/wet blending and gain helpers.
pub mod mix;
/// RBJ cookbook coefficient design and the filter built on it.
pub mod rbj;
/// Polyphase upsampler and decimating downsampler.
pub mod resample;
/// Waveshaping transfer functions.
pub mod shaper;
/// Oversampled waveshaper.
pub mod waveshaper;
/// Window functions and windowed-sinc design.
pub mod window;

pub use biquad::{Biquad, BiquadCoefficients};
pub use fir::{ConvolutionMode, FirFilter};
pub use rbj::{FilterParams, FilterType, RbjFilter};
pub use resample::{Downsampler, Upsampler};
pub use shaper::{ShapeFunction, ShapeKind};
pub use waveshaper::Waveshaper;
