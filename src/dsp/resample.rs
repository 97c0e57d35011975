//! Integer-ratio interpolation and decimation.
//!
//! The upsampler is polyphase: one short FIR per output phase, each running
//! at the input rate, instead of stuffing zeros and filtering at the high
//! rate. The downsampler filters at the high rate and keeps every
//! `ratio`-th sample. Both keep their FIR tails between calls, so a stream
//! can be resampled in blocks of any length.
//!
//! Kernel lengths are chosen so the up/down pair delays the signal by
//! exactly [`RESAMPLER_LATENCY`] input-rate samples.

use crate::dsp::fir::{ConvolutionMode, FirFilter};
use crate::dsp::window::{windowed_sinc_lowpass, WindowType};
use crate::error::{zeroed, DspError, DspResult};
use crate::MAX_BLOCK_SIZE;

/// Taps in each polyphase branch.
pub const TAPS_PER_PHASE: usize = 32;
/// Largest supported oversampling ratio.
pub const MAX_RATIO: usize = 16;
/// Input-rate delay of an upsampler followed by a downsampler (ratio > 1).
pub const RESAMPLER_LATENCY: usize = TAPS_PER_PHASE;

/// Passband edge as a fraction of the input-rate Nyquist.
const PASSBAND: f32 = 0.9;

fn check_ratio(ratio: usize) -> DspResult<()> {
    if ratio == 0 || ratio > MAX_RATIO {
        return Err(DspError::invalid("oversample_ratio", ratio as f32));
    }
    Ok(())
}

fn cutoff(ratio: usize) -> f32 {
    PASSBAND * 0.5 / ratio as f32
}

pub struct Upsampler {
    ratio: usize,
    phases: Vec<FirFilter>,
    scratch: Vec<f32>,
    max_block: usize,
}

impl Upsampler {
    pub fn new(ratio: usize) -> DspResult<Self> {
        Self::with_capacity(ratio, MAX_BLOCK_SIZE)
    }

    /// `max_block` is counted in input samples.
    pub fn with_capacity(ratio: usize, max_block: usize) -> DspResult<Self> {
        check_ratio(ratio)?;
        if max_block == 0 {
            return Err(DspError::invalid("max_block", 0.0));
        }

        let mut phases = Vec::new();
        if ratio > 1 {
            // Odd prototype, padded with one zero so it splits evenly
            let mut prototype =
                windowed_sinc_lowpass(ratio * TAPS_PER_PHASE - 1, cutoff(ratio), WindowType::Blackman)?;
            prototype.push(0.0);
            for tap in &mut prototype {
                *tap *= ratio as f32;
            }

            for phase in 0..ratio {
                let taps: Vec<f32> = prototype.iter().skip(phase).step_by(ratio).copied().collect();
                phases.push(FirFilter::with_capacity(&taps, ConvolutionMode::Direct, max_block)?);
            }
        }

        log::debug!("upsampler: x{ratio}, {} branches", phases.len());

        Ok(Self {
            ratio,
            phases,
            scratch: zeroed(if ratio > 1 { max_block } else { 0 })?,
            max_block,
        })
    }

    pub fn ratio(&self) -> usize {
        self.ratio
    }

    /// Group delay in output-rate samples.
    pub fn latency(&self) -> usize {
        if self.ratio == 1 {
            0
        } else {
            (self.ratio * TAPS_PER_PHASE - 2) / 2
        }
    }

    /// Writes `ratio * input.len()` samples into `output`.
    pub fn process(&mut self, output: &mut [f32], input: &[f32]) {
        debug_assert_eq!(output.len(), input.len() * self.ratio);

        if self.ratio == 1 {
            output.copy_from_slice(input);
            return;
        }

        let ratio = self.ratio;
        for (out, x) in output
            .chunks_mut(self.max_block * ratio)
            .zip(input.chunks(self.max_block))
        {
            let n = x.len();
            for (phase, branch) in self.phases.iter_mut().enumerate() {
                let scratch = &mut self.scratch[..n];
                branch.process(scratch, x);
                for (i, &y) in scratch.iter().enumerate() {
                    out[i * ratio + phase] = y;
                }
            }
        }
    }

    pub fn flush(&mut self) {
        for branch in &mut self.phases {
            branch.flush();
        }
    }
}

pub struct Downsampler {
    ratio: usize,
    filter: Option<FirFilter>,
    scratch: Vec<f32>,
    max_block: usize,
}

impl Downsampler {
    pub fn new(ratio: usize) -> DspResult<Self> {
        Self::with_capacity(ratio, MAX_BLOCK_SIZE)
    }

    /// `max_block` is counted in output samples.
    pub fn with_capacity(ratio: usize, max_block: usize) -> DspResult<Self> {
        check_ratio(ratio)?;
        if max_block == 0 {
            return Err(DspError::invalid("max_block", 0.0));
        }

        let filter = if ratio > 1 {
            let kernel =
                windowed_sinc_lowpass(ratio * TAPS_PER_PHASE + 3, cutoff(ratio), WindowType::Blackman)?;
            Some(FirFilter::with_capacity(
                &kernel,
                ConvolutionMode::Best,
                max_block * ratio,
            )?)
        } else {
            None
        };

        log::debug!("downsampler: x{ratio}");

        Ok(Self {
            ratio,
            filter,
            scratch: zeroed(if ratio > 1 { max_block * ratio } else { 0 })?,
            max_block,
        })
    }

    pub fn ratio(&self) -> usize {
        self.ratio
    }

    /// Group delay in input-rate (high rate) samples.
    pub fn latency(&self) -> usize {
        if self.ratio == 1 {
            0
        } else {
            (self.ratio * TAPS_PER_PHASE + 2) / 2
        }
    }

    /// Reads `ratio * output.len()` samples from `input`.
    pub fn process(&mut self, output: &mut [f32], input: &[f32]) {
        debug_assert_eq!(input.len(), output.len() * self.ratio);

        let Some(filter) = self.filter.as_mut() else {
            output.copy_from_slice(input);
            return;
        };

        let ratio = self.ratio;
        for (out, x) in output
            .chunks_mut(self.max_block)
            .zip(input.chunks(self.max_block * ratio))
        {
            let filtered = &mut self.scratch[..x.len()];
            filter.process(filtered, x);
            for (o, &y) in out.iter_mut().zip(filtered.iter().step_by(ratio)) {
                *o = y;
            }
        }
    }

    pub fn flush(&mut self) {
        if let Some(filter) = self.filter.as_mut() {
            filter.flush();
        }
    }
}
