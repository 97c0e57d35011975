//! Block FIR filter with overlap-add state.
//!
//! Each call convolves the block with the kernel, adds the `K - 1` sample
//! tail saved from the previous call onto the front of the result, emits
//! the first `n` samples and keeps the rest as the next tail. Because the
//! tail carries everything the previous blocks still owe the output,
//! any split of a stream into blocks yields the same samples as one call.
//!
//!   block i:  [ conv(x_i, h) ......................... ]
//!             [ + tail_{i-1} ... ]
//!             |<------ n ------>|<------ K - 1 ------>|
//!                  output_i            tail_i

use std::fmt;
use std::str::FromStr;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::dsp::convolution::{convolve, FftConvolver};
use crate::error::{zeroed, DspError, DspResult};
use crate::graph::node::Processor;
use crate::MAX_BLOCK_SIZE;

/// Kernels at least this long use FFT convolution in [`ConvolutionMode::Best`].
pub const FFT_CONVOLUTION_THRESHOLD: usize = 128;

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConvolutionMode {
    Direct,
    Fft,
    /// Direct for short kernels. Long kernels use the FFT for any block
    /// long enough to amortize the transform and direct for the rest.
    #[default]
    Best,
}

impl ConvolutionMode {
    fn resolve(self, kernel_len: usize) -> Self {
        match self {
            ConvolutionMode::Best if kernel_len < FFT_CONVOLUTION_THRESHOLD => {
                ConvolutionMode::Direct
            }
            ConvolutionMode::Best => ConvolutionMode::Fft,
            mode => mode,
        }
    }
}

impl FromStr for ConvolutionMode {
    type Err = DspError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "direct" => Ok(ConvolutionMode::Direct),
            "fft" => Ok(ConvolutionMode::Fft),
            "best" => Ok(ConvolutionMode::Best),
            _ => Err(DspError::UnsupportedMode(s.to_string())),
        }
    }
}

pub struct FirFilter {
    kernel: Vec<f32>,
    overlap: Vec<f32>,
    work: Vec<f32>,
    fft: Option<FftConvolver>,
    /// Best mode: short blocks fall back to direct convolution
    adaptive: bool,
    max_block: usize,
}

impl FirFilter {
    /// Filter with [`ConvolutionMode::Best`].
    pub fn new(kernel: &[f32]) -> DspResult<Self> {
        Self::with_mode(kernel, ConvolutionMode::Best)
    }

    pub fn with_mode(kernel: &[f32], mode: ConvolutionMode) -> DspResult<Self> {
        Self::with_capacity(kernel, mode, MAX_BLOCK_SIZE)
    }

    /// `max_block` sizes the scratch buffers. Longer blocks are processed in
    /// `max_block` slices.
    pub fn with_capacity(kernel: &[f32], mode: ConvolutionMode, max_block: usize) -> DspResult<Self> {
        if kernel.is_empty() {
            return Err(DspError::invalid("kernel_length", 0.0));
        }
        if max_block == 0 {
            return Err(DspError::invalid("max_block", 0.0));
        }
        check_taps(kernel)?;

        let k = kernel.len();
        let fft = match mode.resolve(k) {
            ConvolutionMode::Fft => Some(FftConvolver::new(kernel, max_block)?),
            _ => None,
        };

        let mut taps = zeroed(k)?;
        taps.copy_from_slice(kernel);

        log::debug!(
            "fir: {k} taps, {} convolution",
            if fft.is_some() { "fft" } else { "direct" }
        );

        Ok(Self {
            kernel: taps,
            overlap: zeroed(k - 1)?,
            work: zeroed(max_block + k - 1)?,
            fft,
            adaptive: mode == ConvolutionMode::Best,
            max_block,
        })
    }

    pub fn kernel(&self) -> &[f32] {
        &self.kernel
    }

    pub fn kernel_len(&self) -> usize {
        self.kernel.len()
    }

    /// The tail carried into the next block.
    pub fn overlap(&self) -> &[f32] {
        &self.overlap
    }

    /// Resolved mode, never `Best`.
    pub fn mode(&self) -> ConvolutionMode {
        if self.fft.is_some() {
            ConvolutionMode::Fft
        } else {
            ConvolutionMode::Direct
        }
    }

    /// Swap kernel taps in place. The tail is kept, so exactly one block
    /// mixes the old kernel's tail with the new kernel.
    pub fn update_kernel(&mut self, kernel: &[f32]) -> DspResult<()> {
        if kernel.len() != self.kernel.len() {
            return Err(DspError::invalid("kernel_length", kernel.len() as f32));
        }
        check_taps(kernel)?;

        self.kernel.copy_from_slice(kernel);
        if let Some(fft) = self.fft.as_mut() {
            fft.set_kernel(kernel);
        }
        log::debug!("fir: kernel updated ({} taps)", kernel.len());
        Ok(())
    }

    /// Zero the tail. Use between unrelated streams.
    pub fn flush(&mut self) {
        self.overlap.fill(0.0);
    }

    pub fn process(&mut self, output: &mut [f32], input: &[f32]) {
        debug_assert_eq!(output.len(), input.len());

        for (out, x) in output
            .chunks_mut(self.max_block)
            .zip(input.chunks(self.max_block))
        {
            self.process_block(out, x);
        }
    }

    fn process_block(&mut self, output: &mut [f32], input: &[f32]) {
        let n = input.len();
        if n == 0 {
            return;
        }
        let tail = self.kernel.len() - 1;
        let result = &mut self.work[..n + tail];

        match self.fft.as_mut() {
            Some(fft) if !self.adaptive || fft.beats_direct(n) => fft.convolve(input, result),
            _ => convolve(input, &self.kernel, result),
        }

        for (r, &o) in result.iter_mut().zip(self.overlap.iter()) {
            *r += o;
        }
        output.copy_from_slice(&result[..n]);
        self.overlap.copy_from_slice(&result[n..]);
    }
}

fn check_taps(kernel: &[f32]) -> DspResult<()> {
    match kernel.iter().find(|t| !t.is_finite()) {
        Some(&bad) => Err(DspError::invalid("kernel", bad)),
        None => Ok(()),
    }
}

impl fmt::Debug for FirFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FirFilter")
            .field("taps", &self.kernel.len())
            .field("mode", &self.mode())
            .field("max_block", &self.max_block)
            .finish()
    }
}

impl Processor for FirFilter {
    fn process(&mut self, output: &mut [f32], input: &[f32]) {
        FirFilter::process(self, output, input);
    }

    fn set_parameter(&mut self, name: &str, _value: f32) -> DspResult<()> {
        Err(DspError::UnknownParameter(name.to_string()))
    }

    fn reset(&mut self) {
        self.flush();
    }
}
