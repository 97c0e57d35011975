//! Linear convolution, direct and FFT-based.
//!
//! Both produce the full `n + K - 1` sample result of convolving an
//! `n`-sample block with a `K`-tap kernel. Overlap bookkeeping lives in the
//! FIR filter; these routines only ever see one block.

use std::fmt;
use std::sync::Arc;

use rustfft::{num_complex::Complex, Fft, FftPlanner};

use crate::error::{zeroed, DspError, DspResult};

/// Textbook linear convolution into `dest` (`input.len() + kernel.len() - 1`).
pub fn convolve(input: &[f32], kernel: &[f32], dest: &mut [f32]) {
    debug_assert!(!kernel.is_empty());
    debug_assert_eq!(dest.len(), input.len() + kernel.len() - 1);

    dest.fill(0.0);
    for (i, &x) in input.iter().enumerate() {
        for (d, &h) in dest[i..i + kernel.len()].iter_mut().zip(kernel.iter()) {
            *d += x * h;
        }
    }
}

/// One planned transform size and the kernel spectrum at that size.
struct Transform {
    len: usize,
    forward: Arc<dyn Fft<f32>>,
    inverse: Arc<dyn Fft<f32>>,
    kernel_spectrum: Vec<Complex<f32>>,
}

/// Fast convolution against a fixed kernel via zero-padded FFTs.
///
/// Every power of two from the kernel length up to the largest block's full
/// result is planned at construction. Each call then runs the smallest
/// transform that holds its own `n + K - 1` result, so short blocks pay for
/// short transforms and no circular wraparound can occur.
pub struct FftConvolver {
    kernel_len: usize,
    transforms: Vec<Transform>,
    buffer: Vec<Complex<f32>>,
    scratch: Vec<Complex<f32>>,
}

impl FftConvolver {
    pub fn new(kernel: &[f32], max_block: usize) -> DspResult<Self> {
        if kernel.is_empty() {
            return Err(DspError::invalid("kernel_length", 0.0));
        }
        if max_block == 0 {
            return Err(DspError::invalid("max_block", 0.0));
        }

        let min_len = kernel.len().next_power_of_two();
        let max_len = (max_block + kernel.len() - 1).next_power_of_two();
        let mut planner = FftPlanner::<f32>::new();
        let mut transforms = Vec::new();
        let mut scratch_len = 0;

        let mut len = min_len;
        while len <= max_len {
            let forward = planner.plan_fft_forward(len);
            let inverse = planner.plan_fft_inverse(len);
            scratch_len = scratch_len
                .max(forward.get_inplace_scratch_len())
                .max(inverse.get_inplace_scratch_len());
            transforms.push(Transform {
                len,
                forward,
                inverse,
                kernel_spectrum: zeroed(len)?,
            });
            len *= 2;
        }

        log::debug!(
            "fft convolver: {} taps, block {max_block}, transforms {min_len}..={max_len}",
            kernel.len()
        );

        let mut convolver = Self {
            kernel_len: kernel.len(),
            transforms,
            buffer: zeroed(max_len)?,
            scratch: zeroed(scratch_len)?,
        };
        convolver.set_kernel(kernel);
        Ok(convolver)
    }

    /// Largest planned transform.
    pub fn fft_len(&self) -> usize {
        self.buffer.len()
    }

    /// Largest block that fits the transform without wraparound.
    pub fn max_block(&self) -> usize {
        self.fft_len() + 1 - self.kernel_len
    }

    /// Transform length used for an `n`-sample block.
    pub fn transform_len(&self, n: usize) -> usize {
        (n + self.kernel_len - 1).next_power_of_two()
    }

    /// Whether an `n`-sample block is cheaper through the FFT than direct.
    ///
    /// Direct costs `n·K` multiply-adds. The FFT path costs two transforms
    /// of `L/2·log2(L)` complex butterflies plus `L` complex products, at
    /// four real multiply-adds each.
    pub fn beats_direct(&self, n: usize) -> bool {
        let len = self.transform_len(n);
        let log2 = len.trailing_zeros() as usize;
        n * self.kernel_len > 4 * len * (log2 + 1)
    }

    /// Recompute the kernel spectra. Length must match the kernel given at construction.
    pub fn set_kernel(&mut self, kernel: &[f32]) {
        debug_assert_eq!(kernel.len(), self.kernel_len);

        for transform in &mut self.transforms {
            // Fold the 1/N inverse scaling into the kernel once
            let scale = 1.0 / transform.len as f32;
            for (i, bin) in transform.kernel_spectrum.iter_mut().enumerate() {
                let tap = kernel.get(i).copied().unwrap_or(0.0);
                *bin = Complex::new(tap * scale, 0.0);
            }
            let scratch_len = transform.forward.get_inplace_scratch_len();
            transform
                .forward
                .process_with_scratch(&mut transform.kernel_spectrum, &mut self.scratch[..scratch_len]);
        }
    }

    /// Convolve `input` with the kernel into `dest` (`n + K - 1` samples).
    pub fn convolve(&mut self, input: &[f32], dest: &mut [f32]) {
        let result_len = input.len() + self.kernel_len - 1;
        debug_assert!(result_len <= self.fft_len());
        debug_assert_eq!(dest.len(), result_len);

        let len = result_len.next_power_of_two();
        let index = (len.trailing_zeros() - self.transforms[0].len.trailing_zeros()) as usize;
        let transform = &self.transforms[index];
        let buffer = &mut self.buffer[..len];

        for (i, bin) in buffer.iter_mut().enumerate() {
            let x = input.get(i).copied().unwrap_or(0.0);
            *bin = Complex::new(x, 0.0);
        }

        let forward_scratch = transform.forward.get_inplace_scratch_len();
        transform
            .forward
            .process_with_scratch(buffer, &mut self.scratch[..forward_scratch]);
        for (bin, &k) in buffer.iter_mut().zip(transform.kernel_spectrum.iter()) {
            *bin *= k;
        }
        let inverse_scratch = transform.inverse.get_inplace_scratch_len();
        transform
            .inverse
            .process_with_scratch(buffer, &mut self.scratch[..inverse_scratch]);

        for (d, bin) in dest.iter_mut().zip(buffer.iter()) {
            *d = bin.re;
        }
    }
}

impl fmt::Debug for FftConvolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FftConvolver")
            .field("fft_len", &self.fft_len())
            .field("kernel_len", &self.kernel_len)
            .field("transforms", &self.transforms.len())
            .finish()
    }
}
