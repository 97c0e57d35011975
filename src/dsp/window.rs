//! Window functions and windowed-sinc kernel design.
//!
//! Used to build the interpolation and anti-alias kernels of the resamplers,
//! and handy for building FIR kernels by hand.

use std::f64::consts::{PI, TAU};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{DspError, DspResult};

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowType {
    Hann,
    Hamming,
    Blackman,
}

impl WindowType {
    /// Window value at tap `n` of a `len`-tap window.
    pub fn value(self, n: usize, len: usize) -> f64 {
        if len < 2 {
            return 1.0;
        }
        let phase = TAU * n as f64 / (len - 1) as f64;
        match self {
            WindowType::Hann => 0.5 - 0.5 * phase.cos(),
            WindowType::Hamming => 0.54 - 0.46 * phase.cos(),
            WindowType::Blackman => 0.42 - 0.5 * phase.cos() + 0.08 * (2.0 * phase).cos(),
        }
    }

    /// Fill `buffer` with the window.
    pub fn fill(self, buffer: &mut [f32]) {
        let len = buffer.len();
        for (n, w) in buffer.iter_mut().enumerate() {
            *w = self.value(n, len) as f32;
        }
    }
}

/// Linear-phase lowpass kernel with unity DC gain.
///
/// `cutoff` is in cycles per sample, strictly between 0 and 0.5.
pub fn windowed_sinc_lowpass(taps: usize, cutoff: f32, window: WindowType) -> DspResult<Vec<f32>> {
    if taps == 0 {
        return Err(DspError::invalid("taps", 0.0));
    }
    if !(cutoff > 0.0 && cutoff < 0.5) {
        return Err(DspError::invalid("cutoff", cutoff));
    }

    let fc = cutoff as f64;
    let center = (taps - 1) as f64 / 2.0;

    let mut kernel: Vec<f64> = (0..taps)
        .map(|n| {
            let m = n as f64 - center;
            let sinc = if m == 0.0 {
                2.0 * fc
            } else {
                (TAU * fc * m).sin() / (PI * m)
            };
            sinc * window.value(n, taps)
        })
        .collect();

    let sum: f64 = kernel.iter().sum();
    for tap in &mut kernel {
        *tap /= sum;
    }

    Ok(kernel.into_iter().map(|t| t as f32).collect())
}
