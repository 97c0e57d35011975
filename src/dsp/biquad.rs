//! Second-order recursive filter section.
//!
//! The engine knows nothing about filter types. It runs whatever normalized
//! transfer function was last loaded:
//!
//! ```text
//!            b0 + b1·z⁻¹ + b2·z⁻²
//!   H(z) = ────────────────────────
//!            1  + a1·z⁻¹ + a2·z⁻²
//! ```
//!
//! Loading divides through by `a0` once so the per-sample loop never does.
//! The two state registers live in [`DelayLine`] and survive both block
//! boundaries and coefficient swaps; only [`Biquad::reset`] clears them.

use std::f64::consts::TAU;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::dsp::delay::DelayLine;
use crate::error::{DspError, DspResult};
use crate::graph::node::Processor;

/// Raw biquad coefficients, numerator `b` and denominator `a`.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BiquadCoefficients {
    pub b0: f32,
    pub b1: f32,
    pub b2: f32,
    pub a0: f32,
    pub a1: f32,
    pub a2: f32,
}

impl BiquadCoefficients {
    pub const IDENTITY: Self = Self {
        b0: 1.0,
        b1: 0.0,
        b2: 0.0,
        a0: 1.0,
        a1: 0.0,
        a2: 0.0,
    };

    pub fn new(b: [f32; 3], a: [f32; 3]) -> Self {
        Self {
            b0: b[0],
            b1: b[1],
            b2: b[2],
            a0: a[0],
            a1: a[1],
            a2: a[2],
        }
    }

    pub fn is_finite(&self) -> bool {
        [self.b0, self.b1, self.b2, self.a0, self.a1, self.a2]
            .iter()
            .all(|c| c.is_finite())
    }

    /// Divide every coefficient by `a0`.
    pub fn normalized(&self) -> DspResult<Self> {
        if !self.is_finite() {
            let bad = [self.b0, self.b1, self.b2, self.a0, self.a1, self.a2]
                .into_iter()
                .find(|c| !c.is_finite())
                .unwrap_or(f32::NAN);
            return Err(DspError::invalid("coefficients", bad));
        }
        if self.a0 == 0.0 {
            return Err(DspError::invalid("a0", self.a0));
        }

        let norm = 1.0 / self.a0;
        Ok(Self {
            b0: self.b0 * norm,
            b1: self.b1 * norm,
            b2: self.b2 * norm,
            a0: 1.0,
            a1: self.a1 * norm,
            a2: self.a2 * norm,
        })
    }

    /// Complex response at `freq_hz`, as (re, im).
    pub fn frequency_response(&self, freq_hz: f32, sample_rate: f32) -> (f64, f64) {
        let w = TAU * freq_hz as f64 / sample_rate as f64;
        let (s1, c1) = w.sin_cos();
        let (s2, c2) = (2.0 * w).sin_cos();

        let (b0, b1, b2) = (self.b0 as f64, self.b1 as f64, self.b2 as f64);
        let (a0, a1, a2) = (self.a0 as f64, self.a1 as f64, self.a2 as f64);

        let num_re = b0 + b1 * c1 + b2 * c2;
        let num_im = -(b1 * s1 + b2 * s2);
        let den_re = a0 + a1 * c1 + a2 * c2;
        let den_im = -(a1 * s1 + a2 * s2);

        let den_mag2 = den_re * den_re + den_im * den_im;
        (
            (num_re * den_re + num_im * den_im) / den_mag2,
            (num_im * den_re - num_re * den_im) / den_mag2,
        )
    }

    /// Linear gain at `freq_hz`.
    pub fn magnitude_response(&self, freq_hz: f32, sample_rate: f32) -> f32 {
        let (re, im) = self.frequency_response(freq_hz, sample_rate);
        re.hypot(im) as f32
    }
}

impl Default for BiquadCoefficients {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Block-based biquad engine with injected coefficients.
#[derive(Debug, Clone)]
pub struct Biquad {
    b: [f32; 3],
    a: [f32; 2],
    state: DelayLine,
}

impl Biquad {
    pub fn new(coefficients: BiquadCoefficients) -> DspResult<Self> {
        let mut biquad = Self::default();
        biquad.load(coefficients)?;
        Ok(biquad)
    }

    /// Replace the transfer function. Delay registers are left untouched.
    pub fn load(&mut self, coefficients: BiquadCoefficients) -> DspResult<()> {
        let c = coefficients.normalized()?;
        self.b = [c.b0, c.b1, c.b2];
        self.a = [c.a1, c.a2];
        Ok(())
    }

    /// The active transfer function, normalized so `a0 == 1`.
    pub fn coefficients(&self) -> BiquadCoefficients {
        BiquadCoefficients::new(self.b, [1.0, self.a[0], self.a[1]])
    }

    #[inline]
    pub fn tick(&mut self, sample: f32) -> f32 {
        self.state.tick(sample, &self.b, &self.a)
    }

    pub fn process(&mut self, output: &mut [f32], input: &[f32]) {
        debug_assert_eq!(output.len(), input.len());

        for (out, &x) in output.iter_mut().zip(input.iter()) {
            *out = self.state.tick(x, &self.b, &self.a);
        }
    }

    pub fn process_in_place(&mut self, buffer: &mut [f32]) {
        for sample in buffer.iter_mut() {
            *sample = self.state.tick(*sample, &self.b, &self.a);
        }
    }

    /// Zero the delay registers. The only way filter memory is discarded.
    pub fn reset(&mut self) {
        self.state.reset();
    }

    pub fn state(&self) -> &DelayLine {
        &self.state
    }

    pub fn magnitude_response(&self, freq_hz: f32, sample_rate: f32) -> f32 {
        self.coefficients().magnitude_response(freq_hz, sample_rate)
    }
}

impl Default for Biquad {
    /// Passthrough (`b0 = 1`, everything else zero).
    fn default() -> Self {
        Self {
            b: [1.0, 0.0, 0.0],
            a: [0.0, 0.0],
            state: DelayLine::new(),
        }
    }
}

impl Processor for Biquad {
    fn process(&mut self, output: &mut [f32], input: &[f32]) {
        Biquad::process(self, output, input);
    }

    fn set_parameter(&mut self, name: &str, _value: f32) -> DspResult<()> {
        Err(DspError::UnknownParameter(name.to_string()))
    }

    fn reset(&mut self) {
        Biquad::reset(self);
    }
}
