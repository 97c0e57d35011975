use crate::error::{zeroed, DspResult};

/// The two state registers of a second-order recursive section.
///
/// Runs the transposed direct-form II recurrence. Coefficients are passed
/// in on every tick so the registers stay independent of whatever transfer
/// function is currently loaded: swapping coefficients never touches them.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DelayLine {
    z1: f32,
    z2: f32,
}

impl DelayLine {
    pub fn new() -> Self {
        Self { z1: 0.0, z2: 0.0 }
    }

    /// Advance one sample. `b` is the normalized numerator, `a` holds a1, a2.
    #[inline]
    pub fn tick(&mut self, x: f32, b: &[f32; 3], a: &[f32; 2]) -> f32 {
        let y = x.mul_add(b[0], self.z1);
        self.z1 = x.mul_add(b[1], self.z2) - a[0] * y;
        self.z2 = x * b[2] - a[1] * y;
        y
    }

    pub fn reset(&mut self) {
        self.z1 = 0.0;
        self.z2 = 0.0;
    }

    pub fn registers(&self) -> (f32, f32) {
        (self.z1, self.z2)
    }
}

/// Integer-sample ring delay with a length fixed at construction.
///
/// Used to line a dry signal up with a processed path of known latency.
pub struct FixedDelay {
    buffer: Vec<f32>,
    write_pos: usize,
}

impl FixedDelay {
    pub fn new(delay_samples: usize) -> DspResult<Self> {
        Ok(Self {
            buffer: zeroed(delay_samples)?,
            write_pos: 0,
        })
    }

    pub fn delay(&self) -> usize {
        self.buffer.len()
    }

    #[inline]
    pub fn next_sample(&mut self, sample: f32) -> f32 {
        if self.buffer.is_empty() {
            return sample;
        }

        let delayed = self.buffer[self.write_pos];
        self.buffer[self.write_pos] = sample;
        self.write_pos = (self.write_pos + 1) % self.buffer.len();

        delayed
    }

    pub fn render(&mut self, output: &mut [f32], input: &[f32]) {
        for (out, &sample) in output.iter_mut().zip(input.iter()) {
            *out = self.next_sample(sample);
        }
    }

    pub fn reset(&mut self) {
        self.buffer.fill(0.0);
        self.write_pos = 0;
    }
}
