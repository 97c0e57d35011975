//! Oversampled waveshaper.

/*
Oversampled Waveshaping
=======================

A static nonlinearity creates harmonics. Harmonics above Nyquist fold back
into the audible band as inharmonic aliases, and the harder the curve the
more of them there are. Running the curve at a higher sample rate gives the
harmonics room to exist before they are filtered away.

Per block:

    input ──→ upsample ×N ──→ pre gain ──→ shape ──→ post gain ──→ downsample ×N ──→ wet
      │
      └──→ delay (resampler latency) ──────────────────────────────────────────────→ dry

    output = dry × (1 - mix) + wet × mix

Ratio 1 skips both resamplers and the dry delay. The wet path is then an
exact per-sample map, so Identity with unity gains returns the input bit
for bit.

For ratio > 1 the wet path lags the input by RESAMPLER_LATENCY samples.
The dry path is delayed by the same amount so partial mixes do not comb.

Parameters:
-----------
- pre_gain:   drive into the curve (linear)
- post_gain:  makeup after the curve (linear)
- threshold:  clip level for HardClip/SoftClip; ArcTangent ignores it
- mix:        0.0 = dry only, 1.0 = wet only
*/

use crate::dsp::delay::FixedDelay;
use crate::dsp::mix::{apply_dry_wet, apply_gain};
use crate::dsp::resample::{Downsampler, Upsampler, MAX_RATIO, RESAMPLER_LATENCY};
use crate::dsp::shaper::{ShapeFunction, ShapeKind};
use crate::error::{zeroed, DspError, DspResult};
use crate::graph::node::Processor;
use crate::MAX_BLOCK_SIZE;

pub const DEFAULT_PRE_GAIN: f32 = 1.0;
pub const DEFAULT_POST_GAIN: f32 = 1.0;
pub const DEFAULT_THRESHOLD: f32 = 0.7;
pub const DEFAULT_MIX: f32 = 1.0;

pub struct Waveshaper {
    shape: ShapeFunction,
    pre_gain: f32,
    post_gain: f32,
    threshold: f32,
    mix: f32,
    ratio: usize,
    upsampler: Upsampler,
    downsampler: Downsampler,
    dry_delay: FixedDelay,
    oversampled: Vec<f32>,
    dry: Vec<f32>,
}

impl Waveshaper {
    /// Ratio must be in `1..=16`. Nothing is allocated when it is not.
    pub fn new(shape: impl Into<ShapeFunction>, oversample_ratio: usize) -> DspResult<Self> {
        if oversample_ratio == 0 || oversample_ratio > MAX_RATIO {
            return Err(DspError::invalid("oversample_ratio", oversample_ratio as f32));
        }

        let latency = if oversample_ratio > 1 { RESAMPLER_LATENCY } else { 0 };
        let shape = shape.into();
        log::debug!("waveshaper: {shape:?}, x{oversample_ratio} oversampling");

        Ok(Self {
            shape,
            pre_gain: DEFAULT_PRE_GAIN,
            post_gain: DEFAULT_POST_GAIN,
            threshold: DEFAULT_THRESHOLD,
            mix: DEFAULT_MIX,
            ratio: oversample_ratio,
            upsampler: Upsampler::new(oversample_ratio)?,
            downsampler: Downsampler::new(oversample_ratio)?,
            dry_delay: FixedDelay::new(latency)?,
            oversampled: zeroed(MAX_BLOCK_SIZE * oversample_ratio)?,
            dry: zeroed(MAX_BLOCK_SIZE)?,
        })
    }

    pub fn shape(&self) -> ShapeFunction {
        self.shape
    }

    pub fn oversample_ratio(&self) -> usize {
        self.ratio
    }

    pub fn pre_gain(&self) -> f32 {
        self.pre_gain
    }

    pub fn post_gain(&self) -> f32 {
        self.post_gain
    }

    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    pub fn mix(&self) -> f32 {
        self.mix
    }

    /// Input-rate delay of the output relative to the input.
    pub fn latency(&self) -> usize {
        self.dry_delay.delay()
    }

    pub fn set_shape(&mut self, shape: impl Into<ShapeFunction>) {
        self.shape = shape.into();
    }

    pub fn set_pre_gain(&mut self, gain: f32) -> DspResult<()> {
        if !gain.is_finite() {
            return Err(DspError::invalid("pre_gain", gain));
        }
        self.pre_gain = gain;
        Ok(())
    }

    pub fn set_post_gain(&mut self, gain: f32) -> DspResult<()> {
        if !gain.is_finite() {
            return Err(DspError::invalid("post_gain", gain));
        }
        self.post_gain = gain;
        Ok(())
    }

    pub fn set_threshold(&mut self, threshold: f32) -> DspResult<()> {
        if !(threshold.is_finite() && threshold > 0.0) {
            return Err(DspError::invalid("threshold", threshold));
        }
        self.threshold = threshold;
        Ok(())
    }

    pub fn set_mix(&mut self, mix: f32) -> DspResult<()> {
        if !(0.0..=1.0).contains(&mix) {
            return Err(DspError::invalid("mix", mix));
        }
        self.mix = mix;
        Ok(())
    }

    pub fn process(&mut self, output: &mut [f32], input: &[f32]) {
        debug_assert_eq!(output.len(), input.len());

        for (out, x) in output
            .chunks_mut(MAX_BLOCK_SIZE)
            .zip(input.chunks(MAX_BLOCK_SIZE))
        {
            self.process_block(out, x);
        }
    }

    fn process_block(&mut self, output: &mut [f32], input: &[f32]) {
        let n = input.len();

        // Dry history advances every block so a later mix change stays aligned
        let dry = &mut self.dry[..n];
        self.dry_delay.render(dry, input);

        let wet = &mut self.oversampled[..n * self.ratio];
        self.upsampler.process(wet, input);
        apply_gain(wet, self.pre_gain);
        self.shape.apply(wet, self.threshold);
        apply_gain(wet, self.post_gain);
        self.downsampler.process(output, wet);

        apply_dry_wet(dry, output, self.mix);
    }

    /// Clear resampler tails and the dry delay.
    pub fn flush(&mut self) {
        self.upsampler.flush();
        self.downsampler.flush();
        self.dry_delay.reset();
    }
}

impl std::fmt::Debug for Waveshaper {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Waveshaper")
            .field("shape", &self.shape)
            .field("ratio", &self.ratio)
            .field("pre_gain", &self.pre_gain)
            .field("post_gain", &self.post_gain)
            .field("threshold", &self.threshold)
            .field("mix", &self.mix)
            .finish()
    }
}

impl Processor for Waveshaper {
    fn process(&mut self, output: &mut [f32], input: &[f32]) {
        Waveshaper::process(self, output, input);
    }

    fn set_parameter(&mut self, name: &str, value: f32) -> DspResult<()> {
        match name {
            "pre_gain" => self.set_pre_gain(value),
            "post_gain" => self.set_post_gain(value),
            "threshold" => self.set_threshold(value),
            "mix" => self.set_mix(value),
            "shape" => {
                if !(value.is_finite() && value >= 0.0 && value.fract() == 0.0) {
                    return Err(DspError::invalid("shape", value));
                }
                self.set_shape(ShapeKind::from_index(value as usize)?);
                Ok(())
            }
            _ => Err(DspError::UnknownParameter(name.to_string())),
        }
    }

    fn reset(&mut self) {
        self.flush();
    }

    fn latency(&self) -> usize {
        Waveshaper::latency(self)
    }
}
