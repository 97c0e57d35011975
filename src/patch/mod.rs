//! Serializable processing-chain descriptions.
//!
//! A [`Patch`] is plain data: it can be written by hand, loaded from JSON
//! (with the `serde` feature) and turned into a running
//! [`ProcessorChain`] with [`Patch::build`]. All validation happens in
//! `build`, through the same constructors and setters used directly.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::dsp::{
    fir::{ConvolutionMode, FirFilter},
    rbj::{FilterType, RbjFilter},
    shaper::ShapeKind,
    waveshaper::{self, Waveshaper},
};
use crate::error::{DspError, DspResult};
use crate::graph::chain::ProcessorChain;
use crate::graph::node::Processor;

/// Longest accepted patch name, in bytes.
pub const MAX_NAME_LEN: usize = 64;

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct Patch {
    pub name: String,
    #[cfg_attr(feature = "serde", serde(default))]
    pub description: Option<String>,
    pub stages: Vec<StageDescriptor>,
}

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "kind", rename_all = "snake_case"))]
#[derive(Debug, Clone, PartialEq)]
pub enum StageDescriptor {
    Rbj(FilterDescriptor),
    Fir(FirDescriptor),
    Waveshaper(WaveshaperDescriptor),
}

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct FilterDescriptor {
    pub filter_type: FilterType,
    pub cutoff_hz: f32,
    pub sample_rate: f32,
    #[cfg_attr(feature = "serde", serde(default = "default_q"))]
    pub q: f32,
    #[cfg_attr(feature = "serde", serde(default))]
    pub gain_db: f32,
    #[cfg_attr(feature = "serde", serde(default))]
    pub reset_on_change: bool,
}

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct FirDescriptor {
    pub kernel: Vec<f32>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub mode: ConvolutionMode,
}

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct WaveshaperDescriptor {
    pub shape: ShapeKind,
    #[cfg_attr(feature = "serde", serde(default = "default_ratio"))]
    pub oversample_ratio: usize,
    #[cfg_attr(feature = "serde", serde(default = "default_pre_gain"))]
    pub pre_gain: f32,
    #[cfg_attr(feature = "serde", serde(default = "default_post_gain"))]
    pub post_gain: f32,
    #[cfg_attr(feature = "serde", serde(default = "default_threshold"))]
    pub threshold: f32,
    #[cfg_attr(feature = "serde", serde(default = "default_mix"))]
    pub mix: f32,
}

#[cfg(feature = "serde")]
fn default_q() -> f32 {
    1.0
}

#[cfg(feature = "serde")]
fn default_ratio() -> usize {
    1
}

#[cfg(feature = "serde")]
fn default_pre_gain() -> f32 {
    waveshaper::DEFAULT_PRE_GAIN
}

#[cfg(feature = "serde")]
fn default_post_gain() -> f32 {
    waveshaper::DEFAULT_POST_GAIN
}

#[cfg(feature = "serde")]
fn default_threshold() -> f32 {
    waveshaper::DEFAULT_THRESHOLD
}

#[cfg(feature = "serde")]
fn default_mix() -> f32 {
    waveshaper::DEFAULT_MIX
}

impl FilterDescriptor {
    pub fn new(filter_type: FilterType, cutoff_hz: f32, sample_rate: f32) -> Self {
        Self {
            filter_type,
            cutoff_hz,
            sample_rate,
            q: 1.0,
            gain_db: 0.0,
            reset_on_change: false,
        }
    }

    pub fn build(&self) -> DspResult<RbjFilter> {
        let mut filter = RbjFilter::new(self.filter_type, self.cutoff_hz, self.sample_rate)?
            .with_q(self.q)?
            .with_shelf_gain(self.gain_db)?;
        filter.set_reset_on_parameter_change(self.reset_on_change);
        Ok(filter)
    }
}

impl FirDescriptor {
    pub fn build(&self) -> DspResult<FirFilter> {
        FirFilter::with_mode(&self.kernel, self.mode)
    }
}

impl WaveshaperDescriptor {
    pub fn new(shape: ShapeKind, oversample_ratio: usize) -> Self {
        Self {
            shape,
            oversample_ratio,
            pre_gain: waveshaper::DEFAULT_PRE_GAIN,
            post_gain: waveshaper::DEFAULT_POST_GAIN,
            threshold: waveshaper::DEFAULT_THRESHOLD,
            mix: waveshaper::DEFAULT_MIX,
        }
    }

    pub fn build(&self) -> DspResult<Waveshaper> {
        let mut shaper = Waveshaper::new(self.shape, self.oversample_ratio)?;
        shaper.set_pre_gain(self.pre_gain)?;
        shaper.set_post_gain(self.post_gain)?;
        shaper.set_threshold(self.threshold)?;
        shaper.set_mix(self.mix)?;
        Ok(shaper)
    }
}

impl StageDescriptor {
    pub fn build(&self) -> DspResult<Box<dyn Processor>> {
        Ok(match self {
            StageDescriptor::Rbj(desc) => Box::new(desc.build()?),
            StageDescriptor::Fir(desc) => Box::new(desc.build()?),
            StageDescriptor::Waveshaper(desc) => Box::new(desc.build()?),
        })
    }
}

impl Patch {
    pub fn new(name: impl Into<String>) -> DspResult<Self> {
        let name = name.into();
        validate_name(&name)?;
        Ok(Self {
            name,
            description: None,
            stages: Vec::new(),
        })
    }

    pub fn with_stage(mut self, stage: StageDescriptor) -> Self {
        self.stages.push(stage);
        self
    }

    /// Validate every stage and assemble them into a chain.
    pub fn build(&self) -> DspResult<ProcessorChain> {
        validate_name(&self.name)?;

        let mut chain = ProcessorChain::new()?;
        for stage in &self.stages {
            chain.push_boxed(stage.build()?);
        }
        log::debug!(
            "patch '{}': {} stages, latency {}",
            self.name,
            chain.len(),
            chain.latency()
        );
        Ok(chain)
    }
}

fn validate_name(name: &str) -> DspResult<()> {
    if name.is_empty() || name.len() > MAX_NAME_LEN {
        return Err(DspError::invalid("name", name.len() as f32));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SR: f32 = 48_000.0;

    fn example_patch() -> Patch {
        Patch::new("warm drive")
            .unwrap()
            .with_stage(StageDescriptor::Rbj(FilterDescriptor::new(
                FilterType::HighPass,
                80.0,
                SR,
            )))
            .with_stage(StageDescriptor::Waveshaper(WaveshaperDescriptor::new(
                ShapeKind::SoftClip,
                4,
            )))
            .with_stage(StageDescriptor::Fir(FirDescriptor {
                kernel: vec![0.25, 0.5, 0.25],
                mode: ConvolutionMode::Direct,
            }))
    }

    #[test]
    fn test_build_chain() {
        let chain = example_patch().build().unwrap();
        assert_eq!(chain.len(), 3);
        assert_eq!(chain.latency(), crate::dsp::resample::RESAMPLER_LATENCY);
    }

    #[test]
    fn test_name_bounds() {
        assert!(Patch::new("").is_err());
        assert!(Patch::new("x".repeat(MAX_NAME_LEN)).is_ok());
        assert!(matches!(
            Patch::new("x".repeat(MAX_NAME_LEN + 1)),
            Err(DspError::InvalidParameter { param: "name", .. })
        ));
    }

    #[test]
    fn test_invalid_stage_fails_build() {
        let mut patch = example_patch();
        patch.stages.push(StageDescriptor::Waveshaper(WaveshaperDescriptor::new(
            ShapeKind::HardClip,
            0,
        )));
        assert!(patch.build().is_err());

        let mut patch = example_patch();
        patch.stages.push(StageDescriptor::Rbj(FilterDescriptor::new(
            FilterType::LowPass,
            30_000.0,
            SR,
        )));
        assert!(matches!(
            patch.build(),
            Err(DspError::InvalidParameter { param: "cutoff", .. })
        ));
    }

    #[test]
    fn test_descriptor_settings_reach_processor() {
        let mut desc = WaveshaperDescriptor::new(ShapeKind::HardClip, 1);
        desc.threshold = 0.25;
        desc.mix = 0.5;
        let shaper = desc.build().unwrap();
        assert_eq!(shaper.threshold(), 0.25);
        assert_eq!(shaper.mix(), 0.5);

        let mut desc = FilterDescriptor::new(FilterType::Peak, 1_000.0, SR);
        desc.gain_db = 6.0;
        desc.q = 2.0;
        let filter = desc.build().unwrap();
        assert_eq!(filter.shelf_gain_db(), 6.0);
        assert_eq!(filter.q(), 2.0);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_patch_json_round_trip() {
        let patch = example_patch();
        let json = serde_json::to_string(&patch).unwrap();
        let back: Patch = serde_json::from_str(&json).unwrap();
        assert_eq!(back, patch);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_patch_json_defaults() {
        let json = r#"{
            "name": "minimal",
            "stages": [
                { "kind": "rbj", "filter_type": "LowPass", "cutoff_hz": 1000.0, "sample_rate": 48000.0 },
                { "kind": "waveshaper", "shape": "ArcTangent" }
            ]
        }"#;
        let patch: Patch = serde_json::from_str(json).unwrap();
        assert_eq!(
            patch.stages[0],
            StageDescriptor::Rbj(FilterDescriptor::new(FilterType::LowPass, 1_000.0, 48_000.0))
        );
        assert_eq!(
            patch.stages[1],
            StageDescriptor::Waveshaper(WaveshaperDescriptor::new(ShapeKind::ArcTangent, 1))
        );
        assert_eq!(patch.build().unwrap().len(), 2);
    }
}
