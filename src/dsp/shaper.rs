//! Waveshaping transfer functions.
//!
//! A waveshaper maps each sample through a memoryless curve:
//!   output = f(input, threshold)
//!
//! Identity:
//!   f(x) = x
//!   - Passes the signal untouched; useful for checking gain staging
//!
//! Hard Clip:
//!   f(x) = clamp(x, -threshold, threshold)
//!   - Harsh, buzzy; odd harmonics like a square wave
//!
//! Soft Clip:
//!   f(x) = x / (1 + |x| / threshold)
//!   - Warm, rounded; approaches ±threshold asymptotically
//!
//! Arctangent:
//!   f(x) = atan(x) · 4/π
//!   - Smooth saturation towards ±2. Ignores threshold: the curve's shape
//!     is fixed and only the pre-gain decides how hard it is driven

use std::f32::consts::PI;
use std::fmt;
use std::str::FromStr;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{DspError, DspResult};

#[inline]
pub fn identity(sample: f32, _threshold: f32) -> f32 {
    sample
}

#[inline]
pub fn hard_clip(sample: f32, threshold: f32) -> f32 {
    sample.clamp(-threshold, threshold)
}

#[inline]
pub fn soft_clip(sample: f32, threshold: f32) -> f32 {
    sample / (1.0 + sample.abs() / threshold)
}

#[inline]
pub fn arctan(sample: f32, _threshold: f32) -> f32 {
    sample.atan() * (4.0 / PI)
}

/// Built-in curves, selectable by name or index.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ShapeKind {
    #[default]
    Identity,
    HardClip,
    SoftClip,
    ArcTangent,
}

impl ShapeKind {
    pub const ALL: [ShapeKind; 4] = [
        ShapeKind::Identity,
        ShapeKind::HardClip,
        ShapeKind::SoftClip,
        ShapeKind::ArcTangent,
    ];

    pub fn from_index(index: usize) -> DspResult<Self> {
        Self::ALL
            .get(index)
            .copied()
            .ok_or_else(|| DspError::invalid("shape", index as f32))
    }

    pub fn name(self) -> &'static str {
        match self {
            ShapeKind::Identity => "identity",
            ShapeKind::HardClip => "hardclip",
            ShapeKind::SoftClip => "softclip",
            ShapeKind::ArcTangent => "arctan",
        }
    }
}

impl fmt::Display for ShapeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ShapeKind {
    type Err = DspError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase().replace(['-', '_', ' '], "");
        match wanted.as_str() {
            "arctangent" | "atan" => Ok(ShapeKind::ArcTangent),
            _ => Self::ALL
                .iter()
                .copied()
                .find(|k| k.name() == wanted)
                .ok_or_else(|| DspError::UnsupportedMode(s.to_string())),
        }
    }
}

/// The nonlinearity a waveshaper applies. `Custom` takes (sample, threshold).
#[derive(Clone, Copy)]
pub enum ShapeFunction {
    Builtin(ShapeKind),
    Custom(fn(f32, f32) -> f32),
}

impl ShapeFunction {
    #[inline]
    pub fn shape(&self, sample: f32, threshold: f32) -> f32 {
        match self {
            ShapeFunction::Builtin(ShapeKind::Identity) => identity(sample, threshold),
            ShapeFunction::Builtin(ShapeKind::HardClip) => hard_clip(sample, threshold),
            ShapeFunction::Builtin(ShapeKind::SoftClip) => soft_clip(sample, threshold),
            ShapeFunction::Builtin(ShapeKind::ArcTangent) => arctan(sample, threshold),
            ShapeFunction::Custom(f) => f(sample, threshold),
        }
    }

    /// Shape a whole buffer in place.
    pub fn apply(&self, buffer: &mut [f32], threshold: f32) {
        match self {
            ShapeFunction::Builtin(ShapeKind::Identity) => {}
            ShapeFunction::Builtin(ShapeKind::HardClip) => {
                for sample in buffer.iter_mut() {
                    *sample = hard_clip(*sample, threshold);
                }
            }
            ShapeFunction::Builtin(ShapeKind::SoftClip) => {
                for sample in buffer.iter_mut() {
                    *sample = soft_clip(*sample, threshold);
                }
            }
            ShapeFunction::Builtin(ShapeKind::ArcTangent) => {
                for sample in buffer.iter_mut() {
                    *sample = arctan(*sample, threshold);
                }
            }
            ShapeFunction::Custom(f) => {
                for sample in buffer.iter_mut() {
                    *sample = f(*sample, threshold);
                }
            }
        }
    }

    pub fn kind(&self) -> Option<ShapeKind> {
        match self {
            ShapeFunction::Builtin(kind) => Some(*kind),
            ShapeFunction::Custom(_) => None,
        }
    }
}

impl From<ShapeKind> for ShapeFunction {
    fn from(kind: ShapeKind) -> Self {
        ShapeFunction::Builtin(kind)
    }
}

impl fmt::Debug for ShapeFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShapeFunction::Builtin(kind) => write!(f, "Builtin({kind:?})"),
            ShapeFunction::Custom(_) => f.write_str("Custom"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hard_clip_below_threshold() {
        assert!((hard_clip(0.3, 0.7) - 0.3).abs() < 1e-6);
    }

    #[test]
    fn test_hard_clip_above_threshold() {
        assert_eq!(hard_clip(1.6, 0.7), 0.7);
        assert_eq!(hard_clip(-1.6, 0.7), -0.7);
    }

    #[test]
    fn test_soft_clip_stays_below_threshold() {
        let out = soft_clip(100.0, 0.5);
        assert!(out > 0.49 && out < 0.5);
        // f(0.1) with threshold 1 = 0.1 / 1.1
        assert!((soft_clip(0.1, 1.0) - 0.0909).abs() < 1e-3);
    }

    #[test]
    fn test_arctan_ignores_threshold() {
        assert_eq!(arctan(0.8, 0.1), arctan(0.8, 10.0));
        // atan(1) = π/4, so the scaled curve passes through (1, 1)
        assert!((arctan(1.0, 0.7) - 1.0).abs() < 1e-6);
        assert!(arctan(1e6, 0.7) < 2.0);
    }

    #[test]
    fn test_apply_matches_per_sample() {
        let input = [-2.0, -0.5, 0.0, 0.25, 3.0];
        for kind in ShapeKind::ALL {
            let shape = ShapeFunction::from(kind);
            let mut buffer = input;
            shape.apply(&mut buffer, 0.7);
            for (&x, &y) in input.iter().zip(buffer.iter()) {
                assert_eq!(y, shape.shape(x, 0.7), "{kind} mismatch at {x}");
            }
        }
    }

    #[test]
    fn test_custom_function_receives_threshold() {
        fn scale_by_threshold(x: f32, t: f32) -> f32 {
            x * t
        }
        let shape = ShapeFunction::Custom(scale_by_threshold);
        let mut buffer = [1.0, -2.0];
        shape.apply(&mut buffer, 0.5);
        assert_eq!(buffer, [0.5, -1.0]);
        assert!(shape.kind().is_none());
    }

    #[test]
    fn test_shape_kind_parsing() {
        assert_eq!("hard_clip".parse::<ShapeKind>().unwrap(), ShapeKind::HardClip);
        assert_eq!("atan".parse::<ShapeKind>().unwrap(), ShapeKind::ArcTangent);
        assert!(matches!(
            "foldback".parse::<ShapeKind>(),
            Err(DspError::UnsupportedMode(_))
        ));
        assert!(ShapeKind::from_index(4).is_err());
    }
}
