//! RBJ "Audio EQ Cookbook" coefficient design.
//!
//! [`design`] is a pure function from a filter type plus parameters to raw
//! biquad coefficients. [`RbjFilter`] owns a [`Biquad`] and recomputes its
//! coefficients whenever a parameter changes. Recomputation is the only
//! path that touches the engine's coefficients, and by default it leaves
//! the delay registers alone (a time-varying filter). Large jumps can click;
//! turn on `reset_on_parameter_change` to zero the registers instead.

use std::f64::consts::{LN_2, TAU};
use std::fmt;
use std::str::FromStr;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::dsp::biquad::{Biquad, BiquadCoefficients};
use crate::error::{DspError, DspResult};
use crate::graph::node::Processor;

/*
| type       | passes                 | alpha form        | uses gain |
| ---------- | ---------------------- | ----------------- | --------- |
| low-pass   | below cutoff           | Q                 | no        |
| high-pass  | above cutoff           | Q                 | no        |
| band-pass  | around cutoff          | bandwidth (oct)   | no        |
| all-pass   | everything, phase only | Q                 | no        |
| notch      | all but cutoff         | bandwidth (oct)   | no        |
| peak       | boost/cut at cutoff    | bandwidth (oct)   | yes       |
| low shelf  | boost/cut below        | shelf slope       | yes       |
| high shelf | boost/cut above        | shelf slope       | yes       |
*/

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilterType {
    LowPass,
    HighPass,
    BandPass,
    AllPass,
    Notch,
    Peak,
    LowShelf,
    HighShelf,
}

impl FilterType {
    pub const ALL: [FilterType; 8] = [
        FilterType::LowPass,
        FilterType::HighPass,
        FilterType::BandPass,
        FilterType::AllPass,
        FilterType::Notch,
        FilterType::Peak,
        FilterType::LowShelf,
        FilterType::HighShelf,
    ];

    /// Look up a filter type by its position in [`FilterType::ALL`].
    pub fn from_index(index: usize) -> DspResult<Self> {
        Self::ALL
            .get(index)
            .copied()
            .ok_or_else(|| DspError::invalid("type", index as f32))
    }

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn name(self) -> &'static str {
        match self {
            FilterType::LowPass => "lowpass",
            FilterType::HighPass => "highpass",
            FilterType::BandPass => "bandpass",
            FilterType::AllPass => "allpass",
            FilterType::Notch => "notch",
            FilterType::Peak => "peak",
            FilterType::LowShelf => "lowshelf",
            FilterType::HighShelf => "highshelf",
        }
    }

    pub fn uses_gain(self) -> bool {
        matches!(
            self,
            FilterType::Peak | FilterType::LowShelf | FilterType::HighShelf
        )
    }
}

impl fmt::Display for FilterType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for FilterType {
    type Err = DspError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase().replace(['-', '_', ' '], "");
        Self::ALL
            .iter()
            .copied()
            .find(|t| t.name() == wanted)
            .ok_or_else(|| DspError::UnsupportedMode(s.to_string()))
    }
}

/// Inputs to the coefficient design.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FilterParams {
    pub cutoff_hz: f32,
    pub sample_rate: f32,
    pub q: f32,
    pub gain_db: f32,
}

impl FilterParams {
    pub fn new(cutoff_hz: f32, sample_rate: f32) -> Self {
        Self {
            cutoff_hz,
            sample_rate,
            q: 1.0,
            gain_db: 0.0,
        }
    }

    pub fn validate(&self) -> DspResult<()> {
        if !(self.sample_rate.is_finite() && self.sample_rate > 0.0) {
            return Err(DspError::invalid("sample_rate", self.sample_rate));
        }
        let nyquist = self.sample_rate * 0.5;
        if !(self.cutoff_hz.is_finite() && self.cutoff_hz > 0.0 && self.cutoff_hz < nyquist) {
            return Err(DspError::invalid("cutoff", self.cutoff_hz));
        }
        if !(self.q.is_finite() && self.q > 0.0) {
            return Err(DspError::invalid("q", self.q));
        }
        if !self.gain_db.is_finite() {
            return Err(DspError::invalid("gain_db", self.gain_db));
        }
        Ok(())
    }
}

/// Compute raw (un-normalized) coefficients for `filter_type`.
pub fn design(filter_type: FilterType, params: &FilterParams) -> DspResult<BiquadCoefficients> {
    params.validate()?;

    let q = params.q as f64;
    let omega = TAU * params.cutoff_hz as f64 / params.sample_rate as f64;
    let (sin, cos) = omega.sin_cos();
    let a = 10f64.powf(params.gain_db as f64 / 40.0);

    let q_alpha = sin / (2.0 * q);
    let bw_alpha = sin * (LN_2 / 2.0 * q * omega / sin).sinh();

    let (b, den) = match filter_type {
        FilterType::LowPass => {
            let b0 = (1.0 - cos) / 2.0;
            ([b0, 1.0 - cos, b0], [1.0 + q_alpha, -2.0 * cos, 1.0 - q_alpha])
        }
        FilterType::HighPass => {
            let b0 = (1.0 + cos) / 2.0;
            ([b0, -(1.0 + cos), b0], [1.0 + q_alpha, -2.0 * cos, 1.0 - q_alpha])
        }
        FilterType::BandPass => {
            let b0 = sin / 2.0;
            ([b0, 0.0, -b0], [1.0 + bw_alpha, -2.0 * cos, 1.0 - bw_alpha])
        }
        FilterType::AllPass => (
            [1.0 - q_alpha, -2.0 * cos, 1.0 + q_alpha],
            [1.0 + q_alpha, -2.0 * cos, 1.0 - q_alpha],
        ),
        FilterType::Notch => (
            [1.0, -2.0 * cos, 1.0],
            [1.0 + bw_alpha, -2.0 * cos, 1.0 - bw_alpha],
        ),
        FilterType::Peak => (
            [1.0 + bw_alpha * a, -2.0 * cos, 1.0 - bw_alpha * a],
            [1.0 + bw_alpha / a, -2.0 * cos, 1.0 - bw_alpha / a],
        ),
        FilterType::LowShelf | FilterType::HighShelf => {
            // Q is the shelf slope here; too steep a slope has no real solution
            let slope_term = (a + 1.0 / a) * (1.0 / q - 1.0) + 2.0;
            if slope_term < 0.0 {
                return Err(DspError::invalid("q", params.q));
            }
            let beta = 2.0 * a.sqrt() * (sin / 2.0 * slope_term.sqrt());

            if filter_type == FilterType::LowShelf {
                (
                    [
                        a * ((a + 1.0) - (a - 1.0) * cos + beta),
                        2.0 * a * ((a - 1.0) - (a + 1.0) * cos),
                        a * ((a + 1.0) - (a - 1.0) * cos - beta),
                    ],
                    [
                        (a + 1.0) + (a - 1.0) * cos + beta,
                        -2.0 * ((a - 1.0) + (a + 1.0) * cos),
                        (a + 1.0) + (a - 1.0) * cos - beta,
                    ],
                )
            } else {
                (
                    [
                        a * ((a + 1.0) + (a - 1.0) * cos + beta),
                        -2.0 * a * ((a - 1.0) + (a + 1.0) * cos),
                        a * ((a + 1.0) + (a - 1.0) * cos - beta),
                    ],
                    [
                        (a + 1.0) - (a - 1.0) * cos + beta,
                        2.0 * ((a - 1.0) - (a + 1.0) * cos),
                        (a + 1.0) - (a - 1.0) * cos - beta,
                    ],
                )
            }
        }
    };

    Ok(BiquadCoefficients::new(
        [b[0] as f32, b[1] as f32, b[2] as f32],
        [den[0] as f32, den[1] as f32, den[2] as f32],
    ))
}

/// Biquad whose coefficients follow musical parameters.
#[derive(Debug, Clone)]
pub struct RbjFilter {
    biquad: Biquad,
    filter_type: FilterType,
    params: FilterParams,
    raw: BiquadCoefficients,
    reset_on_parameter_change: bool,
}

impl RbjFilter {
    /// Q = 1, 0 dB gain.
    pub fn new(filter_type: FilterType, cutoff_hz: f32, sample_rate: f32) -> DspResult<Self> {
        let params = FilterParams::new(cutoff_hz, sample_rate);
        let raw = design(filter_type, &params)?;
        let biquad = Biquad::new(raw)?;

        log::debug!("rbj {filter_type} at {cutoff_hz} Hz / {sample_rate} Hz");

        Ok(Self {
            biquad,
            filter_type,
            params,
            raw,
            reset_on_parameter_change: false,
        })
    }

    pub fn lowpass(cutoff_hz: f32, sample_rate: f32) -> DspResult<Self> {
        Self::new(FilterType::LowPass, cutoff_hz, sample_rate)
    }

    pub fn highpass(cutoff_hz: f32, sample_rate: f32) -> DspResult<Self> {
        Self::new(FilterType::HighPass, cutoff_hz, sample_rate)
    }

    pub fn with_q(mut self, q: f32) -> DspResult<Self> {
        self.set_q(q)?;
        Ok(self)
    }

    pub fn with_shelf_gain(mut self, gain_db: f32) -> DspResult<Self> {
        self.set_shelf_gain(gain_db)?;
        Ok(self)
    }

    pub fn filter_type(&self) -> FilterType {
        self.filter_type
    }

    pub fn params(&self) -> &FilterParams {
        &self.params
    }

    pub fn cutoff(&self) -> f32 {
        self.params.cutoff_hz
    }

    pub fn q(&self) -> f32 {
        self.params.q
    }

    pub fn shelf_gain_db(&self) -> f32 {
        self.params.gain_db
    }

    pub fn sample_rate(&self) -> f32 {
        self.params.sample_rate
    }

    /// Coefficients as designed, before division by `a0`.
    pub fn raw_coefficients(&self) -> BiquadCoefficients {
        self.raw
    }

    /// Coefficients the engine is running.
    pub fn coefficients(&self) -> BiquadCoefficients {
        self.biquad.coefficients()
    }

    pub fn biquad(&self) -> &Biquad {
        &self.biquad
    }

    pub fn reset_on_parameter_change(&self) -> bool {
        self.reset_on_parameter_change
    }

    pub fn set_reset_on_parameter_change(&mut self, enabled: bool) {
        self.reset_on_parameter_change = enabled;
    }

    pub fn set_type(&mut self, filter_type: FilterType) -> DspResult<()> {
        self.apply(filter_type, self.params)
    }

    pub fn set_cutoff(&mut self, cutoff_hz: f32) -> DspResult<()> {
        let params = FilterParams {
            cutoff_hz,
            ..self.params
        };
        self.apply(self.filter_type, params)
    }

    pub fn set_q(&mut self, q: f32) -> DspResult<()> {
        let params = FilterParams { q, ..self.params };
        self.apply(self.filter_type, params)
    }

    pub fn set_shelf_gain(&mut self, gain_db: f32) -> DspResult<()> {
        let params = FilterParams {
            gain_db,
            ..self.params
        };
        self.apply(self.filter_type, params)
    }

    /// Change type, cutoff and Q with a single recomputation.
    pub fn set_params(&mut self, filter_type: FilterType, cutoff_hz: f32, q: f32) -> DspResult<()> {
        let params = FilterParams {
            cutoff_hz,
            q,
            ..self.params
        };
        self.apply(filter_type, params)
    }

    // Nothing is committed unless the whole design succeeds.
    fn apply(&mut self, filter_type: FilterType, params: FilterParams) -> DspResult<()> {
        let raw = design(filter_type, &params)?;
        self.biquad.load(raw)?;

        self.filter_type = filter_type;
        self.params = params;
        self.raw = raw;

        if self.reset_on_parameter_change {
            self.biquad.reset();
        }
        Ok(())
    }

    pub fn process(&mut self, output: &mut [f32], input: &[f32]) {
        self.biquad.process(output, input);
    }

    pub fn process_in_place(&mut self, buffer: &mut [f32]) {
        self.biquad.process_in_place(buffer);
    }

    /// Clear filter memory.
    pub fn flush(&mut self) {
        self.biquad.reset();
    }

    pub fn magnitude_response(&self, freq_hz: f32) -> f32 {
        self.biquad
            .magnitude_response(freq_hz, self.params.sample_rate)
    }
}

impl Processor for RbjFilter {
    fn process(&mut self, output: &mut [f32], input: &[f32]) {
        RbjFilter::process(self, output, input);
    }

    fn set_parameter(&mut self, name: &str, value: f32) -> DspResult<()> {
        match name {
            "type" => {
                if !(value.is_finite() && value >= 0.0 && value.fract() == 0.0) {
                    return Err(DspError::invalid("type", value));
                }
                self.set_type(FilterType::from_index(value as usize)?)
            }
            "cutoff" => self.set_cutoff(value),
            "q" => self.set_q(value),
            "gain_db" => self.set_shelf_gain(value),
            "reset_on_change" => {
                self.set_reset_on_parameter_change(value != 0.0);
                Ok(())
            }
            _ => Err(DspError::UnknownParameter(name.to_string())),
        }
    }

    fn reset(&mut self) {
        self.flush();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SR: f32 = 48_000.0;

    fn sine(len: usize, freq: f32) -> Vec<f32> {
        (0..len)
            .map(|i| (std::f32::consts::TAU * freq * i as f32 / SR).sin())
            .collect()
    }

    fn peak_after_transient(buffer: &[f32]) -> f32 {
        let skip = buffer.len().min(256);
        buffer[skip..].iter().fold(0.0f32, |acc, &x| acc.max(x.abs()))
    }

    #[test]
    fn test_defaults() {
        let filter = RbjFilter::lowpass(1_000.0, SR).unwrap();
        assert_eq!(filter.q(), 1.0);
        assert_eq!(filter.shelf_gain_db(), 0.0);
        assert!(!filter.reset_on_parameter_change());
        assert_eq!(filter.coefficients().a0, 1.0);
    }

    #[test]
    fn test_lowpass_quarter_rate_dc_and_nyquist() {
        let filter = RbjFilter::lowpass(SR / 4.0, SR).unwrap();

        let dc = filter.magnitude_response(0.0);
        let nyquist = filter.magnitude_response(SR / 2.0);

        assert!((dc - 1.0).abs() < 1e-4, "dc gain {dc}");
        assert!(nyquist.abs() < 1e-4, "nyquist gain {nyquist}");
    }

    #[test]
    fn test_highpass_dc_and_nyquist() {
        let filter = RbjFilter::highpass(SR / 4.0, SR).unwrap();
        assert!(filter.magnitude_response(0.0).abs() < 1e-4);
        assert!((filter.magnitude_response(SR / 2.0) - 1.0).abs() < 1e-4);
    }

    #[test]
    fn test_bandpass_rejects_extremes() {
        let filter = RbjFilter::new(FilterType::BandPass, 3_000.0, SR).unwrap();
        let center = filter.magnitude_response(3_000.0);

        assert!(filter.magnitude_response(0.0) < 1e-4);
        assert!(filter.magnitude_response(SR / 2.0) < 1e-4);
        assert!(center > filter.magnitude_response(750.0) * 2.0);
        assert!(center > filter.magnitude_response(12_000.0) * 2.0);
    }

    #[test]
    fn test_allpass_is_flat() {
        let filter = RbjFilter::new(FilterType::AllPass, 2_000.0, SR).unwrap();
        for freq in [20.0, 500.0, 2_000.0, 9_000.0, 20_000.0] {
            let gain = filter.magnitude_response(freq);
            assert!((gain - 1.0).abs() < 1e-3, "allpass gain {gain} at {freq}");
        }
    }

    #[test]
    fn test_notch_removes_cutoff() {
        let filter = RbjFilter::new(FilterType::Notch, 1_000.0, SR).unwrap();
        assert!(filter.magnitude_response(1_000.0) < 1e-3);
        assert!((filter.magnitude_response(0.0) - 1.0).abs() < 1e-4);
    }

    #[test]
    fn test_peak_boosts_by_gain() {
        let filter = RbjFilter::new(FilterType::Peak, 1_000.0, SR)
            .unwrap()
            .with_shelf_gain(6.0)
            .unwrap();
        let expected = 10f32.powf(6.0 / 20.0);

        let center = filter.magnitude_response(1_000.0);
        assert!((center - expected).abs() < 1e-3, "peak gain {center}");
        assert!((filter.magnitude_response(0.0) - 1.0).abs() < 1e-4);
    }

    #[test]
    fn test_shelves_boost_their_side() {
        let expected = 10f32.powf(6.0 / 20.0);

        let low = RbjFilter::new(FilterType::LowShelf, 1_000.0, SR)
            .unwrap()
            .with_shelf_gain(6.0)
            .unwrap();
        assert!((low.magnitude_response(0.0) - expected).abs() < 1e-3);
        assert!((low.magnitude_response(SR / 2.0) - 1.0).abs() < 1e-3);

        let high = RbjFilter::new(FilterType::HighShelf, 1_000.0, SR)
            .unwrap()
            .with_shelf_gain(6.0)
            .unwrap();
        assert!((high.magnitude_response(0.0) - 1.0).abs() < 1e-3);
        assert!((high.magnitude_response(SR / 2.0) - expected).abs() < 1e-3);
    }

    #[test]
    fn test_zero_gain_shelf_is_flat() {
        let filter = RbjFilter::new(FilterType::LowShelf, 500.0, SR).unwrap();
        for freq in [0.0, 500.0, 5_000.0] {
            assert!((filter.magnitude_response(freq) - 1.0).abs() < 1e-4);
        }
    }

    #[test]
    fn test_rejects_bad_construction() {
        assert!(matches!(
            RbjFilter::lowpass(0.0, SR),
            Err(DspError::InvalidParameter { param: "cutoff", .. })
        ));
        assert!(RbjFilter::lowpass(SR / 2.0, SR).is_err());
        assert!(matches!(
            RbjFilter::lowpass(1_000.0, 0.0),
            Err(DspError::InvalidParameter {
                param: "sample_rate",
                ..
            })
        ));
    }

    #[test]
    fn test_rejected_setter_keeps_previous_design() {
        let mut filter = RbjFilter::lowpass(1_000.0, SR).unwrap();
        let before = filter.coefficients();

        assert!(filter.set_cutoff(30_000.0).is_err());
        assert!(filter.set_q(0.0).is_err());
        assert!(filter.set_q(f32::NAN).is_err());
        assert!(filter.set_shelf_gain(f32::INFINITY).is_err());

        assert_eq!(filter.coefficients(), before);
        assert_eq!(filter.cutoff(), 1_000.0);
        assert_eq!(filter.q(), 1.0);
    }

    #[test]
    fn test_steep_shelf_slope_rejected() {
        let mut filter = RbjFilter::new(FilterType::HighShelf, 1_000.0, SR)
            .unwrap()
            .with_shelf_gain(12.0)
            .unwrap();
        assert!(filter.set_q(10.0).is_err());
        assert_eq!(filter.q(), 1.0);
    }

    #[test]
    fn test_set_cutoff_keeps_registers() {
        let mut filter = RbjFilter::lowpass(1_000.0, SR).unwrap();
        let mut out = vec![0.0; 64];
        filter.process(&mut out, &sine(64, 440.0));
        let before = *filter.biquad().state();

        filter.set_cutoff(2_000.0).unwrap();

        assert_eq!(*filter.biquad().state(), before);
        assert_ne!(before.registers(), (0.0, 0.0));
    }

    #[test]
    fn test_reset_on_parameter_change_clears_registers() {
        let mut filter = RbjFilter::lowpass(1_000.0, SR).unwrap();
        filter.set_reset_on_parameter_change(true);
        let mut out = vec![0.0; 64];
        filter.process(&mut out, &sine(64, 440.0));

        filter.set_cutoff(2_000.0).unwrap();

        assert_eq!(filter.biquad().state().registers(), (0.0, 0.0));
    }

    #[test]
    fn test_set_type_changes_response() {
        let mut filter = RbjFilter::lowpass(1_000.0, SR).unwrap();
        filter.set_type(FilterType::HighPass).unwrap();

        assert_eq!(filter.filter_type(), FilterType::HighPass);
        assert!(filter.magnitude_response(0.0) < 1e-4);
    }

    #[test]
    fn test_set_params_updates_all_at_once() {
        let mut filter = RbjFilter::lowpass(1_000.0, SR).unwrap();
        filter.set_params(FilterType::Notch, 2_500.0, 0.5).unwrap();

        assert_eq!(filter.filter_type(), FilterType::Notch);
        assert_eq!(filter.cutoff(), 2_500.0);
        assert_eq!(filter.q(), 0.5);
        assert!(filter.magnitude_response(2_500.0) < 1e-3);
    }

    #[test]
    fn test_lowpass_attenuates_high_sine() {
        let mut filter = RbjFilter::lowpass(500.0, SR).unwrap();
        let input = sine(1024, 8_000.0);
        let mut output = vec![0.0; 1024];

        filter.process(&mut output, &input);

        let peak = peak_after_transient(&output);
        assert!(peak < 0.05, "expected high freq attenuation, got peak: {peak}");
    }

    #[test]
    fn test_filter_type_parsing() {
        assert_eq!("LowPass".parse::<FilterType>().unwrap(), FilterType::LowPass);
        assert_eq!("high_shelf".parse::<FilterType>().unwrap(), FilterType::HighShelf);
        assert!(matches!(
            "moog".parse::<FilterType>(),
            Err(DspError::UnsupportedMode(_))
        ));
    }

    #[test]
    fn test_filter_type_index_round_trip() {
        for t in FilterType::ALL {
            assert_eq!(FilterType::from_index(t.index()).unwrap(), t);
        }
        assert!(FilterType::from_index(8).is_err());
    }

    #[test]
    fn test_set_parameter_by_name() {
        let mut filter = RbjFilter::lowpass(1_000.0, SR).unwrap();

        filter.set_parameter("cutoff", 4_000.0).unwrap();
        filter.set_parameter("q", 0.707).unwrap();
        filter.set_parameter("type", 5.0).unwrap();
        filter.set_parameter("gain_db", -3.0).unwrap();

        assert_eq!(filter.cutoff(), 4_000.0);
        assert_eq!(filter.filter_type(), FilterType::Peak);
        assert_eq!(filter.shelf_gain_db(), -3.0);

        assert!(filter.set_parameter("type", 11.0).is_err());
        assert!(filter.set_parameter("type", 1.5).is_err());
        assert!(matches!(
            filter.set_parameter("drive", 1.0),
            Err(DspError::UnknownParameter(_))
        ));
        assert_eq!(filter.filter_type(), FilterType::Peak);
    }
}
