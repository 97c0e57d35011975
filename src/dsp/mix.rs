//! Dry/wet blending.

/*
Dry/Wet Mixing
==============

  dry     the unprocessed signal
  wet     the processed signal
  mix     0.0 = all dry, 1.0 = all wet

For each sample:

    output = (dry × (1 - mix)) + (wet × mix)

The weights always sum to 1.0, so blending two full-scale signals never
boosts the level. This is a linear crossfade: at mix = 0.5 two uncorrelated
signals sound slightly quieter than either alone. Effects rarely care.

The dry signal must be time-aligned with the wet one. If the processed path
has latency (oversampling filters, for instance), delay the dry path by the
same amount first, or the blend becomes a comb filter.
*/

/// Apply dry/wet mixing to a buffer, blending original (dry) with processed (wet).
///
/// wet[i] = (dry[i] × (1-mix)) + (wet[i] × mix)
#[inline]
pub fn apply_dry_wet(dry: &[f32], wet: &mut [f32], mix: f32) {
    debug_assert_eq!(dry.len(), wet.len());

    if mix >= 1.0 {
        return; // 100% wet, nothing to do
    }

    let dry_amount = 1.0 - mix;
    for (wet_sample, &dry_sample) in wet.iter_mut().zip(dry.iter()) {
        *wet_sample = dry_sample * dry_amount + *wet_sample * mix;
    }
}

/// Multiply a buffer by a scalar gain.
#[inline]
pub fn apply_gain(buffer: &mut [f32], gain: f32) {
    if gain == 1.0 {
        return;
    }
    for sample in buffer.iter_mut() {
        *sample *= gain;
    }
}
