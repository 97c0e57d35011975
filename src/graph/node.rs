use crate::error::DspResult;

/// Core trait for block processors
///
/// A processor turns an input block into an output block of the same length
/// and keeps whatever streaming state it needs between calls. Parameters are
/// addressed by name so hosts and patches can drive any processor uniformly.
pub trait Processor: Send {
    /// Process one block. `output.len()` must equal `input.len()`.
    fn process(&mut self, output: &mut [f32], input: &[f32]);

    /// Set a named parameter.
    ///
    /// Unknown names return `DspError::UnknownParameter`; out of range values
    /// return `DspError::InvalidParameter` and leave the processor unchanged.
    fn set_parameter(&mut self, name: &str, value: f32) -> DspResult<()>;

    /// Clear streaming state; configuration is kept.
    fn reset(&mut self);

    /// Delay in samples between input and output.
    ///
    /// Default is zero (memoryless or minimum-phase processors).
    fn latency(&self) -> usize {
        0
    }
}

/// Allow boxed processors to be used as processors (for dynamic dispatch)
impl Processor for Box<dyn Processor> {
    fn process(&mut self, output: &mut [f32], input: &[f32]) {
        (**self).process(output, input)
    }

    fn set_parameter(&mut self, name: &str, value: f32) -> DspResult<()> {
        (**self).set_parameter(name, value)
    }

    fn reset(&mut self) {
        (**self).reset()
    }

    fn latency(&self) -> usize {
        (**self).latency()
    }
}
