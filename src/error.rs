//! Error types for parameter validation and construction.
//!
//! Every check happens when a component is built or a parameter is set.
//! `process` on a constructed component never fails.

use thiserror::Error;

/// Errors returned by constructors and parameter setters.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DspError {
    /// A value outside the range the component accepts
    #[error("invalid value {value} for parameter `{param}`")]
    InvalidParameter { param: &'static str, value: f32 },

    /// A filter type, shape or convolution mode that is not implemented
    #[error("unsupported mode: {0}")]
    UnsupportedMode(String),

    /// `set_parameter` called with a name the component does not expose
    #[error("unknown parameter: {0}")]
    UnknownParameter(String),

    /// Buffer reservation failed while building a component
    #[error("failed to allocate {requested} samples")]
    AllocationFailure { requested: usize },
}

impl DspError {
    pub(crate) fn invalid(param: &'static str, value: f32) -> Self {
        log::warn!("rejected {param} = {value}");
        DspError::InvalidParameter { param, value }
    }
}

/// Result type for DSP construction and parameter updates
pub type DspResult<T> = Result<T, DspError>;

/// Allocate a zeroed buffer, reporting failure instead of aborting.
pub(crate) fn zeroed<T: Clone + Default>(len: usize) -> DspResult<Vec<T>> {
    let mut buffer = Vec::new();
    buffer
        .try_reserve_exact(len)
        .map_err(|_| DspError::AllocationFailure { requested: len })?;
    buffer.resize(len, T::default());
    Ok(buffer)
}
