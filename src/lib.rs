pub mod dsp; // Filters, convolution, resampling, waveshaping
pub mod error;
pub mod graph; // Composable processor chains
pub mod io;
pub mod patch; // Serializable chain descriptions

/// Largest block processed in one internal pass. Longer host blocks are
/// split, so scratch buffers are sized once at construction.
pub const MAX_BLOCK_SIZE: usize = 2048;

pub use error::{DspError, DspResult};
