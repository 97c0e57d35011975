//! Moving samples between threads and block sizes.

/// SPSC sample queue backed by `rtrb`.
#[cfg(feature = "rtrb")]
pub mod fifo;

#[cfg(feature = "rtrb")]
pub use fifo::{sample_fifo, SampleReader, SampleWriter};
