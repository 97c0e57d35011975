//! Composable processing graphs.
//!
//! The `Processor` trait gives every DSP component the same block-in,
//! block-out shape with named parameters. `Through` chains two processors at
//! compile time; `ProcessorChain` chains any number at runtime. The
//! `extensions` module adds the fluent `.through()` helper.

/// Runtime-built serial chain of boxed processors.
pub mod chain;
/// Fluent combinators (`.through()`, `.boxed()`).
pub mod extensions;
/// Core trait shared by all processors.
pub mod node;
/// Serial chaining of two processors.
pub mod through;

pub use chain::ProcessorChain;
pub use extensions::ProcessorExt;
pub use node::Processor;
pub use through::Through;
