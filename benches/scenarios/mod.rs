//! Benchmarks for patch-built processing chains.

mod chain;

pub use chain::bench_chain;
