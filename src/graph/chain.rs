//! Runtime-built serial chain of boxed processors.
//!
//! `Through` fixes its topology at compile time. `ProcessorChain` is what a
//! patch loaded from a file builds into: any number of stages, chosen at
//! runtime, run in order.

use crate::error::{zeroed, DspError, DspResult};
use crate::graph::node::Processor;
use crate::MAX_BLOCK_SIZE;

pub struct ProcessorChain {
    stages: Vec<Box<dyn Processor>>,
    scratch: Vec<f32>,
}

impl ProcessorChain {
    /// Empty chain. Allocates the inter-stage scratch buffer.
    pub fn new() -> DspResult<Self> {
        Ok(Self {
            stages: Vec::new(),
            scratch: zeroed(MAX_BLOCK_SIZE)?,
        })
    }

    pub fn push<P: Processor + 'static>(&mut self, stage: P) {
        self.stages.push(Box::new(stage));
    }

    pub fn push_boxed(&mut self, stage: Box<dyn Processor>) {
        self.stages.push(stage);
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    pub fn stage_mut(&mut self, index: usize) -> Option<&mut (dyn Processor + 'static)> {
        self.stages.get_mut(index).map(|stage| &mut **stage)
    }

    /// Set `name` on the stage at `index`.
    pub fn set_stage_parameter(&mut self, index: usize, name: &str, value: f32) -> DspResult<()> {
        match self.stages.get_mut(index) {
            Some(stage) => stage.set_parameter(name, value),
            None => Err(DspError::UnknownParameter(format!("{index}.{name}"))),
        }
    }
}

impl Processor for ProcessorChain {
    /// An empty chain copies input to output.
    fn process(&mut self, output: &mut [f32], input: &[f32]) {
        debug_assert_eq!(output.len(), input.len());

        let Some((head, rest)) = self.stages.split_first_mut() else {
            output.copy_from_slice(input);
            return;
        };

        for (out, x) in output
            .chunks_mut(MAX_BLOCK_SIZE)
            .zip(input.chunks(MAX_BLOCK_SIZE))
        {
            head.process(out, x);
            for stage in rest.iter_mut() {
                let scratch = &mut self.scratch[..x.len()];
                scratch.copy_from_slice(out);
                stage.process(out, scratch);
            }
        }
    }

    /// Names take the form `"<stage index>.<parameter>"`, e.g. `"0.cutoff"`.
    fn set_parameter(&mut self, name: &str, value: f32) -> DspResult<()> {
        let unknown = || DspError::UnknownParameter(name.to_string());
        let (index, rest) = name.split_once('.').ok_or_else(unknown)?;
        let index: usize = index.parse().map_err(|_| unknown())?;
        self.set_stage_parameter(index, rest, value)
    }

    fn reset(&mut self) {
        for stage in &mut self.stages {
            stage.reset();
        }
    }

    fn latency(&self) -> usize {
        self.stages.iter().map(|stage| stage.latency()).sum()
    }
}
