use crate::error::DspResult;
use crate::graph::{chain::ProcessorChain, node::Processor, through::Through};

pub trait ProcessorExt: Processor + Sized {
    fn through<P: Processor>(self, next: P) -> DspResult<Through<Self, P>> {
        Through::new(self, next)
    }

    fn boxed(self) -> Box<dyn Processor>
    where
        Self: 'static,
    {
        Box::new(self)
    }

    /// Start a dynamic chain with this processor as its first stage.
    fn into_chain(self) -> DspResult<ProcessorChain>
    where
        Self: 'static,
    {
        let mut chain = ProcessorChain::new()?;
        chain.push(self);
        Ok(chain)
    }
}

impl<T: Processor> ProcessorExt for T {}
