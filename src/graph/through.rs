use crate::error::{zeroed, DspError, DspResult};
use crate::graph::node::Processor;
use crate::MAX_BLOCK_SIZE;

/*
Serial Signal Chain (Through)
=============================

Through connects two processors in series, passing the output of the first
into the second. This is the fundamental building block for effect chains
like: highpass → waveshaper → lowpass.

How It Works:
-------------
1. The first processor renders the input into a scratch buffer
2. The second processor reads the scratch buffer and writes the output

  Input:          [0.5, 0.8, -0.3, 0.9, ...]
  First (filter): [0.4, 0.6, -0.2, 0.7, ...]  (scratch)
  Second (clip):  [0.4, 0.6, -0.2, 0.7, ...]  (output)

Blocks longer than MAX_BLOCK_SIZE are split so the scratch buffer never
grows after construction. The scratch buffer is the only allocation, so
joining two processors can fail with AllocationFailure.

Common Use Cases:
-----------------

1. Pre/post filtering around distortion:

     let chain = RbjFilter::highpass(80.0, sr)?
         .through(Waveshaper::new(ShapeKind::SoftClip, 4)?)?
         .through(RbjFilter::lowpass(8_000.0, sr)?)?;

   - Remove rumble before the curve, tame fizz after it

2. Steeper slopes:

     let steep = RbjFilter::lowpass(2_000.0, sr)?
         .through(RbjFilter::lowpass(2_000.0, sr)?)?;

   - Two 12dB biquads = 24dB/octave rolloff

Parameters:
-----------
Names are routed by prefix: "0.cutoff" reaches the first processor,
"1.mix" the second. Nested chains nest prefixes the same way, so in
a.through(b).through(c) the name for c's mix is "1.mix" and b's is "0.1.mix".

Latency adds up: a 32-sample waveshaper after a zero-latency filter
leaves the pair 32 samples late.
*/

pub struct Through<A, B> {
    first: A,
    second: B,
    scratch: Vec<f32>,
}

impl<A, B> Through<A, B> {
    pub fn new(first: A, second: B) -> DspResult<Self> {
        Ok(Self {
            first,
            second,
            scratch: zeroed(MAX_BLOCK_SIZE)?,
        })
    }

    pub fn first(&self) -> &A {
        &self.first
    }

    pub fn second(&self) -> &B {
        &self.second
    }

    pub fn first_mut(&mut self) -> &mut A {
        &mut self.first
    }

    pub fn second_mut(&mut self) -> &mut B {
        &mut self.second
    }

    pub fn into_inner(self) -> (A, B) {
        (self.first, self.second)
    }
}

impl<A: Processor, B: Processor> Processor for Through<A, B> {
    fn process(&mut self, output: &mut [f32], input: &[f32]) {
        debug_assert_eq!(output.len(), input.len());

        for (out, x) in output
            .chunks_mut(MAX_BLOCK_SIZE)
            .zip(input.chunks(MAX_BLOCK_SIZE))
        {
            let scratch = &mut self.scratch[..x.len()];
            self.first.process(scratch, x);
            self.second.process(out, scratch);
        }
    }

    fn set_parameter(&mut self, name: &str, value: f32) -> DspResult<()> {
        match name.split_once('.') {
            Some(("0", rest)) => self.first.set_parameter(rest, value),
            Some(("1", rest)) => self.second.set_parameter(rest, value),
            _ => Err(DspError::UnknownParameter(name.to_string())),
        }
    }

    fn reset(&mut self) {
        self.first.reset();
        self.second.reset();
    }

    fn latency(&self) -> usize {
        self.first.latency() + self.second.latency()
    }
}
