//! Lock-free single-producer single-consumer sample queue.
//!
//! Moves audio between threads, or between a producer that writes in one
//! block size and a processor that wants another. Neither side ever blocks
//! or allocates once the queue exists.

use rtrb::{Consumer, Producer, RingBuffer};

use crate::error::{DspError, DspResult};

pub struct SampleWriter {
    producer: Producer<f32>,
}

pub struct SampleReader {
    consumer: Consumer<f32>,
}

/// Create a queue holding up to `capacity` samples.
pub fn sample_fifo(capacity: usize) -> DspResult<(SampleWriter, SampleReader)> {
    if capacity == 0 {
        return Err(DspError::invalid("capacity", 0.0));
    }
    let (producer, consumer) = RingBuffer::<f32>::new(capacity);
    Ok((SampleWriter { producer }, SampleReader { consumer }))
}

impl SampleWriter {
    /// Queue as many of `samples` as fit. Returns how many were written.
    pub fn write(&mut self, samples: &[f32]) -> usize {
        let n = samples.len().min(self.producer.slots());
        match self.producer.write_chunk_uninit(n) {
            Ok(chunk) => chunk.fill_from_iter(samples.iter().copied()),
            Err(_) => 0,
        }
    }

    /// Free space in samples.
    pub fn space(&self) -> usize {
        self.producer.slots()
    }
}

impl SampleReader {
    /// Dequeue up to `dest.len()` samples. Returns how many were read.
    pub fn read(&mut self, dest: &mut [f32]) -> usize {
        let n = dest.len().min(self.consumer.slots());
        let Ok(chunk) = self.consumer.read_chunk(n) else {
            return 0;
        };

        let (first, second) = chunk.as_slices();
        dest[..first.len()].copy_from_slice(first);
        dest[first.len()..n].copy_from_slice(second);
        chunk.commit_all();
        n
    }

    /// Samples queued and ready to read.
    pub fn available(&self) -> usize {
        self.consumer.slots()
    }

    /// Discard everything currently queued.
    pub fn flush(&mut self) {
        let n = self.consumer.slots();
        if let Ok(chunk) = self.consumer.read_chunk(n) {
            chunk.commit_all();
        }
    }
}
