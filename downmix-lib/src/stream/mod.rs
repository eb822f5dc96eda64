//! Stream endpoints the stage reads from and writes to.

use std::time::Duration;

use crate::error::DownmixError;

mod ring;

pub use ring::{ring_stream, RingReader, RingWriter};

/// Outcome of a blocking read on the base stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BaseRead {
    /// Number of interleaved samples written to the buffer.
    Data(usize),
    End,
}

/// Outcome of a timed read on the newcome stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NewcomeRead {
    /// Number of interleaved samples written to the buffer.
    Data(usize),
    /// No full chunk became ready within the wait budget.
    Timeout,
    End,
    Failed(String),
}

/// Primary input. Reads block until data or end of stream.
pub trait BaseSource: Send {
    fn read(&mut self, buf: &mut [f32]) -> BaseRead;
}

/// Secondary input. Reads block for at most `timeout`.
pub trait NewcomeSource: Send {
    fn read_timeout(&mut self, buf: &mut [f32], timeout: Duration) -> NewcomeRead;
}

/// Downstream consumer of mixed samples.
pub trait SampleSink: Send {
    /// Write interleaved samples, returning how many were accepted.
    fn write(&mut self, samples: &[f32]) -> Result<usize, DownmixError>;
}

impl SampleSink for Vec<f32> {
    fn write(&mut self, samples: &[f32]) -> Result<usize, DownmixError> {
        self.extend_from_slice(samples);
        Ok(samples.len())
    }
}
