//! Paired chunk reads and end-of-stream reconciliation.

use log::{debug, warn};
use std::time::Duration;

use crate::stream::{BaseRead, BaseSource, NewcomeRead, NewcomeSource};

/// What the reader made of one pair of reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ReadCycle {
    /// Both chunks are filled to full length.
    Ready(ChunkStatus),
    /// Base ended and newcome had no full chunk to keep going with.
    End,
    /// Neither stream produced a sample. The newcome stream may still have
    /// been declared exhausted by this read.
    Starved { secondary_exhausted: bool },
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct ChunkStatus {
    pub(crate) base_silent: bool,
    pub(crate) newcome_silent: bool,
    /// The newcome stream was declared exhausted during this read.
    pub(crate) secondary_exhausted: bool,
}

/// Owns the per-cycle chunk buffers and the newcome wait budget.
#[derive(Debug)]
pub(crate) struct DualStreamReader {
    frame_budget: usize,
    secondary_timeout: Duration,
    exhausted: bool,
    base_chunk: Vec<f32>,
    newcome_chunk: Vec<f32>,
}

impl DualStreamReader {
    pub(crate) fn new(frame_budget: usize, secondary_timeout: Duration) -> Self {
        Self {
            frame_budget,
            secondary_timeout,
            exhausted: false,
            base_chunk: Vec::new(),
            newcome_chunk: Vec::new(),
        }
    }

    pub(crate) fn frame_budget(&self) -> usize {
        self.frame_budget
    }

    pub(crate) fn secondary_timeout(&self) -> Duration {
        self.secondary_timeout
    }

    pub(crate) fn set_secondary_timeout(&mut self, timeout: Duration) {
        self.secondary_timeout = timeout;
        if !timeout.is_zero() {
            self.exhausted = false;
        }
    }

    /// Chunks filled by the last `Ready` read.
    pub(crate) fn chunks(&self) -> (&[f32], &[f32]) {
        (&self.base_chunk, &self.newcome_chunk)
    }

    /// Read one chunk from each stream and reconcile the results.
    ///
    /// `channels` holds the base and newcome channel counts. On `Ready` both
    /// chunks hold exactly `frame_budget` frames; missing samples are zeros.
    pub(crate) fn read_cycle<B, N>(
        &mut self,
        base: &mut B,
        newcome: &mut N,
        channels: [u8; 2],
    ) -> ReadCycle
    where
        B: BaseSource + ?Sized,
        N: NewcomeSource + ?Sized,
    {
        let base_len = self.frame_budget * channels[0] as usize;
        let newcome_len = self.frame_budget * channels[1] as usize;
        self.base_chunk.resize(base_len, 0.0);
        self.newcome_chunk.resize(newcome_len, 0.0);

        let base_read = base.read(&mut self.base_chunk);
        let newcome_read = newcome.read_timeout(&mut self.newcome_chunk, self.secondary_timeout);

        let newcome_got = match newcome_read {
            NewcomeRead::Data(count) => count.min(newcome_len),
            _ => 0,
        };
        let newcome_full = newcome_got == newcome_len;

        let mut status = ChunkStatus::default();
        let base_got = match base_read {
            BaseRead::End if !newcome_full => {
                debug!("base stream ended without a full newcome chunk");
                return ReadCycle::End;
            }
            BaseRead::End => {
                self.base_chunk.fill(0.0);
                0
            }
            BaseRead::Data(count) => {
                let count = count.min(base_len);
                self.base_chunk[count..].fill(0.0);
                count
            }
        };
        status.base_silent = base_got == 0;

        if !newcome_full {
            let waiting = newcome_read == NewcomeRead::Timeout && self.secondary_timeout.is_zero();
            if !waiting {
                self.mark_exhausted(&newcome_read, newcome_got);
                status.secondary_exhausted = true;
            }
            self.newcome_chunk[newcome_got..].fill(0.0);
        }
        status.newcome_silent = newcome_got == 0;

        if base_got == 0 && newcome_got == 0 {
            return ReadCycle::Starved {
                secondary_exhausted: status.secondary_exhausted,
            };
        }
        ReadCycle::Ready(status)
    }

    fn mark_exhausted(&mut self, read: &NewcomeRead, got: usize) {
        self.secondary_timeout = Duration::ZERO;
        if self.exhausted {
            return;
        }
        self.exhausted = true;
        match read {
            NewcomeRead::Failed(reason) => warn!("newcome stream failed: {}", reason),
            NewcomeRead::Timeout => warn!("newcome stream timed out, treating it as exhausted"),
            NewcomeRead::End => warn!("newcome stream ended"),
            NewcomeRead::Data(_) => warn!("newcome stream ended with a short chunk of {} samples", got),
        }
    }
}
