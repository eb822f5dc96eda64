//! Bounded ring-buffer stream connecting a producer thread to the stage.

use dasp_ring_buffer::Bounded;
use std::sync::{Arc, Condvar, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use crate::error::DownmixError;

use super::{BaseRead, BaseSource, NewcomeRead, NewcomeSource, SampleSink};

struct RingState {
    samples: Bounded<Vec<f32>>,
    finished: bool,
    reader_gone: bool,
}

struct Shared {
    state: Mutex<RingState>,
    changed: Condvar,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, RingState> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Create a stream holding at most `capacity` interleaved samples.
pub fn ring_stream(capacity: usize) -> (RingWriter, RingReader) {
    let shared = Arc::new(Shared {
        state: Mutex::new(RingState {
            samples: Bounded::from(vec![0.0; capacity.max(1)]),
            finished: false,
            reader_gone: false,
        }),
        changed: Condvar::new(),
    });
    (
        RingWriter {
            shared: shared.clone(),
        },
        RingReader { shared },
    )
}

/// Producer half. Dropping it marks the stream finished.
pub struct RingWriter {
    shared: Arc<Shared>,
}

impl RingWriter {
    /// Push samples, blocking while the ring is full.
    ///
    /// # Returns
    /// Samples accepted. Fewer than `samples.len()` only when the reader is gone.
    pub fn push(&self, samples: &[f32]) -> usize {
        let mut offset = 0usize;
        let mut state = self.shared.lock();
        while offset < samples.len() {
            if state.reader_gone {
                break;
            }
            let room = state.samples.max_len().saturating_sub(state.samples.len());
            if room == 0 {
                state = self
                    .shared
                    .changed
                    .wait(state)
                    .unwrap_or_else(|poisoned| poisoned.into_inner());
                continue;
            }
            let take = room.min(samples.len() - offset);
            for sample in samples[offset..offset + take].iter().copied() {
                state.samples.push(sample);
            }
            offset += take;
            self.shared.changed.notify_all();
        }
        offset
    }

    /// Mark the end of the stream. Readers drain what is left, then see `End`.
    pub fn finish(&self) {
        let mut state = self.shared.lock();
        if !state.finished {
            state.finished = true;
            self.shared.changed.notify_all();
        }
    }
}

impl Drop for RingWriter {
    fn drop(&mut self) {
        self.finish();
    }
}

impl SampleSink for RingWriter {
    fn write(&mut self, samples: &[f32]) -> Result<usize, DownmixError> {
        let written = self.push(samples);
        if written < samples.len() {
            return Err(DownmixError::Sink(format!(
                "reader closed after {} of {} samples",
                written,
                samples.len()
            )));
        }
        Ok(written)
    }
}

/// Consumer half, usable as either stage input.
pub struct RingReader {
    shared: Arc<Shared>,
}

impl RingReader {
    /// Samples currently buffered.
    pub fn available(&self) -> usize {
        self.shared.lock().samples.len()
    }

    fn drain_into(state: &mut RingState, buf: &mut [f32]) -> usize {
        let take = state.samples.len().min(buf.len());
        for slot in buf.iter_mut().take(take) {
            if let Some(sample) = state.samples.pop() {
                *slot = sample;
            }
        }
        take
    }

    /// Timed read for buffers the ring can never hold at once. Samples are
    /// consumed as they arrive; a short result means the deadline passed.
    fn stream_until(
        shared: &Shared,
        mut state: MutexGuard<'_, RingState>,
        buf: &mut [f32],
        deadline: Instant,
    ) -> NewcomeRead {
        let mut filled = 0usize;
        loop {
            let drained = Self::drain_into(&mut state, &mut buf[filled..]);
            if drained > 0 {
                filled += drained;
                shared.changed.notify_all();
            }
            if filled == buf.len() || state.finished {
                break;
            }
            let now = Instant::now();
            if now >= deadline {
                break;
            }
            let (guard, _) = shared
                .changed
                .wait_timeout(state, deadline - now)
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            state = guard;
        }
        match filled {
            0 if state.finished => NewcomeRead::End,
            0 => NewcomeRead::Timeout,
            _ => NewcomeRead::Data(filled),
        }
    }
}

impl Drop for RingReader {
    fn drop(&mut self) {
        let mut state = self.shared.lock();
        state.reader_gone = true;
        self.shared.changed.notify_all();
    }
}

impl BaseSource for RingReader {
    /// Drains as samples arrive, so a buffer larger than the ring still fills.
    fn read(&mut self, buf: &mut [f32]) -> BaseRead {
        let mut state = self.shared.lock();
        let mut filled = 0usize;
        loop {
            let drained = Self::drain_into(&mut state, &mut buf[filled..]);
            if drained > 0 {
                filled += drained;
                self.shared.changed.notify_all();
            }
            if filled == buf.len() || state.finished {
                break;
            }
            state = self
                .shared
                .changed
                .wait(state)
                .unwrap_or_else(|poisoned| poisoned.into_inner());
        }
        if filled == 0 && state.finished && state.samples.len() == 0 {
            return BaseRead::End;
        }
        BaseRead::Data(filled)
    }
}

impl NewcomeSource for RingReader {
    /// Nothing is consumed on timeout unless `buf` is larger than the ring.
    fn read_timeout(&mut self, buf: &mut [f32], timeout: Duration) -> NewcomeRead {
        let deadline = Instant::now() + timeout;
        let mut state = self.shared.lock();
        if buf.len() > state.samples.max_len() {
            return Self::stream_until(&self.shared, state, buf, deadline);
        }
        while state.samples.len() < buf.len() && !state.finished {
            let now = Instant::now();
            if now >= deadline {
                return NewcomeRead::Timeout;
            }
            let (guard, _) = self
                .shared
                .changed
                .wait_timeout(state, deadline - now)
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            state = guard;
        }
        if state.finished && state.samples.len() == 0 {
            return NewcomeRead::End;
        }
        let read = Self::drain_into(&mut state, buf);
        self.shared.changed.notify_all();
        NewcomeRead::Data(read)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn base_read_returns_full_chunks_then_end() {
        let (writer, mut reader) = ring_stream(16);
        writer.push(&[0.1, 0.2, 0.3, 0.4, 0.5]);
        writer.finish();

        let mut buf = [0.0_f32; 4];
        assert_eq!(reader.read(&mut buf), BaseRead::Data(4));
        assert_eq!(buf, [0.1, 0.2, 0.3, 0.4]);
        assert_eq!(reader.read(&mut buf), BaseRead::Data(1));
        assert_eq!(buf[0], 0.5);
        assert_eq!(reader.read(&mut buf), BaseRead::End);
    }

    #[test]
    fn base_read_blocks_until_producer_delivers() {
        let (writer, mut reader) = ring_stream(4);
        let producer = thread::spawn(move || {
            let samples: Vec<f32> = (0..32).map(|i| i as f32).collect();
            for chunk in samples.chunks(3) {
                writer.push(chunk);
            }
        });

        let mut collected = Vec::new();
        let mut buf = [0.0_f32; 4];
        loop {
            match reader.read(&mut buf) {
                BaseRead::Data(n) => collected.extend_from_slice(&buf[..n]),
                BaseRead::End => break,
            }
        }
        producer.join().unwrap();
        let expected: Vec<f32> = (0..32).map(|i| i as f32).collect();
        assert_eq!(collected, expected);
    }

    #[test]
    fn base_read_larger_than_ring_streams_through() {
        let (writer, mut reader) = ring_stream(4);
        let producer = thread::spawn(move || {
            let samples: Vec<f32> = (0..64).map(|i| i as f32).collect();
            writer.push(&samples);
        });

        let mut collected = Vec::new();
        let mut buf = [0.0_f32; 8];
        loop {
            match reader.read(&mut buf) {
                BaseRead::Data(n) => {
                    assert_eq!(n, 8);
                    collected.extend_from_slice(&buf[..n]);
                }
                BaseRead::End => break,
            }
        }
        producer.join().unwrap();
        let expected: Vec<f32> = (0..64).map(|i| i as f32).collect();
        assert_eq!(collected, expected);
    }

    #[test]
    fn timed_read_larger_than_ring_streams_through() {
        let (writer, mut reader) = ring_stream(4);
        let producer = thread::spawn(move || {
            for chunk in [[1.0, 2.0], [3.0, 4.0], [5.0, 6.0], [7.0, 8.0]] {
                thread::sleep(Duration::from_millis(2));
                writer.push(&chunk);
            }
        });

        let mut buf = [0.0_f32; 8];
        assert_eq!(
            reader.read_timeout(&mut buf, Duration::from_secs(5)),
            NewcomeRead::Data(8)
        );
        assert_eq!(buf, [1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0]);
        producer.join().unwrap();
        assert_eq!(
            reader.read_timeout(&mut buf, Duration::from_secs(5)),
            NewcomeRead::End
        );
    }

    #[test]
    fn oversize_timed_read_times_out_when_idle() {
        let (writer, mut reader) = ring_stream(4);
        let mut buf = [0.0_f32; 8];
        assert_eq!(
            reader.read_timeout(&mut buf, Duration::from_millis(5)),
            NewcomeRead::Timeout
        );
        writer.push(&[1.0, 2.0]);
        drop(writer);
        assert_eq!(
            reader.read_timeout(&mut buf, Duration::from_millis(5)),
            NewcomeRead::Data(2)
        );
        assert_eq!(
            reader.read_timeout(&mut buf, Duration::from_millis(5)),
            NewcomeRead::End
        );
    }

    #[test]
    fn timed_read_leaves_partial_data_in_place() {
        let (writer, mut reader) = ring_stream(16);
        writer.push(&[1.0, 2.0]);

        let mut buf = [0.0_f32; 4];
        assert_eq!(
            reader.read_timeout(&mut buf, Duration::ZERO),
            NewcomeRead::Timeout
        );
        assert_eq!(
            reader.read_timeout(&mut buf, Duration::from_millis(5)),
            NewcomeRead::Timeout
        );
        assert_eq!(reader.available(), 2);

        writer.push(&[3.0, 4.0]);
        assert_eq!(
            reader.read_timeout(&mut buf, Duration::ZERO),
            NewcomeRead::Data(4)
        );
        assert_eq!(buf, [1.0, 2.0, 3.0, 4.0]);
    }

    #[test]
    fn timed_read_drains_then_ends_after_finish() {
        let (writer, mut reader) = ring_stream(16);
        writer.push(&[1.0]);
        drop(writer);

        let mut buf = [0.0_f32; 4];
        assert_eq!(
            reader.read_timeout(&mut buf, Duration::from_millis(50)),
            NewcomeRead::Data(1)
        );
        assert_eq!(
            reader.read_timeout(&mut buf, Duration::from_millis(50)),
            NewcomeRead::End
        );
    }

    #[test]
    fn dropped_reader_unblocks_writer() {
        let (mut writer, reader) = ring_stream(2);
        let consumer = thread::spawn(move || {
            thread::sleep(Duration::from_millis(10));
            drop(reader);
        });
        let result = writer.write(&[0.0; 8]);
        consumer.join().unwrap();
        assert!(matches!(result, Err(DownmixError::Sink(_))));
    }

    #[test]
    fn vec_sink_collects_samples() {
        let mut sink: Vec<f32> = Vec::new();
        assert_eq!(sink.write(&[0.5, 0.25]).unwrap(), 2);
        assert_eq!(sink, vec![0.5, 0.25]);
    }
}
