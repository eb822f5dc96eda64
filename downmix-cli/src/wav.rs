//! WAV file sink for mixed output.

use std::fs::File;
use std::io::BufWriter;

use downmix_lib::stream::SampleSink;
use downmix_lib::DownmixError;
use hound::{SampleFormat, WavSpec, WavWriter};

use crate::error::CliError;

/// Writes mixed samples as 16-bit PCM.
pub struct WavSink {
    writer: WavWriter<BufWriter<File>>,
    samples: u64,
}

impl WavSink {
    pub fn create(path: &str, sample_rate: u32, channels: u8) -> Result<Self, CliError> {
        let spec = WavSpec {
            channels: channels as u16,
            sample_rate,
            bits_per_sample: 16,
            sample_format: SampleFormat::Int,
        };
        let writer = WavWriter::create(path, spec)?;
        Ok(Self { writer, samples: 0 })
    }

    /// Flush the header and return how many samples were written.
    pub fn finalize(self) -> Result<u64, CliError> {
        self.writer.finalize()?;
        Ok(self.samples)
    }
}

impl SampleSink for WavSink {
    fn write(&mut self, samples: &[f32]) -> Result<usize, DownmixError> {
        for &sample in samples {
            let value = (sample.clamp(-1.0, 1.0) * i16::MAX as f32) as i16;
            self.writer
                .write_sample(value)
                .map_err(|err| DownmixError::Sink(err.to_string()))?;
        }
        self.samples += samples.len() as u64;
        Ok(samples.len())
    }
}
