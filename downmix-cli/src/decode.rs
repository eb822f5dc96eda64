//! Symphonia decoding of the two inputs into ring streams.

use log::{debug, warn};
use std::path::Path;
use std::thread::{self, JoinHandle};

use downmix_lib::stream::RingWriter;
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{Decoder, DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::{FormatOptions, FormatReader};
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

use crate::error::CliError;

/// Rate and channel count of a decoded input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamSpec {
    pub sample_rate: u32,
    pub channels: u8,
}

/// An opened input yielding interleaved `f32` packets.
pub struct DecodedInput {
    format: Box<dyn FormatReader>,
    decoder: Box<dyn Decoder>,
    track_id: u32,
    spec: StreamSpec,
    buffer: Option<SampleBuffer<f32>>,
}

/// Probe `path` and build a decoder for its first decodable track.
pub fn open_file(path: &str) -> Result<DecodedInput, CliError> {
    let src = std::fs::File::open(path)
        .map_err(|err| CliError::Decode(format!("{}: {}", path, err)))?;
    let mss = MediaSourceStream::new(Box::new(src), Default::default());

    let mut hint = Hint::new();
    if let Some(extension) = Path::new(path).extension().and_then(|ext| ext.to_str()) {
        hint.with_extension(extension);
    }

    let probed = symphonia::default::get_probe().format(
        &hint,
        mss,
        &FormatOptions::default(),
        &MetadataOptions::default(),
    )?;
    let format = probed.format;

    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .ok_or_else(|| CliError::Decode(format!("{}: no supported audio tracks", path)))?;

    let sample_rate = track
        .codec_params
        .sample_rate
        .ok_or_else(|| CliError::Decode(format!("{}: unknown sample rate", path)))?;
    let channels = track
        .codec_params
        .channels
        .map(|channels| channels.count())
        .ok_or_else(|| CliError::Decode(format!("{}: unknown channel layout", path)))?;
    let channels = u8::try_from(channels)
        .map_err(|_| CliError::Decode(format!("{}: {} channels", path, channels)))?;

    let decoder =
        symphonia::default::get_codecs().make(&track.codec_params, &DecoderOptions::default())?;
    let track_id = track.id;

    debug!("opened {}: {} Hz, {} channels", path, sample_rate, channels);
    Ok(DecodedInput {
        format,
        decoder,
        track_id,
        spec: StreamSpec {
            sample_rate,
            channels,
        },
        buffer: None,
    })
}

impl DecodedInput {
    pub fn spec(&self) -> StreamSpec {
        self.spec
    }

    /// Decode the next packet into `out` as interleaved samples.
    ///
    /// # Returns
    /// `false` once the input is exhausted.
    pub fn next_packet(&mut self, out: &mut Vec<f32>) -> Result<bool, CliError> {
        loop {
            let packet = match self.format.next_packet() {
                Ok(packet) => packet,
                Err(SymphoniaError::IoError(ref err))
                    if err.kind() == std::io::ErrorKind::UnexpectedEof =>
                {
                    return Ok(false)
                }
                Err(SymphoniaError::ResetRequired) => return Ok(false),
                Err(err) => return Err(err.into()),
            };
            if packet.track_id() != self.track_id {
                continue;
            }

            let decoded = match self.decoder.decode(&packet) {
                Ok(decoded) => decoded,
                Err(SymphoniaError::DecodeError(err)) => {
                    warn!("skipping undecodable packet: {}", err);
                    continue;
                }
                Err(err) => return Err(err.into()),
            };

            let spec = *decoded.spec();
            let needed = decoded.capacity() * spec.channels.count();
            if self
                .buffer
                .as_ref()
                .map_or(true, |buffer| buffer.capacity() < needed)
            {
                self.buffer = Some(SampleBuffer::new(decoded.capacity() as u64, spec));
            }
            out.clear();
            if let Some(buffer) = self.buffer.as_mut() {
                buffer.copy_interleaved_ref(decoded);
                out.extend_from_slice(buffer.samples());
            }
            return Ok(true);
        }
    }
}

/// Decode `input` on its own thread, pushing samples into `writer`.
///
/// The writer is dropped when decoding stops, which ends the stream.
pub fn spawn_producer(
    name: &'static str,
    mut input: DecodedInput,
    writer: RingWriter,
) -> JoinHandle<u64> {
    thread::spawn(move || {
        let mut packet = Vec::new();
        let mut pushed = 0u64;
        loop {
            match input.next_packet(&mut packet) {
                Ok(true) => {
                    let accepted = writer.push(&packet);
                    pushed += accepted as u64;
                    if accepted < packet.len() {
                        debug!("{} reader went away", name);
                        break;
                    }
                }
                Ok(false) => break,
                Err(err) => {
                    warn!("{} input stopped: {}", name, err);
                    break;
                }
            }
        }
        debug!("{} producer finished after {} samples", name, pushed);
        pushed
    })
}
