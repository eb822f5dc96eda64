//! Reference mix engine with linear gain ramps.
//!
//! Each stream carries its own ramp. When the play status changes, the ramp
//! heads from its current gain toward the new target over the stream's
//! transition length. The output takes the base stream's channel layout; a
//! stereo newcome stream is folded into a mono base through the dual-mono
//! channel selection.

use log::debug;

use crate::config::gain::db_to_linear;
use crate::config::{ChannelSelect, OutputRouting, PlayStatus, StreamRole};
use crate::error::DownmixError;

use super::{EngineConfig, GainState, MixEngine, MixEngineFactory};

#[derive(Debug, Clone, Copy)]
struct GainRamp {
    current: f32,
    target: f32,
    step: f32,
    remaining: u32,
}

impl GainRamp {
    fn new(current: f32) -> Self {
        Self {
            current,
            target: current,
            step: 0.0,
            remaining: 0,
        }
    }

    fn retarget(&mut self, target: f32, frames: u32) {
        if target == self.target {
            return;
        }
        self.target = target;
        if frames == 0 {
            self.current = target;
            self.step = 0.0;
            self.remaining = 0;
        } else {
            self.step = (target - self.current) / frames as f32;
            self.remaining = frames;
        }
    }

    fn next(&mut self) -> f32 {
        if self.remaining > 0 {
            self.remaining -= 1;
            self.current = if self.remaining == 0 {
                self.target
            } else {
                self.current + self.step
            };
        }
        self.current
    }
}

/// Mix engine applying per-stream linear gain ramps.
#[derive(Debug)]
pub struct RampMixEngine {
    config: EngineConfig,
    base: GainRamp,
    newcome: GainRamp,
    status: Option<PlayStatus>,
}

impl RampMixEngine {
    pub fn open(config: &EngineConfig) -> Result<Self, DownmixError> {
        if config.sample_rate == 0 {
            return Err(DownmixError::EngineOpen("sample rate is zero".to_string()));
        }
        if config.channels.iter().any(|&ch| ch != 1 && ch != 2) {
            return Err(DownmixError::EngineOpen(format!(
                "unsupported channel layout {:?}",
                config.channels
            )));
        }

        let initial = config.resume.unwrap_or(GainState {
            base: db_to_linear(config.gains[0].off_db),
            newcome: db_to_linear(config.gains[1].off_db),
        });
        debug!(
            "ramp engine open: rate={} channels={:?} start gains=({:.3}, {:.3})",
            config.sample_rate, config.channels, initial.base, initial.newcome
        );

        Ok(Self {
            config: config.clone(),
            base: GainRamp::new(initial.base),
            newcome: GainRamp::new(initial.newcome),
            status: None,
        })
    }

    fn apply_status(&mut self, status: PlayStatus) {
        if self.status == Some(status) {
            return;
        }
        self.status = Some(status);
        let [base_pair, newcome_pair] = self.config.gains;
        match status {
            PlayStatus::Bypass => {
                self.base.retarget(1.0, 0);
                self.newcome.retarget(0.0, 0);
            }
            PlayStatus::On => {
                let base_frames = self.config.transition_frames(StreamRole::Base);
                let newcome_frames = self.config.transition_frames(StreamRole::Newcome);
                self.base.retarget(db_to_linear(base_pair.on_db), base_frames);
                self.newcome
                    .retarget(db_to_linear(newcome_pair.on_db), newcome_frames);
            }
            PlayStatus::Off => {
                let base_frames = self.config.transition_frames(StreamRole::Base);
                let newcome_frames = self.config.transition_frames(StreamRole::Newcome);
                self.base.retarget(db_to_linear(base_pair.off_db), base_frames);
                self.newcome
                    .retarget(db_to_linear(newcome_pair.off_db), newcome_frames);
            }
        }
    }
}

/// Sample of `channel` in the output layout, taken from a stream with
/// `source_channels` interleaved channels.
fn mapped_sample(
    samples: &[f32],
    source_channels: usize,
    frame: usize,
    channel: usize,
    output_channels: usize,
    select: ChannelSelect,
) -> f32 {
    let offset = frame * source_channels;
    if source_channels == output_channels {
        return samples[offset + channel];
    }
    if source_channels == 1 {
        return samples[offset];
    }
    match select {
        ChannelSelect::Left => samples[offset],
        ChannelSelect::Right => samples[offset + 1],
    }
}

impl MixEngine for RampMixEngine {
    fn process(
        &mut self,
        base: &[f32],
        newcome: &[f32],
        status: PlayStatus,
        out: &mut Vec<f32>,
    ) -> Result<usize, DownmixError> {
        let base_channels = self.config.channels[0] as usize;
        let newcome_channels = self.config.channels[1] as usize;
        if base.len() % base_channels != 0 {
            return Err(DownmixError::EngineProcess(format!(
                "base chunk of {} samples is not a whole number of frames",
                base.len()
            )));
        }
        let frames = base.len() / base_channels;
        if newcome.len() != frames * newcome_channels {
            return Err(DownmixError::EngineProcess(format!(
                "newcome chunk of {} samples does not match {} base frames",
                newcome.len(),
                frames
            )));
        }

        self.apply_status(status);

        let output_channels = base_channels;
        let select = self.config.dual_mono_select;
        let routing = self.config.output_routing;
        out.clear();
        out.reserve(frames * output_channels);
        for frame in 0..frames {
            let base_gain = self.base.next();
            let newcome_gain = self.newcome.next();
            for channel in 0..output_channels {
                let b = base[frame * base_channels + channel];
                let n = mapped_sample(
                    newcome,
                    newcome_channels,
                    frame,
                    channel,
                    output_channels,
                    select,
                );
                let value = match routing {
                    OutputRouting::Mixed => b * base_gain + n * newcome_gain,
                    OutputRouting::BaseOnly => b * base_gain,
                    OutputRouting::NewcomeOnly => n * newcome_gain,
                };
                out.push(value.clamp(-1.0, 1.0));
            }
        }
        Ok(out.len())
    }

    fn output_channels(&self) -> u8 {
        self.config.channels[0]
    }

    fn gain_state(&self) -> Option<GainState> {
        Some(GainState {
            base: self.base.current,
            newcome: self.newcome.current,
        })
    }
}

/// Factory for [`RampMixEngine`] instances.
#[derive(Debug, Clone, Copy, Default)]
pub struct RampEngineFactory;

impl MixEngineFactory for RampEngineFactory {
    fn open(&mut self, config: &EngineConfig) -> Result<Box<dyn MixEngine>, DownmixError> {
        Ok(Box::new(RampMixEngine::open(config)?))
    }
}
