//! Mix engine seam.
//!
//! The stage never mixes samples itself. It projects its config into an
//! [`EngineConfig`], asks a [`MixEngineFactory`] for an engine, feeds it one
//! chunk pair per cycle and drops it when the config goes stale.
//! - `binding`: owns the live engine instance.
//! - `ramp`: reference engine with linear gain ramps.

use crate::config::{ChannelSelect, DownmixConfig, OutputRouting, PlayStatus, StreamRole};
use crate::error::DownmixError;

mod binding;
pub mod ramp;

pub use binding::MixEngineBinding;
pub use ramp::{RampEngineFactory, RampMixEngine};

/// Off/on gain pair of one stream, in dB.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GainPair {
    pub off_db: f32,
    pub on_db: f32,
}

/// Linear gains an engine was applying when it was closed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GainState {
    pub base: f32,
    pub newcome: f32,
}

/// Engine-native projection of a validated [`DownmixConfig`].
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    pub sample_rate: u32,
    pub channels: [u8; 2],
    pub gains: [GainPair; 2],
    pub transition_ms: [u32; 2],
    pub dual_mono_select: ChannelSelect,
    pub output_routing: OutputRouting,
    /// Gains to resume from when this open replaces a previous engine.
    pub resume: Option<GainState>,
}

impl EngineConfig {
    pub fn from_config(config: &DownmixConfig, resume: Option<GainState>) -> Self {
        let pair = |role| {
            let (off_db, on_db) = config.gain_pair(role);
            GainPair { off_db, on_db }
        };
        Self {
            sample_rate: config.rate(StreamRole::Base),
            channels: config.stream_channels,
            gains: [pair(StreamRole::Base), pair(StreamRole::Newcome)],
            transition_ms: config.transition_ms,
            dual_mono_select: config.dual_mono_select,
            output_routing: config.output_status,
            resume,
        }
    }

    /// Frames a transition of `role` spans at this sample rate.
    pub fn transition_frames(&self, role: StreamRole) -> u32 {
        let ms = self.transition_ms[role.index()] as u64;
        u32::try_from(ms * self.sample_rate as u64 / 1000).unwrap_or(u32::MAX)
    }
}

/// An open mix engine instance. Dropping it closes it.
pub trait MixEngine: Send {
    /// Mix one chunk pair into `out`, replacing its contents.
    ///
    /// `base` and `newcome` are interleaved with their own channel counts and
    /// hold the same number of frames.
    ///
    /// # Returns
    /// Number of interleaved samples written to `out`.
    fn process(
        &mut self,
        base: &[f32],
        newcome: &[f32],
        status: PlayStatus,
        out: &mut Vec<f32>,
    ) -> Result<usize, DownmixError>;

    /// Channel count of the mixed output.
    fn output_channels(&self) -> u8;

    /// Current linear gains, if the engine tracks them.
    fn gain_state(&self) -> Option<GainState> {
        None
    }
}

/// Opens mix engines from an [`EngineConfig`].
pub trait MixEngineFactory: Send {
    fn open(&mut self, config: &EngineConfig) -> Result<Box<dyn MixEngine>, DownmixError>;
}
