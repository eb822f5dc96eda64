//! # Downmix Library
//!
//! A streaming pipeline stage that merges a "base" and a "newcome" PCM stream
//! into one output, crossfading between base-only and blended playback.
//! Mixing parameters can be changed while the pipeline is running; the stage
//! reopens its mix engine on the next cycle instead of touching it mid-stream.

pub mod config;
pub mod constants;
pub mod engine;
pub mod error;
pub mod stage;
pub mod stream;

#[cfg(test)]
pub(crate) mod test_support;

pub use config::{
    ChannelSelect, DownmixConfig, DownmixSettings, OutputRouting, PlayStatus, StageSettings,
    StreamRole,
};
pub use error::DownmixError;
pub use stage::{
    CycleOutcome, DownmixStage, DownmixStageArgs, MixReport, SkipReason, StageState, StageSummary,
};
