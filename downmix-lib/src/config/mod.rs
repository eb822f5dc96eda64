//! Downmix configuration model and validation.
//!
//! [`DownmixConfig`] is the single source of truth for how the stage mixes.
//! It is only ever changed through [`ParameterStore`], which validates every
//! value before it is stored.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::constants::{GAIN_MAX, GAIN_MIN, SAMPLE_RATE_MAX, SAMPLE_RATE_MIN};
use crate::error::DownmixError;

pub mod gain;
mod settings;
mod store;

pub use settings::{DownmixSettings, StageSettings};
pub use store::ParameterStore;

/// Which of the two inputs a parameter refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StreamRole {
    /// The primary stream, audible by default.
    Base,
    /// The secondary stream blended in when downmixing is switched on.
    Newcome,
}

impl StreamRole {
    /// Index of this role in the per-stream config arrays.
    pub fn index(self) -> usize {
        match self {
            StreamRole::Base => 0,
            StreamRole::Newcome => 1,
        }
    }

    /// The opposite role.
    pub fn other(self) -> Self {
        match self {
            StreamRole::Base => StreamRole::Newcome,
            StreamRole::Newcome => StreamRole::Base,
        }
    }
}

/// Target state the crossfade is driving toward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlayStatus {
    /// Base passes through untouched, newcome is muted.
    #[default]
    Bypass,
    /// Both streams blend toward their "on" gains.
    On,
    /// Both streams return to their "off" gains.
    Off,
}

/// Which signal the stage emits downstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputRouting {
    #[default]
    Mixed,
    BaseOnly,
    NewcomeOnly,
}

/// Channel of a stereo newcome stream that feeds a mono output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChannelSelect {
    #[default]
    Left,
    Right,
}

impl TryFrom<u8> for PlayStatus {
    type Error = DownmixError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(PlayStatus::Bypass),
            1 => Ok(PlayStatus::On),
            2 => Ok(PlayStatus::Off),
            other => Err(DownmixError::invalid(format!(
                "play status {} is out of range",
                other
            ))),
        }
    }
}

impl TryFrom<u8> for OutputRouting {
    type Error = DownmixError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(OutputRouting::Mixed),
            1 => Ok(OutputRouting::BaseOnly),
            2 => Ok(OutputRouting::NewcomeOnly),
            other => Err(DownmixError::invalid(format!(
                "output routing {} is out of range",
                other
            ))),
        }
    }
}

impl TryFrom<u8> for ChannelSelect {
    type Error = DownmixError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(ChannelSelect::Left),
            1 => Ok(ChannelSelect::Right),
            other => Err(DownmixError::invalid(format!(
                "dual mono select {} is out of range",
                other
            ))),
        }
    }
}

impl FromStr for PlayStatus {
    type Err = DownmixError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "bypass" => Ok(PlayStatus::Bypass),
            "on" => Ok(PlayStatus::On),
            "off" => Ok(PlayStatus::Off),
            other => Err(DownmixError::invalid(format!("unknown play status \"{}\"", other))),
        }
    }
}

impl FromStr for OutputRouting {
    type Err = DownmixError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "mixed" | "mix" => Ok(OutputRouting::Mixed),
            "base" | "base_only" => Ok(OutputRouting::BaseOnly),
            "newcome" | "newcome_only" => Ok(OutputRouting::NewcomeOnly),
            other => Err(DownmixError::invalid(format!("unknown output routing \"{}\"", other))),
        }
    }
}

impl FromStr for ChannelSelect {
    type Err = DownmixError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "left" | "l" => Ok(ChannelSelect::Left),
            "right" | "r" => Ok(ChannelSelect::Right),
            other => Err(DownmixError::invalid(format!("unknown channel select \"{}\"", other))),
        }
    }
}

/// Complete mixing configuration for one downmix stage.
///
/// Gains are in dB: `gain[0]`/`gain[1]` are the base stream's off/on gains,
/// `gain[2]`/`gain[3]` the newcome stream's off/on gains.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DownmixConfig {
    pub stream_rate: [u32; 2],
    pub stream_channels: [u8; 2],
    #[serde(deserialize_with = "gain::deserialize_db_gains")]
    pub gain: [f32; 4],
    pub transition_ms: [u32; 2],
    pub play_status: PlayStatus,
    pub output_status: OutputRouting,
    pub dual_mono_select: ChannelSelect,
}

impl Default for DownmixConfig {
    fn default() -> Self {
        Self {
            stream_rate: [44_100, 44_100],
            stream_channels: [1, 2],
            gain: [0.0; 4],
            transition_ms: [0, 50],
            play_status: PlayStatus::Bypass,
            output_status: OutputRouting::Mixed,
            dual_mono_select: ChannelSelect::Left,
        }
    }
}

impl DownmixConfig {
    /// Sample rate of one stream.
    pub fn rate(&self, role: StreamRole) -> u32 {
        self.stream_rate[role.index()]
    }

    /// Channel count of one stream.
    pub fn channels(&self, role: StreamRole) -> u8 {
        self.stream_channels[role.index()]
    }

    /// `(off, on)` gains in dB for one stream.
    pub fn gain_pair(&self, role: StreamRole) -> (f32, f32) {
        let offset = role.index() * 2;
        (self.gain[offset], self.gain[offset + 1])
    }

    /// Interleaved samples one stream contributes to a chunk of `frames`.
    pub fn chunk_samples(&self, role: StreamRole, frames: usize) -> usize {
        frames * self.channels(role) as usize
    }

    /// Validate every field plus the cross-field rate invariant.
    pub fn validate(&self) -> Result<(), DownmixError> {
        validate_rate(self.stream_rate[0])?;
        validate_rate(self.stream_rate[1])?;
        validate_rate_pair(self.stream_rate[0], self.stream_rate[1])?;
        validate_channels(self.stream_channels[0])?;
        validate_channels(self.stream_channels[1])?;
        validate_gains(&self.gain)
    }
}

pub(crate) fn validate_rate(rate: u32) -> Result<(), DownmixError> {
    if !(SAMPLE_RATE_MIN..SAMPLE_RATE_MAX).contains(&rate) {
        return Err(DownmixError::invalid(format!(
            "sample rate {} is outside [{}, {})",
            rate, SAMPLE_RATE_MIN, SAMPLE_RATE_MAX
        )));
    }
    Ok(())
}

pub(crate) fn validate_rate_pair(base: u32, newcome: u32) -> Result<(), DownmixError> {
    if base != newcome {
        return Err(DownmixError::invalid(format!(
            "base rate {} and newcome rate {} must match",
            base, newcome
        )));
    }
    Ok(())
}

pub(crate) fn validate_channels(channels: u8) -> Result<(), DownmixError> {
    if channels != 1 && channels != 2 {
        return Err(DownmixError::invalid(format!(
            "channel count {} must be 1 or 2",
            channels
        )));
    }
    Ok(())
}

pub(crate) fn validate_gains(gains: &[f32; 4]) -> Result<(), DownmixError> {
    for (index, gain) in gains.iter().enumerate() {
        if !gain.is_finite() || *gain < GAIN_MIN || *gain > GAIN_MAX {
            return Err(DownmixError::invalid(format!(
                "gain[{}] = {} is outside [{}, {}] dB",
                index, gain, GAIN_MIN, GAIN_MAX
            )));
        }
    }
    Ok(())
}
