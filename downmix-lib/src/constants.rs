/// Lowest accepted stream sample rate (inclusive).
pub const SAMPLE_RATE_MIN: u32 = 8_000;
/// Highest accepted stream sample rate (exclusive).
pub const SAMPLE_RATE_MAX: u32 = 100_000;

/// Lowest accepted stage gain in dB.
pub const GAIN_MIN: f32 = -100.0;
/// Highest accepted stage gain in dB.
pub const GAIN_MAX: f32 = 100.0;
/// Two gains closer than this (dB) are treated as the same setting.
pub const GAIN_EPSILON_DB: f32 = 0.05;

/// Frames pulled from each stream per cycle unless configured otherwise.
pub const DEFAULT_FRAME_BUDGET: usize = 256;
