//! Values the stage hands back to its driver.

use crate::config::{DownmixConfig, PlayStatus, StageSettings};
use crate::engine::MixEngineFactory;

/// Everything needed to build a [`super::DownmixStage`].
pub struct DownmixStageArgs<B, N, S> {
    pub config: DownmixConfig,
    pub settings: StageSettings,
    pub factory: Box<dyn MixEngineFactory>,
    pub base: B,
    pub newcome: N,
    pub sink: S,
}

/// Lifecycle of a stage.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum StageState {
    /// No engine opened yet.
    #[default]
    Idle,
    Running,
    /// Reconfiguration or engine open failed. Holds the reason.
    Closed(String),
    /// Both streams ended. Every later cycle reports `End`.
    Finished,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// The engine was rebuilt; no input was consumed.
    Reconfigured,
    /// Neither stream had data.
    Starved,
}

/// Details of one mixed cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MixReport {
    /// Interleaved samples written to the sink.
    pub samples: usize,
    pub output_channels: u8,
    pub base_silent: bool,
    pub newcome_silent: bool,
    /// The newcome stream was given up on this cycle and play status forced off.
    pub secondary_exhausted: bool,
    /// Status the engine mixed with.
    pub play_status: PlayStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    Mixed(MixReport),
    Skip(SkipReason),
    End,
}

/// Totals over a [`super::DownmixStage::run`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StageSummary {
    pub mixed_cycles: u64,
    pub skipped_cycles: u64,
    pub samples_written: u64,
}

impl StageSummary {
    pub(crate) fn record(&mut self, outcome: &CycleOutcome) {
        match outcome {
            CycleOutcome::Mixed(report) => {
                self.mixed_cycles += 1;
                self.samples_written += report.samples as u64;
            }
            CycleOutcome::Skip(_) => self.skipped_cycles += 1,
            CycleOutcome::End => {}
        }
    }
}
