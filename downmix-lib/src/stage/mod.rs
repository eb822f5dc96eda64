//! The downmix pipeline stage.
//!
//! A [`DownmixStage`] owns both input sources, the output sink, the
//! configuration and the mix engine. Each call to
//! [`DownmixStage::process_cycle`] does at most one of: rebuild the engine,
//! or read one chunk pair, mix it and write the result.
//! - `reader`: paired reads and end-of-stream reconciliation.
//! - `gate`: deferred engine reconfiguration.
//! - `types`: outcomes and construction arguments.

use log::{debug, info, warn};
use std::time::Duration;

use crate::config::{
    ChannelSelect, DownmixConfig, OutputRouting, ParameterStore, PlayStatus, StreamRole,
};
use crate::engine::MixEngineBinding;
use crate::error::DownmixError;
use crate::stream::{BaseSource, NewcomeSource, SampleSink};

#[cfg(feature = "debug")]
mod debug;
mod gate;
mod reader;
mod types;

use gate::ReconfigGate;
use reader::{DualStreamReader, ReadCycle};

pub use types::{CycleOutcome, DownmixStageArgs, MixReport, SkipReason, StageState, StageSummary};

/// Single-owner driver merging a base and a newcome stream.
pub struct DownmixStage<B, N, S> {
    store: ParameterStore,
    binding: MixEngineBinding,
    gate: ReconfigGate,
    reader: DualStreamReader,
    state: StageState,
    base: B,
    newcome: N,
    sink: S,
    mixed: Vec<f32>,
    #[cfg(feature = "debug")]
    counters: debug::CycleCounters,
}

impl<B, N, S> DownmixStage<B, N, S>
where
    B: BaseSource,
    N: NewcomeSource,
    S: SampleSink,
{
    /// Build a stage. The engine is opened lazily by the first cycle.
    pub fn new(args: DownmixStageArgs<B, N, S>) -> Result<Self, DownmixError> {
        args.settings.validate()?;
        let store = ParameterStore::new(args.config)?;
        Ok(Self {
            store,
            binding: MixEngineBinding::from_boxed(args.factory),
            gate: ReconfigGate::default(),
            reader: DualStreamReader::new(
                args.settings.frame_budget,
                args.settings.secondary_timeout(),
            ),
            state: StageState::Idle,
            base: args.base,
            newcome: args.newcome,
            sink: args.sink,
            mixed: Vec::new(),
            #[cfg(feature = "debug")]
            counters: debug::CycleCounters::default(),
        })
    }

    pub fn config(&self) -> &DownmixConfig {
        self.store.config()
    }

    pub fn state(&self) -> &StageState {
        &self.state
    }

    /// Whether the next cycle will rebuild the engine.
    pub fn is_dirty(&self) -> bool {
        self.gate.is_dirty()
    }

    pub fn frame_budget(&self) -> usize {
        self.reader.frame_budget()
    }

    pub fn secondary_timeout(&self) -> Duration {
        self.reader.secondary_timeout()
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Consume the stage, closing the engine, and hand back the sink.
    pub fn into_sink(mut self) -> S {
        self.binding.close();
        self.sink
    }

    pub fn set_stream_info(
        &mut self,
        role: StreamRole,
        rate: u32,
        channels: u8,
    ) -> Result<bool, DownmixError> {
        let changed = self.store.set_stream_info(role, rate, channels)?;
        Ok(self.note_change(changed))
    }

    pub fn set_stream_info_pair(
        &mut self,
        base_rate: u32,
        base_channels: u8,
        newcome_rate: u32,
        newcome_channels: u8,
    ) -> Result<bool, DownmixError> {
        let changed = self.store.set_stream_info_pair(
            base_rate,
            base_channels,
            newcome_rate,
            newcome_channels,
        )?;
        Ok(self.note_change(changed))
    }

    pub fn set_gain(&mut self, gains: [f32; 4]) -> Result<bool, DownmixError> {
        let changed = self.store.set_gain(gains)?;
        Ok(self.note_change(changed))
    }

    pub fn set_transition_times(&mut self, transition_ms: [u32; 2]) -> Result<bool, DownmixError> {
        let changed = self.store.set_transition_times(transition_ms)?;
        Ok(self.note_change(changed))
    }

    pub fn set_play_status(&mut self, status: PlayStatus) -> Result<bool, DownmixError> {
        let changed = self.store.set_play_status(status)?;
        Ok(self.note_change(changed))
    }

    pub fn set_output_status(&mut self, routing: OutputRouting) -> Result<bool, DownmixError> {
        let changed = self.store.set_output_status(routing)?;
        Ok(self.note_change(changed))
    }

    pub fn set_dual_mono_select(&mut self, select: ChannelSelect) -> Result<bool, DownmixError> {
        let changed = self.store.set_dual_mono_select(select)?;
        Ok(self.note_change(changed))
    }

    /// Swap in a whole configuration.
    pub fn replace_config(&mut self, config: DownmixConfig) -> Result<bool, DownmixError> {
        let changed = self.store.replace(config)?;
        Ok(self.note_change(changed))
    }

    pub fn switch_on(&mut self) -> Result<bool, DownmixError> {
        self.set_play_status(PlayStatus::On)
    }

    pub fn switch_off(&mut self) -> Result<bool, DownmixError> {
        self.set_play_status(PlayStatus::Off)
    }

    /// Wait budget for each newcome read. Zero means never wait.
    ///
    /// Takes effect on the next read and never triggers a reopen.
    pub fn set_secondary_timeout(&mut self, timeout: Duration) {
        self.reader.set_secondary_timeout(timeout);
    }

    fn note_change(&mut self, changed: bool) -> bool {
        let live = self.binding.is_open() || matches!(self.state, StageState::Closed(_));
        if changed && live {
            self.gate.mark_dirty();
        }
        changed
    }

    /// Run one cycle.
    pub fn process_cycle(&mut self) -> Result<CycleOutcome, DownmixError> {
        let outcome = self.step()?;
        #[cfg(feature = "debug")]
        self.counters.record(&outcome);
        Ok(outcome)
    }

    /// Drive cycles until both streams have ended.
    pub fn run(&mut self) -> Result<StageSummary, DownmixError> {
        let mut summary = StageSummary::default();
        loop {
            let outcome = self.process_cycle()?;
            summary.record(&outcome);
            if outcome == CycleOutcome::End {
                return Ok(summary);
            }
        }
    }

    fn step(&mut self) -> Result<CycleOutcome, DownmixError> {
        if self.state == StageState::Finished {
            return Ok(CycleOutcome::End);
        }

        if self.gate.is_dirty() {
            return match self.gate.reconfigure(self.store.config(), &mut self.binding) {
                Ok(()) => {
                    self.state = StageState::Running;
                    Ok(CycleOutcome::Skip(SkipReason::Reconfigured))
                }
                Err(err) => {
                    warn!("reconfiguration failed: {}", err);
                    self.state = StageState::Closed(err.to_string());
                    Err(err)
                }
            };
        }

        if let StageState::Closed(reason) = &self.state {
            return Err(DownmixError::StageClosed(reason.clone()));
        }

        if !self.binding.is_open() {
            if let Err(err) = self.binding.open(self.store.config()) {
                warn!("opening mix engine failed: {}", err);
                self.state = StageState::Closed(err.to_string());
                return Err(err);
            }
            self.state = StageState::Running;
        }

        let channels = self.store.config().stream_channels;
        let status = match self
            .reader
            .read_cycle(&mut self.base, &mut self.newcome, channels)
        {
            ReadCycle::Ready(status) => status,
            ReadCycle::Starved {
                secondary_exhausted,
            } => {
                if secondary_exhausted {
                    self.force_off_after_exhaustion();
                }
                debug!("no input available, skipping cycle");
                return Ok(CycleOutcome::Skip(SkipReason::Starved));
            }
            ReadCycle::End => {
                self.finish();
                return Ok(CycleOutcome::End);
            }
        };

        if status.secondary_exhausted {
            self.force_off_after_exhaustion();
        }
        let play_status = self.store.config().play_status;

        let (base, newcome) = self.reader.chunks();
        let produced = match self
            .binding
            .process(base, newcome, play_status, &mut self.mixed)
        {
            Ok(produced) => produced.min(self.mixed.len()),
            Err(err) => {
                warn!("mix engine failed, reopening next cycle: {}", err);
                self.gate.mark_dirty();
                return Err(err);
            }
        };
        let samples = self.sink.write(&self.mixed[..produced])?;

        debug!(
            "mixed {} samples status={:?} base_silent={} newcome_silent={}",
            samples, play_status, status.base_silent, status.newcome_silent
        );
        Ok(CycleOutcome::Mixed(MixReport {
            samples,
            output_channels: self.binding.output_channels().unwrap_or(channels[0]),
            base_silent: status.base_silent,
            newcome_silent: status.newcome_silent,
            secondary_exhausted: status.secondary_exhausted,
            play_status,
        }))
    }

    /// Applied straight to the stored config so no reopen follows.
    fn force_off_after_exhaustion(&mut self) {
        if self.store.force_play_status(PlayStatus::Off) {
            warn!("newcome stream exhausted, play status forced off");
        }
    }

    fn finish(&mut self) {
        self.binding.close();
        self.state = StageState::Finished;
        info!("base and newcome streams ended");
        #[cfg(feature = "debug")]
        self.counters.log();
    }
}
