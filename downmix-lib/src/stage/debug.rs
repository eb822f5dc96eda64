//! Per-cycle counters, compiled in with the `debug` feature.

use log::info;

use super::types::{CycleOutcome, SkipReason};

#[derive(Debug, Default, Clone, Copy)]
pub(super) struct CycleCounters {
    cycles: u64,
    reopens: u64,
    starved: u64,
    base_silent: u64,
    newcome_silent: u64,
}

impl CycleCounters {
    pub(super) fn record(&mut self, outcome: &CycleOutcome) {
        self.cycles += 1;
        match outcome {
            CycleOutcome::Mixed(report) => {
                self.base_silent += report.base_silent as u64;
                self.newcome_silent += report.newcome_silent as u64;
            }
            CycleOutcome::Skip(SkipReason::Reconfigured) => self.reopens += 1,
            CycleOutcome::Skip(SkipReason::Starved) => self.starved += 1,
            CycleOutcome::End => {}
        }
    }

    pub(super) fn log(&self) {
        info!(
            "stage cycles={} reopens={} starved={} base_silent={} newcome_silent={}",
            self.cycles, self.reopens, self.starved, self.base_silent, self.newcome_silent
        );
    }
}
