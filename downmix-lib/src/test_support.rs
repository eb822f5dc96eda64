//! Scripted sources and a recording engine for stage tests.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::config::PlayStatus;
use crate::engine::{EngineConfig, GainState, MixEngine, MixEngineFactory};
use crate::error::DownmixError;
use crate::stream::{BaseRead, BaseSource, NewcomeRead, NewcomeSource};

#[derive(Debug, Clone, Copy)]
pub(crate) enum BaseStep {
    Full(f32),
    Partial(usize, f32),
    Empty,
    End,
}

pub(crate) struct ScriptedBase {
    steps: VecDeque<BaseStep>,
    when_empty: BaseStep,
    reads: Arc<Mutex<usize>>,
}

impl ScriptedBase {
    pub(crate) fn new(steps: Vec<BaseStep>, when_empty: BaseStep) -> Self {
        Self {
            steps: steps.into(),
            when_empty,
            reads: Arc::new(Mutex::new(0)),
        }
    }

    /// A base stream that never runs dry.
    pub(crate) fn endless(value: f32) -> Self {
        Self::new(Vec::new(), BaseStep::Full(value))
    }

    pub(crate) fn reads(&self) -> Arc<Mutex<usize>> {
        self.reads.clone()
    }
}

impl BaseSource for ScriptedBase {
    fn read(&mut self, buf: &mut [f32]) -> BaseRead {
        *self.reads.lock().unwrap() += 1;
        match self.steps.pop_front().unwrap_or(self.when_empty) {
            BaseStep::Full(value) => {
                buf.fill(value);
                BaseRead::Data(buf.len())
            }
            BaseStep::Partial(count, value) => {
                let count = count.min(buf.len());
                buf[..count].fill(value);
                BaseRead::Data(count)
            }
            BaseStep::Empty => BaseRead::Data(0),
            BaseStep::End => BaseRead::End,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub(crate) enum NewcomeStep {
    Full(f32),
    Partial(usize, f32),
    Timeout,
    End,
    Fail,
}

pub(crate) struct ScriptedNewcome {
    steps: VecDeque<NewcomeStep>,
    when_empty: NewcomeStep,
    timeouts: Arc<Mutex<Vec<Duration>>>,
}

impl ScriptedNewcome {
    pub(crate) fn new(steps: Vec<NewcomeStep>, when_empty: NewcomeStep) -> Self {
        Self {
            steps: steps.into(),
            when_empty,
            timeouts: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub(crate) fn endless(value: f32) -> Self {
        Self::new(Vec::new(), NewcomeStep::Full(value))
    }

    /// Timeouts the stage passed to each read, in order.
    pub(crate) fn timeouts(&self) -> Arc<Mutex<Vec<Duration>>> {
        self.timeouts.clone()
    }
}

impl NewcomeSource for ScriptedNewcome {
    fn read_timeout(&mut self, buf: &mut [f32], timeout: Duration) -> NewcomeRead {
        self.timeouts.lock().unwrap().push(timeout);
        match self.steps.pop_front().unwrap_or(self.when_empty) {
            NewcomeStep::Full(value) => {
                buf.fill(value);
                NewcomeRead::Data(buf.len())
            }
            NewcomeStep::Partial(count, value) => {
                let count = count.min(buf.len());
                buf[..count].fill(value);
                NewcomeRead::Data(count)
            }
            NewcomeStep::Timeout => NewcomeRead::Timeout,
            NewcomeStep::End => NewcomeRead::End,
            NewcomeStep::Fail => NewcomeRead::Failed("scripted failure".to_string()),
        }
    }
}

/// One `process` call seen by a recording engine.
#[derive(Debug, Clone)]
pub(crate) struct ProcessCall {
    pub(crate) engine_id: usize,
    pub(crate) base: Vec<f32>,
    pub(crate) newcome: Vec<f32>,
    pub(crate) status: PlayStatus,
}

#[derive(Debug, Default)]
pub(crate) struct EngineLog {
    pub(crate) opens: Vec<EngineConfig>,
    pub(crate) closes: usize,
    pub(crate) calls: Vec<ProcessCall>,
}

/// Factory whose engines copy the base chunk through and log every call.
#[derive(Clone, Default)]
pub(crate) struct RecordingFactory {
    log: Arc<Mutex<EngineLog>>,
    fail_open: Arc<Mutex<Option<DownmixError>>>,
    fail_process: Arc<Mutex<bool>>,
}

impl RecordingFactory {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn log(&self) -> Arc<Mutex<EngineLog>> {
        self.log.clone()
    }

    pub(crate) fn fail_next_open(&self, err: DownmixError) {
        *self.fail_open.lock().unwrap() = Some(err);
    }

    pub(crate) fn fail_next_process(&self) {
        *self.fail_process.lock().unwrap() = true;
    }
}

impl MixEngineFactory for RecordingFactory {
    fn open(&mut self, config: &EngineConfig) -> Result<Box<dyn MixEngine>, DownmixError> {
        if let Some(err) = self.fail_open.lock().unwrap().take() {
            return Err(err);
        }
        let mut log = self.log.lock().unwrap();
        log.opens.push(config.clone());
        Ok(Box::new(RecordingEngine {
            id: log.opens.len() - 1,
            channels: config.channels[0],
            log: self.log.clone(),
            fail_process: self.fail_process.clone(),
        }))
    }
}

struct RecordingEngine {
    id: usize,
    channels: u8,
    log: Arc<Mutex<EngineLog>>,
    fail_process: Arc<Mutex<bool>>,
}

impl MixEngine for RecordingEngine {
    fn process(
        &mut self,
        base: &[f32],
        newcome: &[f32],
        status: PlayStatus,
        out: &mut Vec<f32>,
    ) -> Result<usize, DownmixError> {
        if std::mem::take(&mut *self.fail_process.lock().unwrap()) {
            return Err(DownmixError::EngineProcess("scripted failure".to_string()));
        }
        self.log.lock().unwrap().calls.push(ProcessCall {
            engine_id: self.id,
            base: base.to_vec(),
            newcome: newcome.to_vec(),
            status,
        });
        out.clear();
        out.extend_from_slice(base);
        Ok(out.len())
    }

    fn output_channels(&self) -> u8 {
        self.channels
    }

    fn gain_state(&self) -> Option<GainState> {
        Some(GainState {
            base: 1.0,
            newcome: 0.0,
        })
    }
}

impl Drop for RecordingEngine {
    fn drop(&mut self) {
        self.log.lock().unwrap().closes += 1;
    }
}
