//! Ownership of the live mix engine instance.

use log::{debug, info};

use crate::config::gain::linear_to_db;
use crate::config::{DownmixConfig, PlayStatus};
use crate::error::DownmixError;

use super::{EngineConfig, GainState, MixEngine, MixEngineFactory};

/// Holds the engine factory and at most one open engine.
///
/// Closing an engine remembers its gain state so the next open resumes the
/// crossfade where the previous instance stopped.
pub struct MixEngineBinding {
    factory: Box<dyn MixEngineFactory>,
    engine: Option<Box<dyn MixEngine>>,
    resume: Option<GainState>,
}

impl std::fmt::Debug for MixEngineBinding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MixEngineBinding")
            .field("open", &self.engine.is_some())
            .field("resume", &self.resume)
            .finish()
    }
}

impl MixEngineBinding {
    pub fn new(factory: impl MixEngineFactory + 'static) -> Self {
        Self::from_boxed(Box::new(factory))
    }

    pub fn from_boxed(factory: Box<dyn MixEngineFactory>) -> Self {
        Self {
            factory,
            engine: None,
            resume: None,
        }
    }

    pub fn is_open(&self) -> bool {
        self.engine.is_some()
    }

    /// Open an engine for `config`. Any engine still open is closed first.
    pub fn open(&mut self, config: &DownmixConfig) -> Result<(), DownmixError> {
        self.close();
        let engine_config = EngineConfig::from_config(config, self.resume);
        let engine = self.factory.open(&engine_config).map_err(|err| match err {
            DownmixError::EngineOpen(_) => err,
            other => DownmixError::EngineOpen(other.to_string()),
        })?;
        if let Some(resume) = self.resume {
            debug!(
                "resuming gains: base={:.1}dB newcome={:.1}dB",
                linear_to_db(resume.base),
                linear_to_db(resume.newcome)
            );
        }
        info!(
            "mix engine opened: rate={} channels={:?} status={:?} routing={:?}",
            engine_config.sample_rate,
            engine_config.channels,
            config.play_status,
            engine_config.output_routing
        );
        self.engine = Some(engine);
        Ok(())
    }

    /// Drop the open engine, if any.
    pub fn close(&mut self) {
        if let Some(engine) = self.engine.take() {
            if let Some(state) = engine.gain_state() {
                self.resume = Some(state);
            }
            drop(engine);
            info!("mix engine closed");
        }
    }

    /// Mix one chunk pair through the open engine.
    pub fn process(
        &mut self,
        base: &[f32],
        newcome: &[f32],
        status: PlayStatus,
        out: &mut Vec<f32>,
    ) -> Result<usize, DownmixError> {
        let engine = self
            .engine
            .as_mut()
            .ok_or_else(|| DownmixError::StageClosed("mix engine is not open".to_string()))?;
        engine.process(base, newcome, status, out)
    }

    pub fn output_channels(&self) -> Option<u8> {
        self.engine.as_ref().map(|engine| engine.output_channels())
    }
}
