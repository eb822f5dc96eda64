//! Settings files bundling the mix config with stage runtime options.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::constants::DEFAULT_FRAME_BUDGET;
use crate::error::DownmixError;

use super::DownmixConfig;

/// Runtime options of the stage that are not part of the engine config.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StageSettings {
    /// Frames pulled from each stream per cycle.
    pub frame_budget: usize,
    /// Initial wait budget for the newcome stream, in milliseconds.
    pub secondary_timeout_ms: u64,
}

impl Default for StageSettings {
    fn default() -> Self {
        Self {
            frame_budget: DEFAULT_FRAME_BUDGET,
            secondary_timeout_ms: 0,
        }
    }
}

impl StageSettings {
    pub fn secondary_timeout(&self) -> Duration {
        Duration::from_millis(self.secondary_timeout_ms)
    }

    pub fn validate(&self) -> Result<(), DownmixError> {
        if self.frame_budget == 0 {
            return Err(DownmixError::invalid("frame budget must be greater than zero"));
        }
        Ok(())
    }
}

/// Top-level settings file layout.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DownmixSettings {
    pub downmix: DownmixConfig,
    pub stage: StageSettings,
}

impl DownmixSettings {
    /// Parse and validate settings from a JSON string.
    pub fn from_json_str(json: &str) -> Result<Self, DownmixError> {
        let settings: DownmixSettings = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Read, parse and validate a JSON settings file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, DownmixError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    pub fn to_json_pretty(&self) -> Result<String, DownmixError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<(), DownmixError> {
        self.downmix.validate()?;
        self.stage.validate()
    }
}
