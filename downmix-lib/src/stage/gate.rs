//! Deferred engine reconfiguration.

use log::info;

use crate::config::DownmixConfig;
use crate::engine::MixEngineBinding;
use crate::error::DownmixError;

/// Dirty flag plus the close/validate/reopen sequence it guards.
#[derive(Debug, Default)]
pub(crate) struct ReconfigGate {
    dirty: bool,
}

impl ReconfigGate {
    pub(crate) fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub(crate) fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Replace the live engine with one built from `config`.
    ///
    /// The flag is cleared whatever the outcome. On error the binding is left
    /// closed.
    pub(crate) fn reconfigure(
        &mut self,
        config: &DownmixConfig,
        binding: &mut MixEngineBinding,
    ) -> Result<(), DownmixError> {
        self.dirty = false;
        binding.close();
        config.validate()?;
        binding.open(config)?;
        info!("mix engine reopened with updated configuration");
        Ok(())
    }
}
