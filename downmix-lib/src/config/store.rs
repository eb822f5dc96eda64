//! Validating setters over a [`DownmixConfig`].

use log::debug;

use crate::constants::GAIN_EPSILON_DB;
use crate::error::DownmixError;

use super::{
    validate_channels, validate_gains, validate_rate, validate_rate_pair, ChannelSelect,
    DownmixConfig, OutputRouting, PlayStatus, StreamRole,
};

/// Owner of the stage configuration.
///
/// Every setter validates first and leaves the stored config untouched on
/// failure. `Ok(true)` means the stored value changed, `Ok(false)` means the
/// call was redundant.
#[derive(Debug, Clone, Default)]
pub struct ParameterStore {
    config: DownmixConfig,
}

impl ParameterStore {
    /// Wrap an already validated configuration.
    pub fn new(config: DownmixConfig) -> Result<Self, DownmixError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &DownmixConfig {
        &self.config
    }

    /// Update rate and channel count of one stream.
    pub fn set_stream_info(
        &mut self,
        role: StreamRole,
        rate: u32,
        channels: u8,
    ) -> Result<bool, DownmixError> {
        validate_rate(rate)?;
        let other_rate = self.config.rate(role.other());
        match role {
            StreamRole::Base => validate_rate_pair(rate, other_rate)?,
            StreamRole::Newcome => validate_rate_pair(other_rate, rate)?,
        }
        validate_channels(channels)?;

        let index = role.index();
        if self.config.stream_rate[index] == rate && self.config.stream_channels[index] == channels
        {
            return Ok(false);
        }
        self.config.stream_rate[index] = rate;
        self.config.stream_channels[index] = channels;
        debug!("stream info: role={:?} rate={} channels={}", role, rate, channels);
        Ok(true)
    }

    /// Update both streams at once, which is the only way to move the shared rate.
    pub fn set_stream_info_pair(
        &mut self,
        base_rate: u32,
        base_channels: u8,
        newcome_rate: u32,
        newcome_channels: u8,
    ) -> Result<bool, DownmixError> {
        validate_rate(base_rate)?;
        validate_rate(newcome_rate)?;
        validate_rate_pair(base_rate, newcome_rate)?;
        validate_channels(base_channels)?;
        validate_channels(newcome_channels)?;

        let rates = [base_rate, newcome_rate];
        let channels = [base_channels, newcome_channels];
        if self.config.stream_rate == rates && self.config.stream_channels == channels {
            return Ok(false);
        }
        self.config.stream_rate = rates;
        self.config.stream_channels = channels;
        debug!("stream info: rates={:?} channels={:?}", rates, channels);
        Ok(true)
    }

    /// Update the four dB gains.
    pub fn set_gain(&mut self, gains: [f32; 4]) -> Result<bool, DownmixError> {
        validate_gains(&gains)?;
        let unchanged = self
            .config
            .gain
            .iter()
            .zip(gains.iter())
            .all(|(current, next)| (current - next).abs() <= GAIN_EPSILON_DB);
        if unchanged {
            return Ok(false);
        }
        self.config.gain = gains;
        debug!("gain: {:?}", gains);
        Ok(true)
    }

    /// Update the base/newcome crossfade lengths in milliseconds.
    pub fn set_transition_times(&mut self, transition_ms: [u32; 2]) -> Result<bool, DownmixError> {
        if self.config.transition_ms == transition_ms {
            return Ok(false);
        }
        self.config.transition_ms = transition_ms;
        debug!("transition times: {:?} ms", transition_ms);
        Ok(true)
    }

    pub fn set_play_status(&mut self, status: PlayStatus) -> Result<bool, DownmixError> {
        if self.config.play_status == status {
            return Ok(false);
        }
        self.config.play_status = status;
        debug!("play status: {:?}", status);
        Ok(true)
    }

    pub fn set_output_status(&mut self, routing: OutputRouting) -> Result<bool, DownmixError> {
        if self.config.output_status == routing {
            return Ok(false);
        }
        self.config.output_status = routing;
        debug!("output routing: {:?}", routing);
        Ok(true)
    }

    pub fn set_dual_mono_select(&mut self, select: ChannelSelect) -> Result<bool, DownmixError> {
        if self.config.dual_mono_select == select {
            return Ok(false);
        }
        self.config.dual_mono_select = select;
        debug!("dual mono select: {:?}", select);
        Ok(true)
    }

    /// Swap in a whole configuration after validating it.
    pub fn replace(&mut self, config: DownmixConfig) -> Result<bool, DownmixError> {
        config.validate()?;
        if self.config == config {
            return Ok(false);
        }
        self.config = config;
        Ok(true)
    }

    /// Force the play status without going through the public setter path.
    pub(crate) fn force_play_status(&mut self, status: PlayStatus) -> bool {
        let changed = self.config.play_status != status;
        self.config.play_status = status;
        changed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::{GAIN_MAX, GAIN_MIN, SAMPLE_RATE_MAX};
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn store() -> ParameterStore {
        ParameterStore::new(DownmixConfig::default()).expect("store")
    }

    fn random_config(rng: &mut StdRng) -> DownmixConfig {
        let rate = [8_000, 16_000, 22_050, 44_100, 48_000, 96_000][rng.gen_range(0..6)];
        DownmixConfig {
            stream_rate: [rate, rate],
            stream_channels: [rng.gen_range(1..=2), rng.gen_range(1..=2)],
            gain: [
                rng.gen_range(GAIN_MIN..=GAIN_MAX),
                rng.gen_range(GAIN_MIN..=GAIN_MAX),
                rng.gen_range(GAIN_MIN..=GAIN_MAX),
                rng.gen_range(GAIN_MIN..=GAIN_MAX),
            ],
            transition_ms: [rng.gen_range(0..2_000), rng.gen_range(0..2_000)],
            play_status: PlayStatus::try_from(rng.gen_range(0..3u8)).unwrap(),
            output_status: OutputRouting::try_from(rng.gen_range(0..3u8)).unwrap(),
            dual_mono_select: ChannelSelect::try_from(rng.gen_range(0..2u8)).unwrap(),
        }
    }

    #[test]
    fn redundant_setters_report_no_change() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..64 {
            let config = random_config(&mut rng);
            let mut store = ParameterStore::new(config.clone()).expect("store");
            let base = StreamRole::Base;
            let newcome = StreamRole::Newcome;
            assert!(!store
                .set_stream_info(base, config.rate(base), config.channels(base))
                .unwrap());
            assert!(!store
                .set_stream_info(newcome, config.rate(newcome), config.channels(newcome))
                .unwrap());
            assert!(!store.set_gain(config.gain).unwrap());
            assert!(!store.set_transition_times(config.transition_ms).unwrap());
            assert!(!store.set_play_status(config.play_status).unwrap());
            assert!(!store.set_output_status(config.output_status).unwrap());
            assert!(!store.set_dual_mono_select(config.dual_mono_select).unwrap());
            assert!(!store.replace(config.clone()).unwrap());
            assert_eq!(store.config(), &config);
        }
    }

    #[test]
    fn gain_within_epsilon_is_unchanged() {
        let mut store = store();
        assert!(!store.set_gain([0.01, -0.02, 0.04, 0.0]).unwrap());
        assert_eq!(store.config().gain, [0.0; 4]);
        assert!(store.set_gain([0.0, -6.0, -40.0, 0.0]).unwrap());
        assert_eq!(store.config().gain, [0.0, -6.0, -40.0, 0.0]);
    }

    #[test]
    fn rejected_values_leave_config_untouched() {
        let mut store = store();
        let before = store.config().clone();

        assert!(store
            .set_stream_info(StreamRole::Base, SAMPLE_RATE_MAX, 1)
            .is_err());
        assert!(store.set_stream_info(StreamRole::Base, 0, 1).is_err());
        assert!(store
            .set_stream_info(StreamRole::Newcome, 48_000, 2)
            .is_err());
        assert!(store.set_stream_info(StreamRole::Base, 44_100, 3).is_err());
        assert!(store.set_stream_info(StreamRole::Newcome, 44_100, 0).is_err());
        assert!(store
            .set_stream_info_pair(44_100, 1, 48_000, 2)
            .is_err());
        assert!(store.set_gain([0.0, 0.0, GAIN_MIN - 0.5, 0.0]).is_err());
        assert!(store.set_gain([GAIN_MAX + 0.5, 0.0, 0.0, 0.0]).is_err());
        assert!(store.set_gain([0.0, f32::INFINITY, 0.0, 0.0]).is_err());

        let mut bad = before.clone();
        bad.stream_channels = [1, 4];
        assert!(store.replace(bad).is_err());

        assert_eq!(store.config(), &before);
    }

    #[test]
    fn stream_info_pair_moves_the_shared_rate() {
        let mut store = store();
        assert!(store.set_stream_info_pair(48_000, 2, 48_000, 1).unwrap());
        assert_eq!(store.config().stream_rate, [48_000, 48_000]);
        assert_eq!(store.config().stream_channels, [2, 1]);
        assert!(store.set_stream_info(StreamRole::Newcome, 48_000, 2).unwrap());
        assert_eq!(store.config().stream_channels, [2, 2]);
    }

    #[test]
    fn enum_setters_detect_changes() {
        let mut store = store();
        assert!(store.set_play_status(PlayStatus::On).unwrap());
        assert!(store.set_output_status(OutputRouting::NewcomeOnly).unwrap());
        assert!(store.set_dual_mono_select(ChannelSelect::Right).unwrap());
        assert!(store.set_transition_times([10, 20]).unwrap());
        assert_eq!(store.config().play_status, PlayStatus::On);
        assert_eq!(store.config().output_status, OutputRouting::NewcomeOnly);
        assert_eq!(store.config().dual_mono_select, ChannelSelect::Right);
        assert_eq!(store.config().transition_ms, [10, 20]);
    }

    #[test]
    fn forced_status_reports_change_once() {
        let mut store = store();
        assert!(store.force_play_status(PlayStatus::Off));
        assert!(!store.force_play_status(PlayStatus::Off));
        assert_eq!(store.config().play_status, PlayStatus::Off);
    }
}
