//! Estimator and supervisor configuration.
//!
//! Each estimator gets one immutable config struct whose defaults carry the
//! field-proven constants of the original tools. The ±0.15 m/s deadband in
//! [`DopplerConfig`] is an empirically chosen tunable, not derived physics;
//! change it in config, not in code.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::error::ConfigError;

/// Which estimator a measurement run drives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EstimatorKind {
    Doppler,
    Periodicity,
    Beat,
}

/// Top-level engine configuration, loadable from TOML.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    pub mode: EstimatorKind,
    pub supervisor: SupervisorConfig,
    pub doppler: DopplerConfig,
    pub periodicity: PeriodicityConfig,
    pub beat: BeatConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            mode: EstimatorKind::Doppler,
            supervisor: SupervisorConfig::default(),
            doppler: DopplerConfig::default(),
            periodicity: PeriodicityConfig::default(),
            beat: BeatConfig::default(),
        }
    }
}

impl EngineConfig {
    /// Load configuration from a TOML file and validate it.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: EngineConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.supervisor.validate()?;
        self.doppler.validate()?;
        self.periodicity.validate()?;
        self.beat.validate()?;
        Ok(())
    }
}

/// Windowing and tick policy for the supervisor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SupervisorConfig {
    /// Sample window duration in milliseconds.
    pub window_ms: u64,
    /// Hard cap on retained samples, independent of duration.
    pub capacity: usize,
    /// Dispatch one analysis tick per this many newly ingested samples.
    pub tick_samples: usize,
}

impl Default for SupervisorConfig {
    fn default() -> Self {
        Self {
            window_ms: 12_000,
            capacity: 1 << 16,
            tick_samples: 2_048,
        }
    }
}

impl SupervisorConfig {
    pub fn window_us(&self) -> i64 {
        self.window_ms as i64 * 1_000
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.window_ms == 0 {
            return Err(ConfigError::Validation(
                "supervisor.window_ms must be positive".into(),
            ));
        }
        if self.capacity == 0 {
            return Err(ConfigError::Validation(
                "supervisor.capacity must be positive".into(),
            ));
        }
        if self.tick_samples == 0 || self.tick_samples > self.capacity {
            return Err(ConfigError::Validation(
                "supervisor.tick_samples must be in 1..=capacity".into(),
            ));
        }
        Ok(())
    }
}

/// Doppler shift estimation around an emitted reference tone.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DopplerConfig {
    /// Audio sample rate in Hz.
    pub sample_rate: f32,
    /// Emitted reference tone frequency in Hz (near-ultrasonic).
    pub emit_freq: f32,
    /// Speed of sound in m/s.
    pub speed_of_sound: f32,
    /// Peak search half-width around the emitted tone, in Hz.
    pub search_halfwidth_hz: f32,
    /// |velocity| below this reads as stationary; suppresses direction
    /// flicker from measurement noise.
    pub deadband_mps: f32,
    /// Smallest analysis block; shorter blocks withhold.
    pub min_block: usize,
    /// Fraction of total spectral energy the tone peak must carry. Below
    /// this the tone is considered absent and the tick withholds.
    pub min_peak_fraction: f32,
}

impl Default for DopplerConfig {
    fn default() -> Self {
        Self {
            sample_rate: 44_100.0,
            emit_freq: 18_000.0,
            speed_of_sound: 343.0,
            search_halfwidth_hz: 500.0,
            deadband_mps: 0.15,
            min_block: 1_024,
            min_peak_fraction: 0.1,
        }
    }
}

impl DopplerConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.sample_rate <= 0.0 {
            return Err(ConfigError::Validation(
                "doppler.sample_rate must be positive".into(),
            ));
        }
        if self.emit_freq <= 0.0 || self.emit_freq >= self.sample_rate / 2.0 {
            return Err(ConfigError::Validation(
                "doppler.emit_freq must lie below the Nyquist frequency".into(),
            ));
        }
        if self.search_halfwidth_hz <= 0.0 || self.search_halfwidth_hz >= self.emit_freq {
            return Err(ConfigError::Validation(
                "doppler.search_halfwidth_hz must be in (0, emit_freq)".into(),
            ));
        }
        if self.min_block < 2 || !self.min_block.is_power_of_two() {
            return Err(ConfigError::Validation(
                "doppler.min_block must be a power of two >= 2".into(),
            ));
        }
        if !(0.0..=1.0).contains(&self.min_peak_fraction) {
            return Err(ConfigError::Validation(
                "doppler.min_peak_fraction must be in [0, 1]".into(),
            ));
        }
        Ok(())
    }
}

/// Autocorrelation periodicity detection (rotational speed).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PeriodicityConfig {
    /// Audio sample rate in Hz.
    pub sample_rate: f32,
    /// Lowest detectable fundamental, in Hz.
    pub min_freq: f32,
    /// Highest detectable fundamental, in Hz.
    pub max_freq: f32,
    /// Normalized correlation a lag must exceed to be accepted.
    pub corr_threshold: f64,
    /// Samples analyzed per tick (most recent). Bounds the O(lags x block)
    /// correlation search.
    pub block_size: usize,
    /// Minimum samples before a result is attempted.
    pub min_block: usize,
}

impl Default for PeriodicityConfig {
    fn default() -> Self {
        Self {
            sample_rate: 44_100.0,
            min_freq: 20.0,
            max_freq: 2_000.0,
            corr_threshold: 0.4,
            block_size: 4_096,
            min_block: 2_048,
        }
    }
}

impl PeriodicityConfig {
    pub fn min_lag(&self) -> usize {
        ((self.sample_rate / self.max_freq) as usize).max(1)
    }

    pub fn max_lag(&self) -> usize {
        (self.sample_rate / self.min_freq) as usize
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.sample_rate <= 0.0 {
            return Err(ConfigError::Validation(
                "periodicity.sample_rate must be positive".into(),
            ));
        }
        if self.min_freq <= 0.0 || self.min_freq >= self.max_freq {
            return Err(ConfigError::Validation(
                "periodicity requires 0 < min_freq < max_freq".into(),
            ));
        }
        if self.max_freq > self.sample_rate / 2.0 {
            return Err(ConfigError::Validation(
                "periodicity.max_freq must not exceed the Nyquist frequency".into(),
            ));
        }
        if !(0.0..1.0).contains(&self.corr_threshold) {
            return Err(ConfigError::Validation(
                "periodicity.corr_threshold must be in [0, 1)".into(),
            ));
        }
        if self.min_block < 64 || self.block_size < self.min_block {
            return Err(ConfigError::Validation(
                "periodicity requires block_size >= min_block >= 64".into(),
            ));
        }
        if self.min_lag() >= self.max_lag() {
            return Err(ConfigError::Validation(
                "periodicity frequency range collapses to an empty lag range".into(),
            ));
        }
        Ok(())
    }
}

/// Peak-interval beat estimation over a slowly sampled intensity channel.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BeatConfig {
    /// Intensity floor for the contact/covering gate; samples below it are
    /// not evidence of a signal.
    pub intensity_floor: f32,
    /// Analysis slice: only samples within this horizon feed peak detection.
    pub analysis_ms: u64,
    /// Warm-up time before any result is attempted.
    pub stabilize_ms: u64,
    /// Minimum gated samples in the analysis slice.
    pub min_samples: usize,
    /// Minimum spacing between accepted peaks; caps the rate at
    /// 60000 / refractory_ms BPM and defends against double-counting.
    pub refractory_ms: u64,
    /// Inter-beat intervals outside this range are artifacts, not data.
    pub min_ibi_ms: u64,
    pub max_ibi_ms: u64,
    /// Plausible output range; anything else withholds.
    pub min_bpm: u32,
    pub max_bpm: u32,
    /// Interval-consistency floor: results whose confidence falls below this
    /// are withheld (rejects broadband noise that fires at the refractory
    /// rate).
    pub min_confidence: f32,
    /// Measurement cycle length; one history entry per completed cycle.
    pub cycle_ms: u64,
    /// Completed-cycle history cap (most recent kept).
    pub history_len: usize,
}

impl Default for BeatConfig {
    fn default() -> Self {
        Self {
            intensity_floor: 50.0,
            analysis_ms: 6_000,
            stabilize_ms: 3_000,
            min_samples: 20,
            refractory_ms: 300,
            min_ibi_ms: 300,
            max_ibi_ms: 1_500,
            min_bpm: 40,
            max_bpm: 200,
            min_confidence: 0.8,
            cycle_ms: 10_000,
            history_len: 20,
        }
    }
}

impl BeatConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.min_ibi_ms >= self.max_ibi_ms {
            return Err(ConfigError::Validation(
                "beat requires min_ibi_ms < max_ibi_ms".into(),
            ));
        }
        if self.min_bpm >= self.max_bpm {
            return Err(ConfigError::Validation(
                "beat requires min_bpm < max_bpm".into(),
            ));
        }
        if self.refractory_ms == 0 || self.analysis_ms == 0 || self.cycle_ms == 0 {
            return Err(ConfigError::Validation(
                "beat timing parameters must be positive".into(),
            ));
        }
        if self.min_samples < 5 {
            return Err(ConfigError::Validation(
                "beat.min_samples must allow the 5-point peak test".into(),
            ));
        }
        if !(0.0..=1.0).contains(&self.min_confidence) {
            return Err(ConfigError::Validation(
                "beat.min_confidence must be in [0, 1]".into(),
            ));
        }
        if self.history_len == 0 {
            return Err(ConfigError::Validation(
                "beat.history_len must be positive".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn default_config_is_valid() {
        assert!(EngineConfig::default().validate().is_ok());
    }

    #[test]
    fn inverted_frequency_range_rejected() {
        let mut cfg = PeriodicityConfig::default();
        cfg.min_freq = 500.0;
        cfg.max_freq = 100.0;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn inverted_ibi_range_rejected() {
        let mut cfg = BeatConfig::default();
        cfg.min_ibi_ms = 2_000;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn non_power_of_two_doppler_block_rejected() {
        let mut cfg = DopplerConfig::default();
        cfg.min_block = 1_000;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn tick_larger_than_capacity_rejected() {
        let mut cfg = SupervisorConfig::default();
        cfg.tick_samples = cfg.capacity + 1;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn toml_round_trip() {
        let cfg = EngineConfig::default();
        let text = toml::to_string(&cfg).unwrap();
        let parsed = EngineConfig::from_toml_str(&text).unwrap();
        assert_eq!(parsed.mode, cfg.mode);
        assert_eq!(parsed.doppler.emit_freq, cfg.doppler.emit_freq);
    }

    #[test]
    fn load_from_file() {
        let mut f = NamedTempFile::new().unwrap();
        let text = toml::to_string(&EngineConfig::default()).unwrap();
        f.write_all(text.as_bytes()).unwrap();
        let cfg = EngineConfig::from_file(f.path()).unwrap();
        assert_eq!(cfg.beat.refractory_ms, 300);
    }

    #[test]
    fn invalid_file_contents_rejected() {
        let cfg = EngineConfig::from_toml_str("mode = \"doppler\"");
        assert!(cfg.is_err());
    }
}
