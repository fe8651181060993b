//! # sensum-signals
//!
//! Estimators over timestamped sample streams.
//!
//! This crate provides:
//! - **Doppler velocity**: FFT shift of an emitted reference tone
//! - **Periodicity**: autocorrelation rotational-speed detection
//! - **Beat rate**: peak-interval estimation on an intensity channel
//!
//! Every estimator implements [`sensum_core::BlockEstimator`] and plugs
//! into the `sensum-core` supervisor unchanged; [`build_estimator`]
//! selects one from an [`EngineConfig`].
//!
//! ## Example
//!
//! ```ignore
//! use sensum_core::config::EngineConfig;
//! use sensum_signals::build_estimator;
//!
//! let cfg = EngineConfig::from_file("sensum.toml")?;
//! let estimator = build_estimator(&cfg)?;
//! supervisor.start(estimator, &mut source, sink)?;
//! ```

pub mod beat;
pub mod doppler;
pub mod dsp;
pub mod motion;
pub mod periodicity;
pub mod spectral;
pub mod tone;

pub mod tests_pipeline;

pub use beat::{BeatEstimator, BeatPhase, CycleRecord};
pub use doppler::DopplerEstimator;
pub use motion::GravityFilter;
pub use periodicity::PeriodicityEstimator;
pub use tone::ToneGenerator;

use sensum_core::config::{EngineConfig, EstimatorKind};
use sensum_core::error::ConfigError;
use sensum_core::estimator::BlockEstimator;

/// Instantiate the estimator the configuration selects.
pub fn build_estimator(cfg: &EngineConfig) -> Result<Box<dyn BlockEstimator>, ConfigError> {
    let estimator: Box<dyn BlockEstimator> = match cfg.mode {
        EstimatorKind::Doppler => Box::new(DopplerEstimator::new(cfg.doppler.clone())?),
        EstimatorKind::Periodicity => Box::new(PeriodicityEstimator::new(cfg.periodicity.clone())?),
        EstimatorKind::Beat => Box::new(BeatEstimator::new(cfg.beat.clone())?),
    };
    Ok(estimator)
}
