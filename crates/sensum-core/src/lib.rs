//! # sensum-core
//!
//! Streaming sample ingestion, windowing, and estimator supervision.
//!
//! This crate provides:
//! - **Domain types**: timestamped samples, estimation results, and explicit
//!   withheld-tick outcomes
//! - **Sample window**: duration- and capacity-bounded buffer with
//!   resynchronization on timestamp regressions
//! - **Supervisor**: start/stop/reset lifecycle, capture-thread ingestion,
//!   and a single compute worker fed through a keep-latest handoff slot
//!
//! Estimation algorithms implement [`BlockEstimator`] (see `sensum-signals`
//! for the spectral, autocorrelation, and peak-interval implementations).
//!
//! ## Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use sensum_core::{ChannelSink, Supervisor, SupervisorConfig};
//!
//! let mut supervisor = Supervisor::new(SupervisorConfig::default());
//! let (tx, rx) = crossbeam_channel::unbounded();
//! supervisor.start(estimator, &mut source, Arc::new(ChannelSink::new(tx)))?;
//! for outcome in rx.iter() {
//!     println!("{outcome:?}");
//! }
//! supervisor.stop();
//! ```

pub mod config;
pub mod domain;
pub mod error;
pub mod estimator;
pub mod sim;
pub mod sink;
pub mod source;
pub mod supervisor;
pub mod window;

pub mod tests_supervisor;

pub use config::{
    BeatConfig, DopplerConfig, EngineConfig, EstimatorKind, PeriodicityConfig, SupervisorConfig,
};
pub use domain::{
    dt_ms, dt_sec, Direction, EstimationResult, Sample, SampleValue, TickOutcome, WithholdReason,
};
pub use error::{ConfigError, SourceError, StartError};
pub use estimator::BlockEstimator;
pub use sink::{ChannelSink, ResultSink};
pub use source::{SampleCallback, SampleSource, Subscription};
pub use supervisor::Supervisor;
pub use window::SampleWindow;
