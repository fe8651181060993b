//! Core vocabulary: samples, estimation results, and per-tick outcomes.
//!
//! Everything the capture side, the estimators, and the result consumers
//! exchange is defined here as small immutable value types.

use serde::{Deserialize, Serialize};

/// One timestamped measurement delivered by a sample source.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    /// Monotonic timestamp in microseconds.
    pub ts_us: i64,
    pub value: SampleValue,
}

impl Sample {
    pub fn scalar(ts_us: i64, value: f32) -> Self {
        Sample {
            ts_us,
            value: SampleValue::Scalar(value),
        }
    }

    pub fn vector3(ts_us: i64, value: [f32; 3]) -> Self {
        Sample {
            ts_us,
            value: SampleValue::Vector3(value),
        }
    }

    /// Scalar view of the sample: the value itself, or the Euclidean
    /// magnitude for vector samples.
    pub fn intensity(&self) -> f32 {
        match self.value {
            SampleValue::Scalar(v) => v,
            SampleValue::Vector3([x, y, z]) => (x * x + y * y + z * z).sqrt(),
        }
    }
}

/// Sample payload. Structural equality holds for both variants, so raw
/// buffers compare by content rather than identity.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum SampleValue {
    Scalar(f32),
    Vector3([f32; 3]),
}

/// Motion direction classified by the Doppler estimator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    Approaching,
    Receding,
    Stationary,
}

/// One published measurement snapshot.
///
/// A result is only produced when enough evidence exists; the absence of a
/// measurement is a [`TickOutcome::Withheld`], never a zero-valued result.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EstimationResult {
    /// The estimated physical quantity (m/s, RPM, or BPM).
    pub value: f64,
    /// Consistency of the evidence behind the estimate, 0..1.
    pub confidence: f32,
    /// Set by estimators that classify motion direction.
    pub direction: Option<Direction>,
    /// Timestamp of the newest sample the estimate is based on.
    pub ts_us: i64,
}

/// Why a tick produced no measurement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WithholdReason {
    /// Not enough samples accumulated yet.
    InsufficientData,
    /// The expected signal is absent (silence, no tone, no contact).
    NoSignal,
    /// Zero-energy block or a near-zero normalization term.
    NumericDegenerate,
    /// The computed value fell outside the plausible range.
    OutOfRange,
}

impl std::fmt::Display for WithholdReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            WithholdReason::InsufficientData => "insufficient data",
            WithholdReason::NoSignal => "no signal",
            WithholdReason::NumericDegenerate => "numerically degenerate block",
            WithholdReason::OutOfRange => "value out of plausible range",
        };
        f.write_str(s)
    }
}

/// Outcome of one analysis tick: a measurement or an explicit withholding.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum TickOutcome {
    Estimate(EstimationResult),
    Withheld {
        reason: WithholdReason,
        ts_us: i64,
    },
}

impl TickOutcome {
    pub fn withheld(reason: WithholdReason, ts_us: i64) -> Self {
        TickOutcome::Withheld { reason, ts_us }
    }

    pub fn is_withheld(&self) -> bool {
        matches!(self, TickOutcome::Withheld { .. })
    }

    /// Timestamp the outcome refers to.
    pub fn ts_us(&self) -> i64 {
        match self {
            TickOutcome::Estimate(r) => r.ts_us,
            TickOutcome::Withheld { ts_us, .. } => *ts_us,
        }
    }
}

/// Time delta between two microsecond timestamps, in seconds.
pub fn dt_sec(now_us: i64, then_us: i64) -> f32 {
    ((now_us - then_us) as f64 / 1_000_000.0) as f32
}

/// Time delta between two microsecond timestamps, in milliseconds.
pub fn dt_ms(now_us: i64, then_us: i64) -> f64 {
    (now_us - then_us) as f64 / 1_000.0
}
