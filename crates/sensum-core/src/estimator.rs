//! The contract between the supervisor and an estimation algorithm.

use crate::domain::{Sample, TickOutcome};

/// One estimation algorithm driven by the supervisor.
///
/// `analyze` receives the current window snapshot (oldest first, timestamps
/// non-decreasing) and must return exactly one outcome per call. It runs on
/// the compute worker, never on the capture thread, so a slow pass degrades
/// latency but not ingestion. Implementations recover from numeric trouble
/// locally and withhold instead of failing.
pub trait BlockEstimator: Send {
    fn analyze(&mut self, block: &[Sample]) -> TickOutcome;

    /// Clear every per-run accumulator (peak lists, histories, baselines).
    /// Called on `reset()` and implicitly discarded on `stop()`.
    fn reset(&mut self);
}
