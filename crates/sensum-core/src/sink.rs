//! Result sink capability.
//!
//! Consumers (UI, logging) receive every tick outcome, including explicit
//! withholdings — absence of a reading is reported, never inferred from
//! silence.

use crossbeam_channel::Sender;

use crate::domain::{EstimationResult, TickOutcome, WithholdReason};

pub trait ResultSink: Send + Sync {
    fn on_result(&self, result: &EstimationResult);
    fn on_withheld(&self, reason: WithholdReason, ts_us: i64);
}

/// Sink that forwards every outcome into a channel. The natural adapter for
/// tests and for UI layers polling from their own event loop.
pub struct ChannelSink {
    tx: Sender<TickOutcome>,
}

impl ChannelSink {
    pub fn new(tx: Sender<TickOutcome>) -> Self {
        ChannelSink { tx }
    }
}

impl ResultSink for ChannelSink {
    fn on_result(&self, result: &EstimationResult) {
        let _ = self.tx.send(TickOutcome::Estimate(*result));
    }

    fn on_withheld(&self, reason: WithholdReason, ts_us: i64) {
        let _ = self.tx.send(TickOutcome::withheld(reason, ts_us));
    }
}
