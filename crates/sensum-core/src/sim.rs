//! Simulated sample sources.
//!
//! Stand-ins for the hardware capture plumbing: a scripted replay source
//! delivering a fixed sample sequence from its own thread, and a source
//! that fails at subscription the way absent hardware does.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crate::domain::Sample;
use crate::error::SourceError;
use crate::source::{SampleCallback, SampleSource, Subscription};

/// Replays a prepared sample sequence on a dedicated delivery thread,
/// optionally paced. Delivery stops at cancellation or when the script is
/// exhausted.
pub struct ScriptedSource {
    samples: Vec<Sample>,
    pacing: Option<Duration>,
}

impl ScriptedSource {
    pub fn new(samples: Vec<Sample>) -> Self {
        ScriptedSource {
            samples,
            pacing: None,
        }
    }

    /// Sleep this long between delivered samples.
    pub fn paced(mut self, pacing: Duration) -> Self {
        self.pacing = Some(pacing);
        self
    }
}

impl SampleSource for ScriptedSource {
    fn subscribe(&mut self, mut callback: SampleCallback) -> Result<Subscription, SourceError> {
        let samples = self.samples.clone();
        let pacing = self.pacing;
        let cancelled = Arc::new(AtomicBool::new(false));
        let flag = cancelled.clone();

        let handle = thread::spawn(move || {
            for sample in samples {
                if flag.load(Ordering::Relaxed) {
                    break;
                }
                if let Some(p) = pacing {
                    thread::sleep(p);
                }
                callback(sample);
            }
        });

        Ok(Subscription::new(move || {
            cancelled.store(true, Ordering::Relaxed);
            let _ = handle.join();
        }))
    }
}

/// Always fails at subscription, like a device that is missing or locked.
pub struct FailingSource {
    pub error: SourceError,
}

impl SampleSource for FailingSource {
    fn subscribe(&mut self, _callback: SampleCallback) -> Result<Subscription, SourceError> {
        Err(self.error)
    }
}
