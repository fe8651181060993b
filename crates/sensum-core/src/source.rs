//! Sample source capability.
//!
//! Acquisition hardware lives outside this crate; whatever captures audio,
//! frames, or inertial data implements [`SampleSource`] and pushes samples
//! from its own delivery context. The reactive unsubscribe-on-cancel style
//! of such APIs maps to an explicit [`Subscription`] handle here.

use crate::domain::Sample;
use crate::error::SourceError;

/// Callback invoked once per delivered sample, on the source's own thread.
/// Must stay cheap: append, evict, hand off. Heavy work belongs on the
/// compute worker.
pub type SampleCallback = Box<dyn FnMut(Sample) + Send>;

pub trait SampleSource {
    /// Begin delivery. Fails fast with [`SourceError`] when the hardware is
    /// missing or access was denied; no samples will ever arrive then.
    fn subscribe(&mut self, callback: SampleCallback) -> Result<Subscription, SourceError>;
}

/// Handle over an active delivery stream. Cancelling stops delivery and is
/// safe to repeat; dropping the handle cancels implicitly.
pub struct Subscription {
    cancel: Option<Box<dyn FnOnce() + Send>>,
}

impl Subscription {
    pub fn new(cancel: impl FnOnce() + Send + 'static) -> Self {
        Subscription {
            cancel: Some(Box::new(cancel)),
        }
    }

    pub fn cancel(&mut self) {
        if let Some(f) = self.cancel.take() {
            f();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.cancel();
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.cancel.is_some())
            .finish()
    }
}
