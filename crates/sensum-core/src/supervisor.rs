//! Estimator supervisor: lifecycle, sample routing, and result publication.
//!
//! Architecture:
//! - ingestion (append + evict + tick counting) runs synchronously in the
//!   source's delivery callback and stays cheap;
//! - analysis runs on one dedicated worker thread;
//! - handoff is a single-slot overwrite channel: a fresh analysis block
//!   supersedes an unconsumed one, so a slow analysis pass costs staleness,
//!   never queue growth or capture-thread stalls.
//!
//! `start()` resets every per-run accumulator; nothing carries across a
//! stop/start boundary. `stop()` is idempotent and guarantees silence after
//! it returns: at most the in-flight computation drains.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;

use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};
use tracing::{debug, info, warn};

use crate::config::SupervisorConfig;
use crate::domain::{Sample, TickOutcome};
use crate::error::StartError;
use crate::estimator::BlockEstimator;
use crate::sink::ResultSink;
use crate::source::{SampleSource, Subscription};
use crate::window::SampleWindow;

enum WorkerCmd {
    Reset,
    Shutdown,
}

struct ActiveRun {
    subscription: Subscription,
    cmd_tx: Sender<WorkerCmd>,
    stop_flag: Arc<AtomicBool>,
    generation: Arc<AtomicU64>,
    worker: Option<thread::JoinHandle<()>>,
}

/// Owns the measurement lifecycle: `Stopped -> Running -> Stopped`.
pub struct Supervisor {
    cfg: SupervisorConfig,
    run: Option<ActiveRun>,
}

impl Supervisor {
    pub fn new(cfg: SupervisorConfig) -> Self {
        Supervisor { cfg, run: None }
    }

    pub fn is_running(&self) -> bool {
        self.run.is_some()
    }

    /// Begin a measurement run.
    ///
    /// Validates configuration, spawns the compute worker, then subscribes
    /// to the source. On any failure the supervisor remains `Stopped` and
    /// the worker is torn down.
    pub fn start(
        &mut self,
        estimator: Box<dyn BlockEstimator>,
        source: &mut dyn SampleSource,
        sink: Arc<dyn ResultSink>,
    ) -> Result<(), StartError> {
        if self.run.is_some() {
            return Err(StartError::AlreadyRunning);
        }
        self.cfg
            .validate()
            .map_err(|e| StartError::ConfigInvalid(e.to_string()))?;

        let (block_tx, block_rx) = bounded::<Vec<Sample>>(1);
        let (cmd_tx, cmd_rx) = bounded::<WorkerCmd>(4);
        let stop_flag = Arc::new(AtomicBool::new(false));
        let generation = Arc::new(AtomicU64::new(0));

        let worker = {
            let block_rx = block_rx.clone();
            let stop_flag = stop_flag.clone();
            thread::spawn(move || worker_loop(estimator, block_rx, cmd_rx, sink, stop_flag))
        };

        // Ingestion state lives inside the delivery callback; the callback
        // is its only mutator for the duration of the run.
        let callback = {
            let mut window = SampleWindow::new(self.cfg.window_us(), self.cfg.capacity);
            let mut since_tick = 0usize;
            let tick_samples = self.cfg.tick_samples;
            let stop_flag = stop_flag.clone();
            let generation = generation.clone();
            let mut seen_generation = 0u64;

            Box::new(move |sample: Sample| {
                if stop_flag.load(Ordering::Relaxed) {
                    return;
                }
                let gen = generation.load(Ordering::Relaxed);
                if gen != seen_generation {
                    seen_generation = gen;
                    window.clear();
                    since_tick = 0;
                }
                if !window.push(sample) {
                    warn!(ts_us = sample.ts_us, "timestamp regression, window resynchronized");
                    since_tick = 0;
                }
                since_tick += 1;
                if since_tick >= tick_samples {
                    since_tick = 0;
                    let block = window.snapshot();
                    if let Err(TrySendError::Full(fresh)) = block_tx.try_send(block) {
                        // Keep-latest: pop the stale block, then hand over
                        // the fresh one.
                        let _ = block_rx.try_recv();
                        let _ = block_tx.try_send(fresh);
                        debug!("analysis block superseded before compute");
                    }
                }
            })
        };

        match source.subscribe(callback) {
            Ok(subscription) => {
                info!(
                    window_ms = self.cfg.window_ms,
                    tick_samples = self.cfg.tick_samples,
                    "measurement run started"
                );
                self.run = Some(ActiveRun {
                    subscription,
                    cmd_tx,
                    stop_flag,
                    generation,
                    worker: Some(worker),
                });
                Ok(())
            }
            Err(e) => {
                stop_flag.store(true, Ordering::Relaxed);
                // cmd_tx disconnects here, which wakes and ends the worker.
                drop(cmd_tx);
                let _ = worker.join();
                Err(StartError::Source(e))
            }
        }
    }

    /// End the measurement run. Idempotent; after return nothing further is
    /// published.
    pub fn stop(&mut self) {
        if let Some(mut run) = self.run.take() {
            run.stop_flag.store(true, Ordering::Relaxed);
            run.subscription.cancel();
            let _ = run.cmd_tx.send(WorkerCmd::Shutdown);
            if let Some(handle) = run.worker.take() {
                let _ = handle.join();
            }
            info!("measurement run stopped");
        }
    }

    /// Clear the sample window and the estimator's accumulators without
    /// stopping — the recalibration path.
    pub fn reset(&mut self) {
        if let Some(run) = &self.run {
            run.generation.fetch_add(1, Ordering::Relaxed);
            let _ = run.cmd_tx.send(WorkerCmd::Reset);
            debug!("measurement state reset");
        }
    }
}

impl Drop for Supervisor {
    fn drop(&mut self) {
        self.stop();
    }
}

fn worker_loop(
    mut estimator: Box<dyn BlockEstimator>,
    block_rx: Receiver<Vec<Sample>>,
    cmd_rx: Receiver<WorkerCmd>,
    sink: Arc<dyn ResultSink>,
    stop_flag: Arc<AtomicBool>,
) {
    let mut last_ts_us = i64::MIN;
    loop {
        crossbeam_channel::select! {
            recv(cmd_rx) -> cmd => match cmd {
                Ok(WorkerCmd::Reset) => estimator.reset(),
                Ok(WorkerCmd::Shutdown) | Err(_) => break,
            },
            recv(block_rx) -> block => {
                let Ok(block) = block else { break };
                // No new work once a stop was requested, even if blocks are
                // still queued.
                if stop_flag.load(Ordering::Relaxed) {
                    continue;
                }
                let Some(ts_us) = block.last().map(|s| s.ts_us) else {
                    continue;
                };
                if ts_us < last_ts_us {
                    // A resynchronized window may reference earlier samples;
                    // publishing it would violate result ordering.
                    debug!(ts_us, "dropping out-of-order analysis block");
                    continue;
                }
                last_ts_us = ts_us;
                match estimator.analyze(&block) {
                    TickOutcome::Estimate(result) => sink.on_result(&result),
                    TickOutcome::Withheld { reason, ts_us } => {
                        debug!(%reason, ts_us, "tick withheld");
                        sink.on_withheld(reason, ts_us);
                    }
                }
            }
        }
    }
}
