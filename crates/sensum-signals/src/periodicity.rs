//! Rotational-speed detection by time-domain autocorrelation.
//!
//! The fundamental period shows up as the smallest lag whose normalized
//! autocorrelation clears the acceptance threshold. Correlation is
//! computed on the mean-removed series and normalized by the geometric
//! mean of the two overlapping segments' energies, so it stays in [-1, 1]
//! even across onsets and decays.

use tracing::debug;

use sensum_core::config::PeriodicityConfig;
use sensum_core::domain::{EstimationResult, Sample, TickOutcome, WithholdReason};
use sensum_core::error::ConfigError;
use sensum_core::estimator::BlockEstimator;

pub struct PeriodicityEstimator {
    cfg: PeriodicityConfig,
    buf: Vec<f64>,
    sq_prefix: Vec<f64>,
}

impl PeriodicityEstimator {
    pub fn new(cfg: PeriodicityConfig) -> Result<Self, ConfigError> {
        cfg.validate()?;
        Ok(PeriodicityEstimator {
            cfg,
            buf: Vec::new(),
            sq_prefix: Vec::new(),
        })
    }
}

impl BlockEstimator for PeriodicityEstimator {
    fn analyze(&mut self, block: &[Sample]) -> TickOutcome {
        let ts_us = match block.last() {
            Some(s) => s.ts_us,
            None => return TickOutcome::withheld(WithholdReason::InsufficientData, 0),
        };
        if block.len() < self.cfg.min_block {
            return TickOutcome::withheld(WithholdReason::InsufficientData, ts_us);
        }
        let start = block.len().saturating_sub(self.cfg.block_size);
        let tail = &block[start..];
        let n = tail.len();

        self.buf.clear();
        self.buf.extend(tail.iter().map(|s| s.intensity() as f64));
        let mean = self.buf.iter().sum::<f64>() / n as f64;
        for v in self.buf.iter_mut() {
            *v -= mean;
        }
        // Running energy so both overlap segments normalize in O(1).
        self.sq_prefix.clear();
        self.sq_prefix.push(0.0);
        let mut acc_sq = 0.0f64;
        for v in &self.buf {
            acc_sq += v * v;
            self.sq_prefix.push(acc_sq);
        }
        if acc_sq <= f64::EPSILON * n as f64 {
            return TickOutcome::withheld(WithholdReason::NumericDegenerate, ts_us);
        }

        let min_lag = self.cfg.min_lag();
        let max_lag = self.cfg.max_lag().min(n / 2);
        if min_lag >= max_lag {
            return TickOutcome::withheld(WithholdReason::InsufficientData, ts_us);
        }

        // Strictly-greater comparison keeps the smallest winning lag, so
        // period multiples with equal correlation do not halve the result.
        let mut best_lag = 0usize;
        let mut best_corr = f64::MIN;
        for lag in min_lag..=max_lag {
            let overlap = n - lag;
            let head_energy = self.sq_prefix[overlap];
            let tail_energy = self.sq_prefix[n] - self.sq_prefix[lag];
            let norm = (head_energy * tail_energy).sqrt();
            if norm <= f64::EPSILON {
                continue;
            }
            let mut acc = 0.0f64;
            for i in 0..overlap {
                acc += self.buf[i] * self.buf[i + lag];
            }
            // Cauchy-Schwarz keeps this in [-1, 1].
            let corr = acc / norm;
            if corr > best_corr {
                best_corr = corr;
                best_lag = lag;
            }
        }

        if best_corr <= self.cfg.corr_threshold {
            debug!(best_corr, best_lag, "no lag cleared the correlation threshold");
            return TickOutcome::withheld(WithholdReason::NoSignal, ts_us);
        }

        let freq_hz = self.cfg.sample_rate as f64 / best_lag as f64;
        TickOutcome::Estimate(EstimationResult {
            value: freq_hz * 60.0,
            confidence: best_corr.clamp(0.0, 1.0) as f32,
            direction: None,
            ts_us,
        })
    }

    fn reset(&mut self) {
        self.buf.clear();
        self.sq_prefix.clear();
    }
}
