//! Doppler velocity estimation against an emitted reference tone.
//!
//! Each tick transforms the newest power-of-two slice of the window,
//! finds the strongest bin in a narrow band around the emitted
//! frequency, and converts the shift into a radial velocity. A peak
//! that does not dominate the spectrum is treated as tone absence
//! rather than motion.

use tracing::debug;

use sensum_core::config::DopplerConfig;
use sensum_core::domain::{Direction, EstimationResult, Sample, TickOutcome, WithholdReason};
use sensum_core::error::ConfigError;
use sensum_core::estimator::BlockEstimator;

use crate::spectral::{bin_power, fft_in_place, largest_pow2, peak_bin};

pub struct DopplerEstimator {
    cfg: DopplerConfig,
    re: Vec<f64>,
    im: Vec<f64>,
    last_shift_hz: f32,
}

impl DopplerEstimator {
    pub fn new(cfg: DopplerConfig) -> Result<Self, ConfigError> {
        cfg.validate()?;
        Ok(DopplerEstimator {
            cfg,
            re: Vec::new(),
            im: Vec::new(),
            last_shift_hz: 0.0,
        })
    }

    /// Frequency shift behind the most recent estimate, in Hz.
    pub fn last_shift_hz(&self) -> f32 {
        self.last_shift_hz
    }

    fn direction_for(&self, velocity: f64) -> Direction {
        if velocity > self.cfg.deadband_mps as f64 {
            Direction::Approaching
        } else if velocity < -(self.cfg.deadband_mps as f64) {
            Direction::Receding
        } else {
            Direction::Stationary
        }
    }
}

impl BlockEstimator for DopplerEstimator {
    fn analyze(&mut self, block: &[Sample]) -> TickOutcome {
        let ts_us = match block.last() {
            Some(s) => s.ts_us,
            None => return TickOutcome::withheld(WithholdReason::InsufficientData, 0),
        };
        let n = largest_pow2(block.len());
        if n < self.cfg.min_block {
            return TickOutcome::withheld(WithholdReason::InsufficientData, ts_us);
        }

        let tail = &block[block.len() - n..];
        self.re.clear();
        self.re.extend(tail.iter().map(|s| s.intensity() as f64));
        self.im.clear();
        self.im.resize(n, 0.0);
        fft_in_place(&mut self.re, &mut self.im, false);

        let bin_hz = self.cfg.sample_rate as f64 / n as f64;
        let center = (self.cfg.emit_freq as f64 / bin_hz).round() as usize;
        let half = (self.cfg.search_halfwidth_hz as f64 / bin_hz).ceil() as usize;
        let lo = center.saturating_sub(half).max(1);
        let hi = (center + half).min(n / 2 - 1);

        let total: f64 = (1..n / 2).map(|k| bin_power(&self.re, &self.im, k)).sum();
        if total <= f64::EPSILON {
            return TickOutcome::withheld(WithholdReason::NoSignal, ts_us);
        }
        let peak = match peak_bin(&self.re, &self.im, lo, hi) {
            Some(k) => k,
            None => return TickOutcome::withheld(WithholdReason::NoSignal, ts_us),
        };
        let fraction = bin_power(&self.re, &self.im, peak) / total;
        if fraction < self.cfg.min_peak_fraction as f64 {
            debug!(fraction, "reference tone not dominant, withholding");
            return TickOutcome::withheld(WithholdReason::NoSignal, ts_us);
        }

        let shift_hz = peak as f64 * bin_hz - self.cfg.emit_freq as f64;
        let velocity = shift_hz / self.cfg.emit_freq as f64 * self.cfg.speed_of_sound as f64 / 2.0;
        self.last_shift_hz = shift_hz as f32;

        // The magnitude is the reading; the sign lives in `direction`.
        TickOutcome::Estimate(EstimationResult {
            value: velocity.abs(),
            confidence: ((fraction * 2.0).min(1.0)) as f32,
            direction: Some(self.direction_for(velocity)),
            ts_us,
        })
    }

    fn reset(&mut self) {
        self.last_shift_hz = 0.0;
    }
}
