//! Beat-rate estimation from a slowly sampled intensity channel.
//!
//! Contact-gated samples feed a 5-point local-maximum detector with a
//! refractory period; the surviving inter-beat intervals yield the rate
//! and an interval-consistency confidence. Results are only published
//! when the intervals agree with each other, so broadband flicker that
//! fires at the refractory rate stays silent.

use std::collections::VecDeque;

use ndarray::Array1;
use serde::Serialize;
use tracing::debug;

use sensum_core::config::BeatConfig;
use sensum_core::domain::{dt_ms, EstimationResult, Sample, TickOutcome, WithholdReason};
use sensum_core::error::ConfigError;
use sensum_core::estimator::BlockEstimator;

use crate::dsp::{mean, remove_mean, std_dev};

/// Where the estimator is in its contact lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BeatPhase {
    /// No gated samples; nothing is touching the sensor.
    Idle,
    /// Contact established, waiting out the warm-up period.
    Stabilizing,
    /// Warm-up elapsed; every tick attempts a measurement.
    Measuring,
}

/// One accepted measurement per completed cycle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CycleRecord {
    pub bpm: u32,
    pub confidence: f32,
    pub ts_us: i64,
}

pub struct BeatEstimator {
    cfg: BeatConfig,
    phase: BeatPhase,
    contact_since_us: Option<i64>,
    cycle_origin_us: Option<i64>,
    last_ts_us: Option<i64>,
    recorded_cycle: Option<i64>,
    history: VecDeque<CycleRecord>,
}

impl BeatEstimator {
    pub fn new(cfg: BeatConfig) -> Result<Self, ConfigError> {
        cfg.validate()?;
        Ok(BeatEstimator {
            cfg,
            phase: BeatPhase::Idle,
            contact_since_us: None,
            cycle_origin_us: None,
            last_ts_us: None,
            recorded_cycle: None,
            history: VecDeque::new(),
        })
    }

    pub fn phase(&self) -> BeatPhase {
        self.phase
    }

    /// Accepted measurements, at most one per completed cycle with
    /// consecutive duplicates collapsed, oldest first.
    pub fn history(&self) -> &VecDeque<CycleRecord> {
        &self.history
    }

    /// Fraction of the current measurement cycle elapsed, 0..1. Stays at
    /// zero until the measuring phase begins.
    pub fn progress(&self) -> f32 {
        match (self.cycle_origin_us, self.last_ts_us) {
            (Some(origin), Some(now)) => {
                let cycle_us = self.cfg.cycle_ms as i64 * 1_000;
                let elapsed = (now - origin).max(0) % cycle_us;
                (elapsed as f64 / cycle_us as f64).clamp(0.0, 1.0) as f32
            }
            _ => 0.0,
        }
    }

    fn record_cycle(&mut self, bpm: u32, confidence: f32, ts_us: i64) {
        let origin = match self.cycle_origin_us {
            Some(o) => o,
            None => return,
        };
        let idx = (ts_us - origin) / (self.cfg.cycle_ms as i64 * 1_000);
        if self.recorded_cycle == Some(idx) {
            return;
        }
        self.recorded_cycle = Some(idx);
        // A reading identical to the last retained one adds nothing.
        if self.history.back().map(|r| r.bpm) == Some(bpm) {
            return;
        }
        self.history.push_back(CycleRecord { bpm, confidence, ts_us });
        while self.history.len() > self.cfg.history_len {
            self.history.pop_front();
        }
    }

    /// Timestamps of accepted peaks in the centered series.
    fn detect_peaks(&self, ts: &[i64], centered: &Array1<f32>) -> Vec<i64> {
        let n = centered.len();
        let mut peaks: Vec<i64> = Vec::new();
        if n < 5 {
            return peaks;
        }
        for i in 2..n - 2 {
            let v = centered[i];
            if v <= 0.0
                || v <= centered[i - 2]
                || v <= centered[i - 1]
                || v <= centered[i + 1]
                || v <= centered[i + 2]
            {
                continue;
            }
            let accepted = match peaks.last() {
                Some(&prev) => dt_ms(ts[i], prev) >= self.cfg.refractory_ms as f64,
                None => true,
            };
            if accepted {
                peaks.push(ts[i]);
            }
        }
        peaks
    }
}

impl BlockEstimator for BeatEstimator {
    fn analyze(&mut self, block: &[Sample]) -> TickOutcome {
        let now_us = match block.last() {
            Some(s) => s.ts_us,
            None => return TickOutcome::withheld(WithholdReason::InsufficientData, 0),
        };
        self.last_ts_us = Some(now_us);
        let horizon_us = now_us - self.cfg.analysis_ms as i64 * 1_000;

        let mut ts: Vec<i64> = Vec::new();
        let mut intensity: Vec<f32> = Vec::new();
        for s in block {
            let v = s.intensity();
            if s.ts_us >= horizon_us && v >= self.cfg.intensity_floor {
                ts.push(s.ts_us);
                intensity.push(v);
            }
        }

        if ts.is_empty() {
            if self.phase != BeatPhase::Idle {
                debug!("contact lost, returning to idle");
            }
            self.phase = BeatPhase::Idle;
            self.contact_since_us = None;
            return TickOutcome::withheld(WithholdReason::NoSignal, now_us);
        }

        let since = *self.contact_since_us.get_or_insert(ts[0]);
        if dt_ms(now_us, since) < self.cfg.stabilize_ms as f64 {
            self.phase = BeatPhase::Stabilizing;
            return TickOutcome::withheld(WithholdReason::InsufficientData, now_us);
        }
        if self.phase != BeatPhase::Measuring {
            self.phase = BeatPhase::Measuring;
            self.cycle_origin_us.get_or_insert(now_us);
        }

        if ts.len() < self.cfg.min_samples {
            return TickOutcome::withheld(WithholdReason::InsufficientData, now_us);
        }

        let centered = remove_mean(&Array1::from_vec(intensity));
        let peaks = self.detect_peaks(&ts, &centered);

        let ibis: Vec<f64> = peaks
            .windows(2)
            .map(|w| dt_ms(w[1], w[0]))
            .filter(|&ms| ms >= self.cfg.min_ibi_ms as f64 && ms <= self.cfg.max_ibi_ms as f64)
            .collect();
        if ibis.len() < 3 {
            return TickOutcome::withheld(WithholdReason::NoSignal, now_us);
        }

        let mean_ibi = mean(&ibis);
        if mean_ibi <= f64::EPSILON {
            return TickOutcome::withheld(WithholdReason::NumericDegenerate, now_us);
        }
        let spread = std_dev(&ibis, mean_ibi);
        let confidence = (1.0 - (spread / mean_ibi).clamp(0.0, 1.0)) as f32;
        if confidence < self.cfg.min_confidence {
            debug!(confidence, "interval spread too high, withholding");
            return TickOutcome::withheld(WithholdReason::NoSignal, now_us);
        }

        let bpm = (60_000.0 / mean_ibi).round();
        if bpm < self.cfg.min_bpm as f64 || bpm > self.cfg.max_bpm as f64 {
            return TickOutcome::withheld(WithholdReason::OutOfRange, now_us);
        }

        self.record_cycle(bpm as u32, confidence, now_us);
        TickOutcome::Estimate(EstimationResult {
            value: bpm,
            confidence,
            direction: None,
            ts_us: now_us,
        })
    }

    fn reset(&mut self) {
        self.phase = BeatPhase::Idle;
        self.contact_since_us = None;
        self.cycle_origin_us = None;
        self.last_ts_us = None;
        self.recorded_cycle = None;
        self.history.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::TAU;

    const STEP_US: i64 = 33_333; // 30 Hz intensity channel

    /// 72 BPM pulse riding on a bright baseline.
    fn pulse_samples(n: usize) -> Vec<Sample> {
        (0..n)
            .map(|i| {
                let t = i as f64 * STEP_US as f64 / 1_000_000.0;
                let v = 512.0 + 100.0 * (TAU * 1.2 * t).sin();
                Sample::scalar(i as i64 * STEP_US, v as f32)
            })
            .collect()
    }

    fn samples_for_secs(secs: f64) -> usize {
        (secs * 1_000_000.0 / STEP_US as f64) as usize
    }

    #[test]
    fn steady_pulse_yields_72_bpm() {
        let block = pulse_samples(samples_for_secs(12.0));
        let mut est = BeatEstimator::new(BeatConfig::default()).unwrap();
        match est.analyze(&block) {
            TickOutcome::Estimate(r) => {
                assert_eq!(r.value, 72.0);
                assert!(r.confidence > 0.9, "confidence {}", r.confidence);
            }
            TickOutcome::Withheld { reason, .. } => panic!("withheld: {reason}"),
        }
        assert_eq!(est.phase(), BeatPhase::Measuring);
    }

    #[test]
    fn dark_sensor_stays_idle() {
        let block: Vec<Sample> = (0..samples_for_secs(12.0))
            .map(|i| Sample::scalar(i as i64 * STEP_US, 4.0))
            .collect();
        let mut est = BeatEstimator::new(BeatConfig::default()).unwrap();
        match est.analyze(&block) {
            TickOutcome::Withheld { reason, .. } => {
                assert_eq!(reason, WithholdReason::NoSignal)
            }
            TickOutcome::Estimate(r) => panic!("unexpected estimate {r:?}"),
        }
        assert_eq!(est.phase(), BeatPhase::Idle);
    }

    #[test]
    fn short_contact_is_still_stabilizing() {
        let block = pulse_samples(samples_for_secs(2.0));
        let mut est = BeatEstimator::new(BeatConfig::default()).unwrap();
        match est.analyze(&block) {
            TickOutcome::Withheld { reason, .. } => {
                assert_eq!(reason, WithholdReason::InsufficientData)
            }
            TickOutcome::Estimate(r) => panic!("unexpected estimate {r:?}"),
        }
        assert_eq!(est.phase(), BeatPhase::Stabilizing);
    }

    #[test]
    fn irregular_intervals_are_withheld() {
        // Spikes whose spacing wanders across the whole plausible band;
        // the interval-consistency gate must reject them.
        let gaps_ms = [
            400i64, 900, 400, 1_100, 500, 1_000, 450, 950, 400, 1_050, 400, 900, 500, 1_100, 450,
            900,
        ];
        let mut spike_ts: Vec<i64> = Vec::new();
        let mut acc = 0i64;
        for g in gaps_ms {
            acc += g * 1_000;
            spike_ts.push(acc);
        }
        let n = samples_for_secs(12.0);
        let block: Vec<Sample> = (0..n)
            .map(|i| {
                let ts = i as i64 * STEP_US;
                let near_spike = spike_ts.iter().any(|&p| (ts - p).abs() < STEP_US / 2);
                let v = if near_spike { 900.0 } else { 500.0 };
                Sample::scalar(ts, v)
            })
            .collect();
        let mut est = BeatEstimator::new(BeatConfig::default()).unwrap();
        match est.analyze(&block) {
            TickOutcome::Withheld { reason, .. } => {
                assert_eq!(reason, WithholdReason::NoSignal)
            }
            TickOutcome::Estimate(r) => panic!("unexpected estimate {r:?}"),
        }
    }

    #[test]
    fn plausibility_range_is_enforced() {
        let cfg = BeatConfig {
            min_bpm: 80,
            ..BeatConfig::default()
        };
        let block = pulse_samples(samples_for_secs(12.0));
        let mut est = BeatEstimator::new(cfg).unwrap();
        match est.analyze(&block) {
            TickOutcome::Withheld { reason, .. } => {
                assert_eq!(reason, WithholdReason::OutOfRange)
            }
            TickOutcome::Estimate(r) => panic!("unexpected estimate {r:?}"),
        }
    }

    #[test]
    fn history_collapses_consecutive_duplicates() {
        let samples = pulse_samples(samples_for_secs(24.0));
        let mut est = BeatEstimator::new(BeatConfig::default()).unwrap();

        // Two ticks in the first cycle, one in the second, all reading 72:
        // a single entry survives.
        assert!(!est.analyze(&samples[..samples_for_secs(12.0)]).is_withheld());
        assert!(!est.analyze(&samples[..samples_for_secs(13.0)]).is_withheld());
        assert_eq!(est.history().len(), 1);
        assert!(!est.analyze(&samples[..samples_for_secs(23.5)]).is_withheld());
        assert_eq!(est.history().len(), 1);
        assert_eq!(est.history()[0].bpm, 72);
    }

    #[test]
    fn history_appends_when_the_value_changes() {
        // 12 s at 72 BPM, then the pulse slows to 60 BPM.
        let samples: Vec<Sample> = (0..samples_for_secs(36.0))
            .map(|i| {
                let t = i as f64 * STEP_US as f64 / 1_000_000.0;
                let hz = if t < 12.0 { 1.2 } else { 1.0 };
                let v = 512.0 + 100.0 * (TAU * hz * t).sin();
                Sample::scalar(i as i64 * STEP_US, v as f32)
            })
            .collect();
        let mut est = BeatEstimator::new(BeatConfig::default()).unwrap();

        assert!(!est.analyze(&samples[..samples_for_secs(12.0)]).is_withheld());
        assert_eq!(est.history().len(), 1);
        // Second cycle reads the slower rate and is retained.
        assert!(!est.analyze(&samples[..samples_for_secs(23.5)]).is_withheld());
        assert_eq!(est.history().len(), 2);
        assert_eq!(est.history()[0].bpm, 72);
        assert_eq!(est.history()[1].bpm, 60);
        // Third cycle repeats 60 and collapses into the previous entry.
        assert!(!est.analyze(&samples[..samples_for_secs(33.5)]).is_withheld());
        assert_eq!(est.history().len(), 2);
    }

    #[test]
    fn progress_tracks_the_measurement_cycle() {
        let samples = pulse_samples(samples_for_secs(18.0));
        let mut est = BeatEstimator::new(BeatConfig::default()).unwrap();
        assert_eq!(est.progress(), 0.0);

        // First measuring tick anchors the cycle.
        assert!(!est.analyze(&samples[..samples_for_secs(12.0)]).is_withheld());
        assert!(est.progress() < 0.01);
        // Five seconds into a 10 s cycle.
        assert!(!est.analyze(&samples[..samples_for_secs(17.0)]).is_withheld());
        assert!((est.progress() - 0.5).abs() < 0.01, "progress {}", est.progress());

        est.reset();
        assert_eq!(est.progress(), 0.0);
    }

    #[test]
    fn reset_returns_to_idle_and_forgets_history() {
        let block = pulse_samples(samples_for_secs(12.0));
        let mut est = BeatEstimator::new(BeatConfig::default()).unwrap();
        assert!(!est.analyze(&block).is_withheld());
        est.reset();
        assert_eq!(est.phase(), BeatPhase::Idle);
        assert!(est.history().is_empty());
    }
}
