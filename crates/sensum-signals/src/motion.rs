//! Gravity separation for accelerometer-fed estimators.
//!
//! A low-pass EMA tracks the gravity vector; what is left after
//! subtracting it is the device's own motion, reduced to a scalar
//! magnitude so vector sources feed the same estimators scalar
//! sources do.

use sensum_core::domain::{Sample, SampleValue};

pub const DEFAULT_GRAVITY_ALPHA: f32 = 0.8;

pub struct GravityFilter {
    alpha: f32,
    gravity: Option<[f32; 3]>,
}

impl GravityFilter {
    pub fn new(alpha: f32) -> Self {
        GravityFilter {
            alpha: alpha.clamp(0.0, 1.0),
            gravity: None,
        }
    }

    /// Convert a vector sample to the magnitude of its linear (gravity-free)
    /// acceleration. Scalar samples pass through untouched.
    pub fn ingest(&mut self, sample: Sample) -> Sample {
        match sample.value {
            SampleValue::Scalar(_) => sample,
            SampleValue::Vector3(a) => {
                let g = match self.gravity {
                    // First sample seeds the filter; the EMA would otherwise
                    // spend many samples converging from zero.
                    None => a,
                    Some(g) => [
                        self.alpha * g[0] + (1.0 - self.alpha) * a[0],
                        self.alpha * g[1] + (1.0 - self.alpha) * a[1],
                        self.alpha * g[2] + (1.0 - self.alpha) * a[2],
                    ],
                };
                self.gravity = Some(g);
                let linear = [a[0] - g[0], a[1] - g[1], a[2] - g[2]];
                let magnitude =
                    (linear[0] * linear[0] + linear[1] * linear[1] + linear[2] * linear[2]).sqrt();
                Sample::scalar(sample.ts_us, magnitude)
            }
        }
    }

    pub fn reset(&mut self) {
        self.gravity = None;
    }
}

impl Default for GravityFilter {
    fn default() -> Self {
        GravityFilter::new(DEFAULT_GRAVITY_ALPHA)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn resting_device_reads_zero_motion() {
        let mut filter = GravityFilter::default();
        for i in 0..50 {
            let out = filter.ingest(Sample::vector3(i * 1_000, [0.0, 0.0, 9.81]));
            assert_relative_eq!(out.intensity(), 0.0, epsilon = 1e-6);
        }
    }

    #[test]
    fn acceleration_step_decays_at_the_filter_rate() {
        let mut filter = GravityFilter::default();
        filter.ingest(Sample::vector3(0, [0.0, 0.0, 9.81]));
        let first = filter.ingest(Sample::vector3(1_000, [0.0, 0.0, 12.0])).intensity();
        let second = filter.ingest(Sample::vector3(2_000, [0.0, 0.0, 12.0])).intensity();
        // g' = 0.8 g + 0.2 a, so the residual is 0.8 (a - g).
        assert_relative_eq!(first, 0.8 * (12.0 - 9.81), epsilon = 1e-4);
        assert_relative_eq!(second / first, 0.8, epsilon = 1e-4);
    }

    #[test]
    fn scalar_samples_pass_through() {
        let mut filter = GravityFilter::default();
        let s = Sample::scalar(5, 1.25);
        assert_eq!(filter.ingest(s), s);
    }
}
