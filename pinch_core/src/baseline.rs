//! BaselineTracker: online EMA of mean with Hampel-gated updates, rolling
//! ring-buffer MAD sigma recomputed every 100 samples.
//!
//! One tracker type, shared by `StreamingDetector` and `TwoStageDetector`,
//! always instantiated per-caller rather than process-wide.

use std::collections::VecDeque;

use crate::kernels::{mad_around, median, SIGMA_FLOOR};

const DEFAULT_HISTORY: usize = 1000;
const RECOMPUTE_EVERY: u64 = 100;

#[derive(Debug, Clone)]
pub struct BaselineTracker {
    alpha: f64,
    hampel_k: f64,
    capacity: usize,
    history: VecDeque<f64>,
    mean: f64,
    sigma: f64,
    initialized: bool,
    count: u64,
}

impl BaselineTracker {
    /// `alpha` is the EMA rate for the mean; `hampel_k` gates which samples
    /// are allowed to move it.
    pub fn new(alpha: f64, hampel_k: f64) -> Self {
        Self::with_capacity(alpha, hampel_k, DEFAULT_HISTORY)
    }

    pub fn with_capacity(alpha: f64, hampel_k: f64, capacity: usize) -> Self {
        BaselineTracker {
            alpha,
            hampel_k,
            capacity,
            history: VecDeque::with_capacity(capacity.min(4096)),
            mean: 0.0,
            sigma: SIGMA_FLOOR,
            initialized: false,
            count: 0,
        }
    }

    pub fn mean(&self) -> f64 {
        self.mean
    }

    pub fn sigma(&self) -> f64 {
        self.sigma
    }

    /// `mean + k*sigma`.
    pub fn get_threshold(&self, k: f64) -> f64 {
        self.mean + k * self.sigma
    }

    pub fn update(&mut self, v: f64) {
        if !self.initialized {
            self.mean = v;
            self.initialized = true;
        } else if (v - self.mean).abs() <= self.hampel_k * self.sigma {
            self.mean = (1.0 - self.alpha) * self.mean + self.alpha * v;
        }

        self.history.push_back(v);
        while self.history.len() > self.capacity {
            self.history.pop_front();
        }

        self.count += 1;
        if self.count % RECOMPUTE_EVERY == 0 {
            let data: Vec<f64> = self.history.iter().copied().collect();
            let med = median(&data);
            let recomputed = 1.4826 * mad_around(&data, med);
            self.sigma = recomputed.max(SIGMA_FLOOR);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_sample_initializes_mean_exactly() {
        let mut t = BaselineTracker::new(0.01, 3.0);
        t.update(2.5);
        assert_eq!(t.mean(), 2.5);
    }

    #[test]
    fn sigma_saturates_at_floor_for_constant_input() {
        let mut t = BaselineTracker::new(0.01, 3.0);
        for _ in 0..500 {
            t.update(1.0);
        }
        assert!((t.sigma() - SIGMA_FLOOR).abs() < 1e-12);
        assert!(t.get_threshold(5.0).is_finite());
    }

    #[test]
    fn hampel_gate_rejects_large_bursts() {
        let mut t = BaselineTracker::new(0.05, 3.0);
        for _ in 0..200 {
            t.update(0.0);
        }
        let mean_before = t.mean();
        // A burst far outside hampel_k*sigma should not move the mean.
        for _ in 0..5 {
            t.update(50.0);
        }
        assert_eq!(t.mean(), mean_before);
    }

    #[test]
    fn mean_tracks_slow_drift() {
        let mut t = BaselineTracker::new(0.1, 3.0);
        for _ in 0..50 {
            t.update(0.0);
        }
        for _ in 0..200 {
            t.update(1.0);
        }
        assert!(t.mean() > 0.5);
    }

    #[test]
    fn sigma_recomputes_every_hundred_samples() {
        let mut t = BaselineTracker::new(0.05, 3.0);
        for i in 0..99 {
            t.update((i % 3) as f64 * 0.1);
        }
        assert!((t.sigma() - SIGMA_FLOOR).abs() < 1e-12);
        t.update(0.2); // 100th sample triggers recompute
        assert!(t.sigma() >= SIGMA_FLOOR);
    }
}
