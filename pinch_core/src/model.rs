//! The shared data model: `SensorStream`, `Candidate`, `Event`,
//! `RejectionLedger`, and the `DetectorOutput` "core → reporter" contract.
//!
//! Candidates and events are plain values, never references into the
//! stream they were found in — they carry a sample index, not a pointer.

use std::sync::Arc;

use pinch_config::DetectorConfig;
use pinch_traits::{WarnKind, WarnSink, Warning};

use crate::error::DetectorError;
use crate::kernels::median;

/// An immutable-after-construction triaxial accelerometer + gyroscope
/// stream, with timestamps normalized to start at zero.
#[derive(Debug, Clone, PartialEq)]
pub struct SensorStream {
    /// Seconds, monotonically non-decreasing, `t[0] == 0`.
    pub t: Vec<f64>,
    pub a_xyz: Vec<[f64; 3]>,
    pub g_xyz: Vec<[f64; 3]>,
    /// `‖a_xyz‖₂` per sample.
    pub a_mag: Vec<f64>,
    /// `‖g_xyz‖₂` per sample.
    pub g_mag: Vec<f64>,
    /// `1 / median(diff(t))`, or 100.0 if that median is zero.
    pub fs: f64,
}

impl SensorStream {
    /// Builds a `SensorStream` with the default invariant thresholds
    /// (`min_duration_s = 1.0`, `max_gap_s = 0.1`).
    pub fn new(
        t: Vec<f64>,
        a_xyz: Vec<[f64; 3]>,
        g_xyz: Vec<[f64; 3]>,
        warn_sink: &mut dyn WarnSink,
    ) -> Result<Self, DetectorError> {
        Self::with_params(t, a_xyz, g_xyz, 1.0, 0.1, warn_sink)
    }

    pub fn with_params(
        mut t: Vec<f64>,
        a_xyz: Vec<[f64; 3]>,
        g_xyz: Vec<[f64; 3]>,
        min_duration_s: f64,
        max_gap_s: f64,
        warn_sink: &mut dyn WarnSink,
    ) -> Result<Self, DetectorError> {
        let n = t.len();
        if n < 3 {
            return Err(DetectorError::Precondition(format!(
                "N = {n} < 3 samples required"
            )));
        }
        if a_xyz.len() != n || g_xyz.len() != n {
            return Err(DetectorError::Precondition(format!(
                "channel length mismatch: t={n}, a_xyz={}, g_xyz={}",
                a_xyz.len(),
                g_xyz.len()
            )));
        }
        if t.iter().any(|v| !v.is_finite())
            || a_xyz.iter().flatten().any(|v| !v.is_finite())
            || g_xyz.iter().flatten().any(|v| !v.is_finite())
        {
            return Err(DetectorError::Precondition(
                "non-finite value in t, a_xyz, or g_xyz".into(),
            ));
        }
        for w in t.windows(2) {
            if w[1] < w[0] {
                return Err(DetectorError::Precondition(
                    "t is not monotonically non-decreasing".into(),
                ));
            }
        }

        if t[0] > 1000.0 {
            let t0 = t[0];
            for v in t.iter_mut() {
                *v -= t0;
            }
        }

        let duration = t[n - 1] - t[0];
        if duration < min_duration_s {
            return Err(DetectorError::Precondition(format!(
                "duration {duration:.3}s < min_duration_s {min_duration_s:.3}s"
            )));
        }

        let diffs: Vec<f64> = t.windows(2).map(|w| w[1] - w[0]).collect();
        let gap_count = diffs.iter().filter(|d| **d > max_gap_s).count();
        if gap_count > 0 {
            warn_sink.warn(Warning::new(
                WarnKind::SamplingGap,
                format!("{gap_count} gap(s) exceed max_gap_s = {max_gap_s:.3}s"),
            ));
        }

        let med_diff = median(&diffs);
        let fs = if med_diff > 0.0 { 1.0 / med_diff } else { 100.0 };

        let a_mag = a_xyz.iter().map(|a| magnitude(*a)).collect();
        let g_mag = g_xyz.iter().map(|g| magnitude(*g)).collect();

        Ok(SensorStream {
            t,
            a_xyz,
            g_xyz,
            a_mag,
            g_mag,
            fs,
        })
    }

    pub fn len(&self) -> usize {
        self.t.len()
    }

    pub fn is_empty(&self) -> bool {
        self.t.is_empty()
    }
}

pub fn magnitude(v: [f64; 3]) -> f64 {
    (v[0] * v[0] + v[1] * v[1] + v[2] * v[2]).sqrt()
}

/// A transient candidate excitation, created inside a detector and either
/// promoted to an `Event` or filed into a `RejectionLedger` bucket.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Candidate {
    pub index: usize,
    pub time: f64,
    pub score: f64,
    pub threshold: f64,
    pub acc_peak: f64,
    pub gyro_peak: f64,
}

/// A promoted candidate. Same shape as `Candidate`; the distinction is the
/// ordering invariant events carry once inside an output's `events` list.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Event {
    pub index: usize,
    pub time: f64,
    pub score: f64,
    pub threshold: f64,
    pub acc_peak: f64,
    pub gyro_peak: f64,
}

impl From<Candidate> for Event {
    fn from(c: Candidate) -> Self {
        Event {
            index: c.index,
            time: c.time,
            score: c.score,
            threshold: c.threshold,
            acc_peak: c.acc_peak,
            gyro_peak: c.gyro_peak,
        }
    }
}

/// Which rejection bucket a candidate was filed under. A candidate may be
/// recorded under both `AccGate` and `GyroGate` if both gates fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectionBucket {
    Refractory,
    NotPeak,
    AccGate,
    GyroGate,
    MinIei,
}

/// The offline detector's rejection bookkeeping: five ordered buckets of
/// candidates that did not become events.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RejectionLedger {
    pub refractory: Vec<Candidate>,
    pub not_peak: Vec<Candidate>,
    pub acc_gates: Vec<Candidate>,
    pub gyro_gates: Vec<Candidate>,
    pub min_iei: Vec<Candidate>,
}

impl RejectionLedger {
    pub fn push(&mut self, bucket: RejectionBucket, candidate: Candidate) {
        match bucket {
            RejectionBucket::Refractory => self.refractory.push(candidate),
            RejectionBucket::NotPeak => self.not_peak.push(candidate),
            RejectionBucket::AccGate => self.acc_gates.push(candidate),
            RejectionBucket::GyroGate => self.gyro_gates.push(candidate),
            RejectionBucket::MinIei => self.min_iei.push(candidate),
        }
    }

    /// Number of distinct candidates rejected for any reason at all
    /// (a candidate present in both `acc_gates` and `gyro_gates` counts
    /// once).
    pub fn distinct_rejected_count(&self) -> usize {
        let mut indices: Vec<usize> = self
            .refractory
            .iter()
            .chain(&self.not_peak)
            .chain(&self.acc_gates)
            .chain(&self.gyro_gates)
            .chain(&self.min_iei)
            .map(|c| c.index)
            .collect();
        indices.sort_unstable();
        indices.dedup();
        indices.len()
    }
}

/// Which of the three detector subsystems produced a `DetectorOutput`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetectorKind {
    Offline,
    Streaming,
    TwoStage,
}

/// The offline-only dense per-component arrays that accompany a score.
#[derive(Debug, Clone, PartialEq)]
pub struct FusionComponents {
    pub a_hp: Vec<f64>,
    pub z_a: Vec<f64>,
    pub z_g: Vec<f64>,
    pub z_da: Vec<f64>,
    pub z_dg: Vec<f64>,
}

/// Everything a detector run produces, bundled with the effective config
/// and a handle to the input stream.
#[derive(Debug, Clone)]
pub struct DetectorOutput {
    pub detector_type: DetectorKind,
    pub events: Vec<Event>,
    pub score: Vec<f64>,
    pub threshold: Vec<f64>,
    pub components: Option<FusionComponents>,
    pub rejected: Option<RejectionLedger>,
    pub params: DetectorConfig,
    pub stream: Arc<SensorStream>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pinch_traits::NullWarnSink;

    fn flat_stream(n: usize, fs: f64) -> (Vec<f64>, Vec<[f64; 3]>, Vec<[f64; 3]>) {
        let t: Vec<f64> = (0..n).map(|i| i as f64 / fs).collect();
        let a = vec![[0.0, 0.0, 1.0]; n];
        let g = vec![[0.0, 0.0, 0.0]; n];
        (t, a, g)
    }

    #[test]
    fn rejects_fewer_than_three_samples() {
        let mut sink = NullWarnSink;
        let (t, a, g) = flat_stream(2, 100.0);
        let err = SensorStream::new(t, a, g, &mut sink).unwrap_err();
        assert!(err.to_string().contains("N = 2"));
    }

    #[test]
    fn normalizes_epoch_time_origin() {
        let mut sink = NullWarnSink;
        let n = 200;
        let epoch0 = 1_700_000_000.0;
        let t: Vec<f64> = (0..n).map(|i| epoch0 + i as f64 / 100.0).collect();
        let a = vec![[0.0, 0.0, 1.0]; n];
        let g = vec![[0.0, 0.0, 0.0]; n];
        let stream = SensorStream::new(t, a, g, &mut sink).unwrap();
        assert_eq!(stream.t[0], 0.0);
    }

    #[test]
    fn computes_fs_from_median_diff() {
        let mut sink = NullWarnSink;
        let (t, a, g) = flat_stream(500, 100.0);
        let stream = SensorStream::new(t, a, g, &mut sink).unwrap();
        assert!((stream.fs - 100.0).abs() < 1e-6);
    }

    #[test]
    fn short_duration_is_a_hard_failure() {
        let mut sink = NullWarnSink;
        let (t, a, g) = flat_stream(10, 100.0); // 90ms, well under 1s
        let err = SensorStream::new(t, a, g, &mut sink).unwrap_err();
        assert!(matches!(err, DetectorError::Precondition(_)));
    }

    #[test]
    fn gap_beyond_max_gap_s_warns_but_does_not_fail() {
        use pinch_traits::VecWarnSink;
        let mut sink = VecWarnSink::default();
        let mut t: Vec<f64> = (0..200).map(|i| i as f64 / 100.0).collect();
        // Blow a 0.5s hole in the middle.
        for v in t.iter_mut().skip(100) {
            *v += 0.5;
        }
        let a = vec![[0.0, 0.0, 1.0]; 200];
        let g = vec![[0.0, 0.0, 0.0]; 200];
        let stream = SensorStream::new(t, a, g, &mut sink).unwrap();
        assert_eq!(stream.len(), 200);
        assert_eq!(sink.0.len(), 1);
    }

    #[test]
    fn rejection_ledger_double_counts_shared_gate_failures_once() {
        let mut ledger = RejectionLedger::default();
        let c = Candidate {
            index: 5,
            time: 0.05,
            score: 1.0,
            threshold: 0.5,
            acc_peak: 0.01,
            gyro_peak: 0.01,
        };
        ledger.push(RejectionBucket::AccGate, c);
        ledger.push(RejectionBucket::GyroGate, c);
        assert_eq!(ledger.distinct_rejected_count(), 1);
    }
}
