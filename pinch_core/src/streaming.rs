//! StreamingDetector: a sample-driven O(1) state machine with a
//! latency-bounded confirmation window and a physiological refractory
//! period.
//!
//! The peak tracker is deliberately one-sample-late: it forms a candidate
//! from `prev_score`, timestamped at the *current* sample, rather than
//! reacting the instant a rising edge starts.

use std::sync::Arc;

use pinch_config::{DetectorConfig, StreamingConfig};

use crate::baseline::BaselineTracker;
use crate::error::DetectorError;
use crate::fusion::StreamingFusion;
use crate::model::{Candidate, DetectorKind, DetectorOutput, Event, SensorStream, magnitude};

/// The online state machine. One instance per session; call
/// `process_sample` once per incoming sample, in order, without
/// reentrancy.
#[derive(Debug, Clone)]
pub struct StreamingDetector {
    cfg: StreamingConfig,
    fusion: StreamingFusion,
    baseline: BaselineTracker,
    last_confirmed_time: f64,
    candidate: Option<Candidate>,
    prev_score: f64,
    in_peak: bool,
    count: usize,
}

impl StreamingDetector {
    pub fn new(cfg: StreamingConfig) -> Self {
        let baseline = BaselineTracker::new(cfg.baseline_alpha, cfg.hampel_k);
        StreamingDetector {
            cfg,
            fusion: StreamingFusion::new(),
            baseline,
            last_confirmed_time: f64::NEG_INFINITY,
            candidate: None,
            prev_score: f64::NEG_INFINITY,
            in_peak: false,
            count: 0,
        }
    }

    /// Feed one sample. Returns `Some(Event)` the instant a previously
    /// opened candidate clears the confirm threshold.
    pub fn process_sample(&mut self, t: f64, a_xyz: [f64; 3], g_xyz: [f64; 3]) -> Option<Event> {
        self.step(t, a_xyz, g_xyz).0
    }

    /// Like `process_sample`, but also returns the instantaneous fusion
    /// score and liberal threshold, for batch callers that want dense
    /// arrays alongside the event stream.
    fn step(&mut self, t: f64, a_xyz: [f64; 3], g_xyz: [f64; 3]) -> (Option<Event>, f64, f64) {
        let idx = self.count;
        self.count += 1;

        let s = self.fusion.process(a_xyz, g_xyz);
        self.baseline.update(s);
        let thr_lib = self.baseline.get_threshold(self.cfg.k_mad_liberal);

        if let Some(cand) = self.candidate {
            if t >= cand.time + self.cfg.decision_latency_s {
                if let Some(event) = self.confirm(cand) {
                    return (Some(event), s, thr_lib);
                }
            }
        }

        if t < self.last_confirmed_time + self.cfg.min_interval_s {
            return (None, s, thr_lib);
        }

        let is_rising = s > self.prev_score;
        if is_rising && s > thr_lib && !self.in_peak {
            self.in_peak = true;
        } else if self.in_peak && !is_rising {
            self.in_peak = false;
            if self.prev_score > thr_lib {
                let tentative = Candidate {
                    index: idx,
                    time: t,
                    score: self.prev_score,
                    threshold: thr_lib,
                    acc_peak: magnitude(a_xyz),
                    gyro_peak: magnitude(g_xyz),
                };
                match self.candidate {
                    None => self.candidate = Some(tentative),
                    Some(existing) if tentative.score > existing.score => {
                        self.candidate = Some(tentative)
                    }
                    _ => {}
                }
            }
        }

        self.prev_score = s;
        (None, s, thr_lib)
    }

    /// Clears the stricter confirm threshold or the candidate is dropped
    /// silently; either way the pending candidate slot is freed.
    fn confirm(&mut self, candidate: Candidate) -> Option<Event> {
        let thr_conf = self.baseline.get_threshold(self.cfg.k_mad_confirm);
        self.candidate = None;
        if candidate.score >= thr_conf {
            self.last_confirmed_time = candidate.time;
            Some(Event::from(candidate))
        } else {
            None
        }
    }

    /// End-of-stream confirmation check for batch drivers.
    pub fn finish(&mut self, t_last: f64) -> Option<Event> {
        if let Some(cand) = self.candidate {
            if t_last >= cand.time + self.cfg.decision_latency_s {
                return self.confirm(cand);
            }
        }
        None
    }
}

/// Replays a whole `SensorStream` through a fresh `StreamingDetector`,
/// producing the same `DetectorOutput` shape the offline and two-stage
/// detectors do.
pub fn run(stream: Arc<SensorStream>, cfg: &StreamingConfig) -> Result<DetectorOutput, DetectorError> {
    let n = stream.len();
    if n < 3 {
        return Err(DetectorError::Precondition(format!(
            "N = {n} < 3 samples required"
        )));
    }

    let mut detector = StreamingDetector::new(cfg.clone());
    let mut score = Vec::with_capacity(n);
    let mut threshold = Vec::with_capacity(n);
    let mut events = Vec::new();

    for i in 0..n {
        let (event, s, thr) = detector.step(stream.t[i], stream.a_xyz[i], stream.g_xyz[i]);
        score.push(s);
        threshold.push(thr);
        if let Some(e) = event {
            events.push(e);
        }
    }
    if let Some(e) = detector.finish(stream.t[n - 1]) {
        events.push(e);
    }

    Ok(DetectorOutput {
        detector_type: DetectorKind::Streaming,
        events,
        score,
        threshold,
        components: None,
        rejected: None,
        params: DetectorConfig::Streaming(cfg.clone()),
        stream,
    })
}
