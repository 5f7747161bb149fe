//! TwoStageDetector: band-pass + per-axis TKEO + multi-modal adaptive
//! gating, with template verification as a second confirmation stage.
//!
//! Each axis is band-passed, then run through TKEO; the accel and gyro
//! channels are each L2-fused across axes, then combined into one fusion
//! score. The gate checks three independent `BaselineTracker`s (accel,
//! gyro, fusion) rather than the fusion channel alone, which is what makes
//! stage one more conservative than the offline detector's single adaptive
//! threshold.

use std::sync::Arc;

use pinch_config::{DetectorConfig, TwoStageConfig};

use crate::baseline::BaselineTracker;
use crate::error::DetectorError;
use crate::fusion::{l2_fuse_axes, twostage_fusion};
use crate::kernels::{bandpass, tkeo};
use crate::model::{Candidate, DetectorKind, DetectorOutput, Event, SensorStream};
use crate::template::TemplateVerifier;

/// `BaselineTracker` EMA rate and Hampel gate shared by all three trackers.
/// `TwoStageConfig` exposes gate multipliers but not the tracker's own
/// smoothing rate; these match `StreamingConfig`'s defaults since both
/// trackers serve the same "slow online baseline" role.
const BASELINE_ALPHA: f64 = 1e-3;
const HAMPEL_K: f64 = 3.0;

/// Runs the two-stage detector over a whole session. `templates` is the
/// second-stage verifier a candidate must clear to become an event; with
/// `None`, or a verifier that has no templates loaded, the multi-modal gate
/// can never confirm a candidate on its own and the run emits nothing.
pub fn run(
    stream: Arc<SensorStream>,
    cfg: &TwoStageConfig,
    templates: Option<&TemplateVerifier>,
) -> Result<DetectorOutput, DetectorError> {
    let n = stream.len();
    if n < 3 {
        return Err(DetectorError::Precondition(format!(
            "N = {n} < 3 samples required"
        )));
    }
    let fs = stream.fs;

    let mut acc_axes: [Vec<f64>; 3] = [Vec::new(), Vec::new(), Vec::new()];
    let mut gyro_axes: [Vec<f64>; 3] = [Vec::new(), Vec::new(), Vec::new()];
    for k in 0..3 {
        let a_axis: Vec<f64> = stream.a_xyz.iter().map(|v| v[k]).collect();
        let g_axis: Vec<f64> = stream.g_xyz.iter().map(|v| v[k]).collect();
        let a_bp = bandpass(&a_axis, fs, cfg.bandpass_low, cfg.bandpass_high, 2);
        let g_bp = bandpass(&g_axis, fs, cfg.bandpass_low, cfg.bandpass_high, 2);
        acc_axes[k] = tkeo(&a_bp);
        gyro_axes[k] = tkeo(&g_bp);
    }
    let acc_tkeo = l2_fuse_axes(&acc_axes[0], &acc_axes[1], &acc_axes[2]);
    let gyro_tkeo = l2_fuse_axes(&gyro_axes[0], &gyro_axes[1], &gyro_axes[2]);
    let fused = twostage_fusion(
        &acc_tkeo,
        &gyro_tkeo,
        cfg.fusion_weight_accel,
        cfg.fusion_weight_gyro,
        cfg.fusion_method,
    );

    let mut accel_baseline = BaselineTracker::new(BASELINE_ALPHA, HAMPEL_K);
    let mut gyro_baseline = BaselineTracker::new(BASELINE_ALPHA, HAMPEL_K);
    let mut fusion_baseline = BaselineTracker::new(BASELINE_ALPHA, HAMPEL_K);

    let warmup_samples = (cfg.warmup_s * fs).round().max(0.0) as usize;
    let refractory_samples = (cfg.refractory_period_s * fs).round().max(0.0) as i64;
    let half_window = ((cfg.verification_window_s * fs / 2.0).round().max(1.0)) as usize;

    let mut score = Vec::with_capacity(n);
    let mut threshold = Vec::with_capacity(n);
    let mut events = Vec::new();
    let mut last_event_index: Option<usize> = None;

    for i in 0..n {
        accel_baseline.update(acc_tkeo[i]);
        gyro_baseline.update(gyro_tkeo[i]);
        fusion_baseline.update(fused[i]);

        let thr_fusion = fusion_baseline.get_threshold(cfg.gate_k_fusion);
        score.push(fused[i]);
        threshold.push(thr_fusion);

        if i < warmup_samples {
            continue;
        }

        let gate = fused[i] > thr_fusion
            && acc_tkeo[i] > accel_baseline.get_threshold(cfg.gate_k_accel)
            && gyro_tkeo[i] > gyro_baseline.get_threshold(cfg.gate_k_gyro);
        if !gate {
            continue;
        }

        if let Some(last) = last_event_index {
            if (i as i64 - last as i64) < refractory_samples {
                tracing::debug!(
                    index = i,
                    "two-stage gate triggered but suppressed by refractory period"
                );
                continue;
            }
        }

        let lo = i.saturating_sub(half_window);
        let hi = (i + half_window).min(n - 1);
        let window = &fused[lo..=hi];

        // No verifier, or one with no templates loaded, can never confirm a
        // candidate: the gate alone is not sufficient to emit an event.
        let accept = match templates {
            Some(verifier) if !verifier.is_empty() => {
                let (template_score, valid) = verifier.verify(window);
                tracing::debug!(index = i, template_score, valid, "two-stage candidate verified");
                valid
            }
            _ => false,
        };
        if !accept {
            continue;
        }

        events.push(Event::from(Candidate {
            index: i,
            time: stream.t[i],
            score: fused[i],
            threshold: thr_fusion,
            acc_peak: stream.a_mag[i],
            gyro_peak: stream.g_mag[i],
        }));
        last_event_index = Some(i);
    }

    Ok(DetectorOutput {
        detector_type: DetectorKind::TwoStage,
        events,
        score,
        threshold,
        components: None,
        rejected: None,
        params: DetectorConfig::TwoStage(cfg.clone()),
        stream,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_stream(n: usize, fs: f64) -> Arc<SensorStream> {
        let mut sink = pinch_traits::NullWarnSink;
        let t: Vec<f64> = (0..n).map(|i| i as f64 / fs).collect();
        let a = vec![[0.0, 0.0, 1.0]; n];
        let g = vec![[0.0, 0.0, 0.0]; n];
        Arc::new(SensorStream::new(t, a, g, &mut sink).unwrap())
    }

    fn impulse_stream(fs: f64, duration_s: f64, impulse_times: &[f64]) -> Arc<SensorStream> {
        let mut sink = pinch_traits::NullWarnSink;
        let n = (duration_s * fs) as usize;
        let t: Vec<f64> = (0..n).map(|i| i as f64 / fs).collect();
        let mut a = vec![[0.0, 0.0, 1.0]; n];
        let mut g = vec![[0.0, 0.0, 0.0]; n];
        for &ti in impulse_times {
            let idx = (ti * fs).round() as usize;
            if idx < n {
                a[idx] = [0.3, 0.0, 1.0];
                g[idx] = [2.0, 0.0, 0.0];
            }
        }
        Arc::new(SensorStream::new(t, a, g, &mut sink).unwrap())
    }

    #[test]
    fn flat_stream_emits_nothing() {
        let stream = make_stream(600, 100.0);
        let cfg = TwoStageConfig::default();
        let out = run(stream, &cfg, None).unwrap();
        assert!(out.events.is_empty());
    }

    #[test]
    fn without_templates_no_events_ever_emit() {
        // The gate alone is never enough to confirm a candidate.
        let stream = impulse_stream(100.0, 6.0, &[1.0, 2.0, 3.0, 4.0]);
        let cfg = TwoStageConfig::default();
        let out = run(stream, &cfg, None).unwrap();
        assert!(out.events.is_empty());
    }

    #[test]
    fn events_respect_refractory_period() {
        let stream = impulse_stream(100.0, 6.0, &[1.0, 1.05, 1.10]);
        let cfg = TwoStageConfig::default();
        let mut templates = TemplateVerifier::new(cfg.template_length, cfg.max_lag, 0.0);
        templates.add_template(&vec![1.0; cfg.template_length]);
        let out = run(stream, &cfg, Some(&templates)).unwrap();
        for w in out.events.windows(2) {
            assert!(w[1].time - w[0].time >= cfg.refractory_period_s - 1e-9);
        }
    }

    #[test]
    fn empty_template_verifier_behaves_like_no_templates() {
        let stream = impulse_stream(100.0, 6.0, &[1.0, 2.0, 3.0]);
        let cfg = TwoStageConfig::default();
        let verifier = TemplateVerifier::new(cfg.template_length, cfg.max_lag, cfg.template_confidence);
        let with_empty = run(stream.clone(), &cfg, Some(&verifier)).unwrap();
        let without = run(stream, &cfg, None).unwrap();
        assert_eq!(with_empty.events.len(), without.events.len());
        assert!(with_empty.events.is_empty());
    }

    #[test]
    fn warmup_suppresses_early_candidates() {
        // An impulse placed entirely inside the warmup window must never
        // fire, regardless of amplitude.
        let mut sink = pinch_traits::NullWarnSink;
        let fs = 100.0;
        let n = 200;
        let t: Vec<f64> = (0..n).map(|i| i as f64 / fs).collect();
        let mut a = vec![[0.0, 0.0, 1.0]; n];
        let mut g = vec![[0.0, 0.0, 0.0]; n];
        a[10] = [0.3, 0.0, 1.0];
        g[10] = [2.0, 0.0, 0.0];
        let stream = Arc::new(SensorStream::new(t, a, g, &mut sink).unwrap());
        let cfg = TwoStageConfig::default(); // warmup_s = 0.5 => first 50 samples
        let out = run(stream, &cfg, None).unwrap();
        assert!(out.events.iter().all(|e| e.index >= 50));
    }
}
