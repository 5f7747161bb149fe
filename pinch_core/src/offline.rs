//! Offline detector: batch adaptive-z-score pipeline with full rejection
//! bookkeeping.
//!
//! Candidates are walked in scan-index order (not score order) through an
//! ordered chain of gates: refractory period, local-max check, amplitude
//! gates, then minimum inter-event spacing. A candidate that fails any gate
//! is recorded in the matching rejection bucket rather than discarded.

use std::sync::Arc;

use pinch_config::{DetectorConfig, OfflineConfig};

use crate::error::DetectorError;
use crate::fusion::offline_fusion;
use crate::kernels::{adaptive_threshold, hp_moving_mean, jerk, robust_z};
use crate::model::{
    Candidate, DetectorKind, DetectorOutput, Event, FusionComponents, RejectionBucket,
    RejectionLedger, SensorStream,
};

fn window_max(x: &[f64], i: usize, half_width: usize) -> f64 {
    let n = x.len();
    let lo = i.saturating_sub(half_width);
    let hi = (i + half_width).min(n - 1);
    x[lo..=hi].iter().copied().fold(f64::NEG_INFINITY, f64::max)
}

/// First index of the maximum value in `x`, ties broken toward the left
/// (matching `argmax` semantics).
fn argmax_first(x: &[f64]) -> usize {
    let mut best_i = 0;
    let mut best_v = x[0];
    for (i, v) in x.iter().enumerate().skip(1) {
        if *v > best_v {
            best_v = *v;
            best_i = i;
        }
    }
    best_i
}

/// Runs the offline detector over a whole session.
pub fn run(
    stream: Arc<SensorStream>,
    cfg: &OfflineConfig,
    collect_rejections: bool,
) -> Result<DetectorOutput, DetectorError> {
    let n = stream.len();
    if n < 3 {
        return Err(DetectorError::Precondition(format!(
            "N = {n} < 3 samples required"
        )));
    }
    let fs = stream.fs;
    let dt = 1.0 / fs;

    let a_hp = hp_moving_mean(&stream.a_mag, fs, cfg.hp_win);
    let da = jerk(&a_hp, dt);
    let dg = jerk(&stream.g_mag, dt);
    let da_abs: Vec<f64> = da.iter().map(|v| v.abs()).collect();
    let dg_abs: Vec<f64> = dg.iter().map(|v| v.abs()).collect();

    let z_a = robust_z(&a_hp, fs, cfg.thr_win);
    let z_g = robust_z(&stream.g_mag, fs, cfg.thr_win);
    let z_da = robust_z(&da_abs, fs, cfg.thr_win);
    let z_dg = robust_z(&dg_abs, fs, cfg.thr_win);

    let score = offline_fusion(&z_a, &z_g, &z_da, &z_dg);
    let threshold = adaptive_threshold(&score, fs, cfg.thr_win, cfg.k_mad);

    let refractory_samples = (cfg.refractory_s * fs).round() as i64;
    let peakwin_samples = (cfg.peakwin_s * fs).round().max(0.0) as usize;
    let gatewin_samples = (cfg.gatewin_s * fs).round().max(0.0) as usize;
    let min_iei_samples = (cfg.min_iei_s * fs).round() as i64;

    let mut events: Vec<Event> = Vec::new();
    let mut ledger = RejectionLedger::default();
    let mut last_accepted: Option<usize> = None;

    for i in 0..n {
        if !(score[i] > threshold[i]) {
            continue;
        }

        let acc_peak = window_max(&a_hp, i, gatewin_samples);
        let gyro_peak = window_max(&stream.g_mag, i, gatewin_samples);
        let candidate = Candidate {
            index: i,
            time: stream.t[i],
            score: score[i],
            threshold: threshold[i],
            acc_peak,
            gyro_peak,
        };

        // a. Refractory.
        if let Some(last) = last_accepted {
            if (i as i64 - last as i64) < refractory_samples {
                if collect_rejections {
                    ledger.push(RejectionBucket::Refractory, candidate);
                }
                continue;
            }
        }

        // b. Local-maximum test.
        let lo = i.saturating_sub(peakwin_samples);
        let hi = (i + peakwin_samples).min(n - 1);
        let local_argmax = lo + argmax_first(&score[lo..=hi]);
        if local_argmax != i {
            if collect_rejections {
                ledger.push(RejectionBucket::NotPeak, candidate);
            }
            continue;
        }

        // c. Amplitude gates.
        let acc_fail = acc_peak < cfg.acc_gate;
        let gyro_fail = gyro_peak < cfg.gyro_gate;
        if acc_fail || gyro_fail {
            if collect_rejections {
                if acc_fail {
                    ledger.push(RejectionBucket::AccGate, candidate);
                }
                if gyro_fail {
                    ledger.push(RejectionBucket::GyroGate, candidate);
                }
            }
            continue;
        }

        // d. Minimum inter-event interval.
        if let Some(last) = last_accepted {
            if (i as i64 - last as i64) < min_iei_samples {
                if collect_rejections {
                    ledger.push(RejectionBucket::MinIei, candidate);
                }
                continue;
            }
        }

        // e. Accept.
        events.push(Event::from(candidate));
        last_accepted = Some(i);
    }

    Ok(DetectorOutput {
        detector_type: DetectorKind::Offline,
        events,
        score,
        threshold,
        components: Some(FusionComponents {
            a_hp,
            z_a,
            z_g,
            z_da,
            z_dg,
        }),
        rejected: if collect_rejections { Some(ledger) } else { None },
        params: DetectorConfig::Stationary(cfg.clone()),
        stream,
    })
}
