//! ThresholdDebugger: explains *why* a candidate peak in a dense
//! score/threshold pair was, or was not, promoted to an event, and
//! recommends a looser `k_mad` when real peaks are being missed.
//!
//! Peak-finding uses a height/spacing/prominence filter; for each of the
//! top-5 closest misses, the local median/MAD are recomputed over the same
//! `thr_win` window the adaptive threshold itself uses, giving the `k_mad`
//! that would have put the threshold exactly at the peak's score. The
//! recommendation is the mean of those five per-peak values.

use crate::kernels::{centered_window_bounds, mad_around, median, SCALE_EPS};

/// How urgently `recommended_k_mad` suggests loosening the threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecommendationRisk {
    /// Current `k_mad` looks fine; no missed peaks worth reporting.
    None,
    /// Recommended `k_mad` has dropped under 2.0 — a real but moderate
    /// false-positive risk if adopted as-is.
    Moderate,
    /// Recommended `k_mad` has dropped under 1.5 — adopting it verbatim is
    /// likely to flood the detector with spurious events.
    High,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MissedPeak {
    pub index: usize,
    pub time: f64,
    pub score: f64,
    pub threshold: f64,
    /// `threshold - score`; always positive for a missed peak, smaller is
    /// a closer miss.
    pub margin: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ThresholdDebugReport {
    pub total_peaks_found: usize,
    pub above_threshold: usize,
    /// The five closest misses, ordered by ascending margin.
    pub missed: Vec<MissedPeak>,
    pub current_k_mad: f64,
    pub recommended_k_mad: f64,
    pub risk: RecommendationRisk,
}

const MIN_PEAK_SPACING_S: f64 = 0.05;
const MIN_PROMINENCE: f64 = 1.0;
const HEIGHT_PERCENTILE: f64 = 75.0;
const TOP_N_MISSES: usize = 5;

fn percentile(data: &[f64], p: f64) -> f64 {
    let mut v: Vec<f64> = data.iter().copied().filter(|x| x.is_finite()).collect();
    if v.is_empty() {
        return f64::NAN;
    }
    v.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let n = v.len();
    if n == 1 {
        return v[0];
    }
    let rank = p / 100.0 * (n - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    if lo == hi {
        v[lo]
    } else {
        let frac = rank - lo as f64;
        v[lo] * (1.0 - frac) + v[hi] * frac
    }
}

/// Topographic prominence: peak height minus the higher of the two minima
/// found walking outward until a taller value (or the signal edge) is hit.
fn prominence(x: &[f64], i: usize) -> f64 {
    let h = x[i];
    let mut left_min = h;
    let mut j = i;
    while j > 0 {
        j -= 1;
        if x[j] > h {
            break;
        }
        left_min = left_min.min(x[j]);
    }
    let mut right_min = h;
    let mut k = i;
    while k + 1 < x.len() {
        k += 1;
        if x[k] > h {
            break;
        }
        right_min = right_min.min(x[k]);
    }
    h - left_min.max(right_min)
}

/// Local maxima at or above the 75th percentile of `x`, at least 50ms
/// apart, with prominence >= 1.0. A simplified, dependency-free analogue of
/// `scipy.signal.find_peaks(height=.., distance=.., prominence=..)`.
pub fn find_peaks(x: &[f64], fs: f64) -> Vec<usize> {
    let n = x.len();
    if n < 3 {
        return Vec::new();
    }
    let height_thr = percentile(x, HEIGHT_PERCENTILE);
    let min_spacing = ((MIN_PEAK_SPACING_S * fs).round() as i64).max(1) as usize;

    let mut candidates = Vec::new();
    for i in 1..n - 1 {
        if x[i] > x[i - 1] && x[i] >= x[i + 1] && x[i] >= height_thr {
            if prominence(x, i) >= MIN_PROMINENCE {
                candidates.push(i);
            }
        }
    }

    let mut by_height = candidates.clone();
    by_height.sort_by(|&a, &b| x[b].partial_cmp(&x[a]).unwrap_or(std::cmp::Ordering::Equal));

    let mut selected: Vec<usize> = Vec::new();
    for idx in by_height {
        let far_enough = selected
            .iter()
            .all(|&s| idx.abs_diff(s) >= min_spacing);
        if far_enough {
            selected.push(idx);
        }
    }
    selected.sort_unstable();
    selected
}

/// The `k_mad` that would put `median + k*(1.4826*MAD + SCALE_EPS)` exactly
/// at `peak_score`, using the local median/MAD recomputed over the centered
/// `thr_win` window around `i` — the same window `adaptive_threshold` uses.
fn k_mad_for_peak(score: &[f64], i: usize, fs: f64, thr_win: f64, peak_score: f64) -> f64 {
    let n = score.len();
    let w = ((thr_win * fs).round() as i64).max(3) as usize;
    let (lo, hi) = centered_window_bounds(n, i, w);
    let window = &score[lo..=hi];
    let med = median(window);
    let scale = 1.4826 * mad_around(window, med) + SCALE_EPS;
    (peak_score - med) / scale
}

/// Mean of the per-peak `k_mad` each of the (up to five) closest misses
/// would have needed to clear its own threshold.
fn recommend_k_mad(
    score: &[f64],
    missed: &[MissedPeak],
    fs: f64,
    thr_win: f64,
    current_k_mad: f64,
) -> f64 {
    if missed.is_empty() {
        return current_k_mad;
    }
    let needed: Vec<f64> = missed
        .iter()
        .map(|m| k_mad_for_peak(score, m.index, fs, thr_win, m.score))
        .collect();
    needed.iter().sum::<f64>() / needed.len() as f64
}

fn classify_risk(recommended_k_mad: f64, has_misses: bool) -> RecommendationRisk {
    if !has_misses {
        RecommendationRisk::None
    } else if recommended_k_mad < 1.5 {
        RecommendationRisk::High
    } else if recommended_k_mad < 2.0 {
        RecommendationRisk::Moderate
    } else {
        RecommendationRisk::None
    }
}

/// Analyzes a dense `score`/`threshold` pair (as produced in a
/// `DetectorOutput`) for peaks that cleared the peak-finding criteria but
/// never crossed the adaptive threshold.
pub fn analyze_missed_peaks(
    score: &[f64],
    threshold: &[f64],
    t: &[f64],
    fs: f64,
    thr_win: f64,
    current_k_mad: f64,
) -> ThresholdDebugReport {
    let peaks = find_peaks(score, fs);
    let mut above_threshold = 0;
    let mut missed = Vec::new();
    for &i in &peaks {
        if score[i] > threshold[i] {
            above_threshold += 1;
        } else {
            missed.push(MissedPeak {
                index: i,
                time: t[i],
                score: score[i],
                threshold: threshold[i],
                margin: threshold[i] - score[i],
            });
        }
    }
    missed.sort_by(|a, b| a.margin.partial_cmp(&b.margin).unwrap_or(std::cmp::Ordering::Equal));
    missed.truncate(TOP_N_MISSES);

    let recommended_k_mad = recommend_k_mad(score, &missed, fs, thr_win, current_k_mad);
    let risk = classify_risk(recommended_k_mad, !missed.is_empty());

    ThresholdDebugReport {
        total_peaks_found: peaks.len(),
        above_threshold,
        missed,
        current_k_mad,
        recommended_k_mad,
        risk,
    }
}
