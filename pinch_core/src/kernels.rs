//! Signal kernels: pure numerical primitives shared by every detector.
//! Numerical policy: double precision throughout, NaN propagates,
//! `SCALE_EPS = 1e-9` and `SIGMA_FLOOR = 1e-6` are fixed.

/// Scale epsilon added to every robust-z / adaptive-threshold denominator.
pub const SCALE_EPS: f64 = 1e-9;
/// Floor applied to any recomputed sigma so a perfectly flat signal never
/// divides by zero.
pub const SIGMA_FLOOR: f64 = 1e-6;

/// `‖v‖₂` for a triaxial sample.
pub fn magnitude(v: [f64; 3]) -> f64 {
    (v[0] * v[0] + v[1] * v[1] + v[2] * v[2]).sqrt()
}

/// Median of a finite slice. Sorts a copy; callers on a hot path should
/// batch calls rather than calling this per-sample on large data.
pub fn median(data: &[f64]) -> f64 {
    if data.is_empty() {
        return f64::NAN;
    }
    let mut v: Vec<f64> = data.to_vec();
    v.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let n = v.len();
    if n % 2 == 1 {
        v[n / 2]
    } else {
        (v[n / 2 - 1] + v[n / 2]) / 2.0
    }
}

/// Median absolute deviation around a given center: `median(|x - center|)`.
pub fn mad_around(data: &[f64], center: f64) -> f64 {
    let residuals: Vec<f64> = data.iter().map(|v| (v - center).abs()).collect();
    median(&residuals)
}

/// `MAD(x) = median(|x - median(x)|)`.
pub fn mad(data: &[f64]) -> f64 {
    let center = median(data);
    mad_around(data, center)
}

/// Inclusive `[lo, hi]` bounds of a centered rolling window of width `w`
/// around index `i`, clamped to `[0, n-1]` — the window shrinks rather than
/// padding at either edge, so every index has at least one sample.
pub(crate) fn centered_window_bounds(n: usize, i: usize, w: usize) -> (usize, usize) {
    let left_half = w / 2;
    let right_half = w.saturating_sub(1).saturating_sub(left_half);
    let lo = i.saturating_sub(left_half);
    let hi = (i + right_half).min(n.saturating_sub(1));
    (lo, hi)
}

/// `y[i] = x[i] - mean(x[i - w/2 .. i + w/2])`, centered window
/// `w = max(1, round(win*fs))`, min-periods 1.
pub fn hp_moving_mean(x: &[f64], fs: f64, win: f64) -> Vec<f64> {
    let n = x.len();
    let w = ((win * fs).round() as i64).max(1) as usize;
    let mut out = vec![0.0; n];
    for (i, out_i) in out.iter_mut().enumerate() {
        let (lo, hi) = centered_window_bounds(n, i, w);
        let window = &x[lo..=hi];
        let mean = window.iter().sum::<f64>() / window.len() as f64;
        *out_i = x[i] - mean;
    }
    out
}

/// Robust z-score over a centered rolling window,
/// `w = max(3, round(win*fs))`, min-periods `max(1, w/4)`. Zero local MADs
/// are replaced by the global median of the positive local MADs, or 1.0 if
/// none exist.
pub fn robust_z(x: &[f64], fs: f64, win: f64) -> Vec<f64> {
    let n = x.len();
    let w = ((win * fs).round() as i64).max(3) as usize;
    let min_periods = (w / 4).max(1);

    let mut local_med = vec![f64::NAN; n];
    let mut local_mad = vec![f64::NAN; n];
    for i in 0..n {
        let (lo, hi) = centered_window_bounds(n, i, w);
        if hi - lo + 1 < min_periods {
            continue;
        }
        let window = &x[lo..=hi];
        let med = median(window);
        local_med[i] = med;
        local_mad[i] = mad_around(window, med);
    }

    let positive_mads: Vec<f64> = local_mad
        .iter()
        .copied()
        .filter(|v| v.is_finite() && *v > 0.0)
        .collect();
    let fallback_mad = if positive_mads.is_empty() {
        1.0
    } else {
        median(&positive_mads)
    };

    let mut out = vec![f64::NAN; n];
    for i in 0..n {
        if !local_med[i].is_finite() {
            continue;
        }
        let d = if local_mad[i] > 0.0 {
            local_mad[i]
        } else {
            fallback_mad
        };
        out[i] = (x[i] - local_med[i]) / (1.4826 * d + SCALE_EPS);
    }
    out
}

/// `median + k * (1.4826*MAD + SCALE_EPS)` over a centered rolling window,
/// `w = max(3, round(win*fs))`, min-periods `max(1, round(0.75*fs))`.
pub fn adaptive_threshold(score: &[f64], fs: f64, win: f64, k: f64) -> Vec<f64> {
    let n = score.len();
    let w = ((win * fs).round() as i64).max(3) as usize;
    let min_periods = ((0.75 * fs).round() as i64).max(1) as usize;

    let mut out = vec![f64::NAN; n];
    for i in 0..n {
        let (lo, hi) = centered_window_bounds(n, i, w);
        if hi - lo + 1 < min_periods {
            continue;
        }
        let window = &score[lo..=hi];
        let med = median(window);
        let d = mad_around(window, med);
        out[i] = med + k * (1.4826 * d + SCALE_EPS);
    }
    out
}

/// Teager-Kaiser Energy Operator: `ψ[i] = x[i]² - x[i-1]·x[i+1]` for
/// interior samples, `ψ[0]=x[0]²`, `ψ[N-1]=x[N-1]²`. Clamped to `≥ 0`.
pub fn tkeo(x: &[f64]) -> Vec<f64> {
    let n = x.len();
    let mut out = vec![0.0; n];
    if n == 0 {
        return out;
    }
    out[0] = x[0] * x[0];
    out[n - 1] = x[n - 1] * x[n - 1];
    for i in 1..n.saturating_sub(1) {
        out[i] = x[i] * x[i] - x[i - 1] * x[i + 1];
    }
    for v in out.iter_mut() {
        if *v < 0.0 {
            *v = 0.0;
        }
    }
    out
}

/// Central-difference derivative (`np.gradient` semantics): one-sided at
/// the edges, central difference `(x[i+1]-x[i-1])/(2*dt)` in the interior.
pub fn jerk(x: &[f64], dt: f64) -> Vec<f64> {
    let n = x.len();
    let mut out = vec![0.0; n];
    if n < 2 {
        return out;
    }
    out[0] = (x[1] - x[0]) / dt;
    out[n - 1] = (x[n - 1] - x[n - 2]) / dt;
    for i in 1..n - 1 {
        out[i] = (x[i + 1] - x[i - 1]) / (2.0 * dt);
    }
    out
}

/// A single second-order ("biquad") IIR section, direct form I.
#[derive(Debug, Clone, Copy)]
struct Biquad {
    b0: f64,
    b1: f64,
    b2: f64,
    a1: f64,
    a2: f64,
}

impl Biquad {
    /// Maximally-flat (Butterworth, Q = 1/√2) low-pass at cutoff `fc`.
    fn lowpass(fc: f64, fs: f64) -> Self {
        let (b0, b1, b2, a1, a2) = Self::coeffs(fc, fs, Kind::Low);
        Biquad { b0, b1, b2, a1, a2 }
    }

    /// Maximally-flat (Butterworth, Q = 1/√2) high-pass at cutoff `fc`.
    fn highpass(fc: f64, fs: f64) -> Self {
        let (b0, b1, b2, a1, a2) = Self::coeffs(fc, fs, Kind::High);
        Biquad { b0, b1, b2, a1, a2 }
    }

    fn coeffs(fc: f64, fs: f64, kind: Kind) -> (f64, f64, f64, f64, f64) {
        let q = std::f64::consts::FRAC_1_SQRT_2;
        let omega = 2.0 * std::f64::consts::PI * fc / fs;
        let (sn, cs) = omega.sin_cos();
        let alpha = sn / (2.0 * q);
        let (b0, b1, b2) = match kind {
            Kind::Low => ((1.0 - cs) / 2.0, 1.0 - cs, (1.0 - cs) / 2.0),
            Kind::High => ((1.0 + cs) / 2.0, -(1.0 + cs), (1.0 + cs) / 2.0),
        };
        let a0 = 1.0 + alpha;
        let a1 = -2.0 * cs;
        let a2 = 1.0 - alpha;
        (b0 / a0, b1 / a0, b2 / a0, a1 / a0, a2 / a0)
    }

    fn apply(&self, x: &[f64]) -> Vec<f64> {
        let mut y = vec![0.0; x.len()];
        let (mut x1, mut x2, mut y1, mut y2) = (0.0, 0.0, 0.0, 0.0);
        for (i, xi) in x.iter().copied().enumerate() {
            let yi = self.b0 * xi + self.b1 * x1 + self.b2 * x2 - self.a1 * y1 - self.a2 * y2;
            y[i] = yi;
            x2 = x1;
            x1 = xi;
            y2 = y1;
            y1 = yi;
        }
        y
    }

    /// Zero-phase forward-backward application (a `filtfilt` analogue):
    /// filter forward, reverse, filter again, reverse back.
    fn filtfilt(&self, x: &[f64]) -> Vec<f64> {
        let forward = self.apply(x);
        let mut reversed: Vec<f64> = forward.into_iter().rev().collect();
        reversed = self.apply(&reversed);
        reversed.reverse();
        reversed
    }
}

#[derive(Debug, Clone, Copy)]
enum Kind {
    Low,
    High,
}

/// Zero-phase band-pass: a Butterworth high-pass at `lo` cascaded with a
/// Butterworth low-pass at `hi`, each applied forward-backward. This is a
/// cascaded-biquad rendering of "order 2, zero-phase forward-backward
/// Butterworth band-pass"; it is numerically close to, but not
/// bit-identical with, a single four-pole bandpass prototype transformed
/// in one step (see DESIGN.md).
pub fn bandpass(x: &[f64], fs: f64, lo: f64, hi: f64, _order: usize) -> Vec<f64> {
    if x.is_empty() {
        return Vec::new();
    }
    let hp = Biquad::highpass(lo, fs);
    let lp = Biquad::lowpass(hi, fs);
    let stage1 = hp.filtfilt(x);
    lp.filtfilt(&stage1)
}
