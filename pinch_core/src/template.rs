//! TemplateVerifier: normalized cross-correlation scoring of a candidate
//! window against a learned template set, with small lag search.
//!
//! There is deliberately no low-confidence-threshold debug bypass here —
//! that kind of shortcut belongs in a test harness, not the verifier
//! itself.

use pinch_config::{TemplateBundle, TemplateBundleConfig};
use pinch_traits::{WarnKind, WarnSink, Warning};

/// Zero-mean, unit-variance normalization. A near-zero standard deviation
/// is left mean-centered only (dividing would just reinject noise).
pub fn normalize(x: &[f64]) -> Vec<f64> {
    let n = x.len() as f64;
    if x.is_empty() {
        return Vec::new();
    }
    let mean = x.iter().sum::<f64>() / n;
    let centered: Vec<f64> = x.iter().map(|v| v - mean).collect();
    let var = centered.iter().map(|v| v * v).sum::<f64>() / n;
    let std = var.sqrt();
    if std > 1e-6 {
        centered.iter().map(|v| v / std).collect()
    } else {
        centered
    }
}

/// Linear resampling to exactly `l_new` samples.
pub fn resample_linear(x: &[f64], l_new: usize) -> Vec<f64> {
    let n = x.len();
    if n == l_new || l_new == 0 {
        return x.to_vec();
    }
    if n <= 1 {
        return vec![x.first().copied().unwrap_or(0.0); l_new];
    }
    if l_new == 1 {
        return vec![x[n / 2]];
    }
    (0..l_new)
        .map(|i| {
            let pos = i as f64 * (n - 1) as f64 / (l_new - 1) as f64;
            let lo = pos.floor() as usize;
            let hi = (lo + 1).min(n - 1);
            let frac = pos - lo as f64;
            x[lo] * (1.0 - frac) + x[hi] * frac
        })
        .collect()
}

fn correlate_at_lag(window: &[f64], template: &[f64], lag: i32) -> f64 {
    let l = window.len();
    let (w, t) = if lag >= 0 {
        let lag = lag as usize;
        if lag >= l {
            return 0.0;
        }
        (&window[lag..], &template[..l - lag])
    } else {
        let lag = (-lag) as usize;
        if lag >= l {
            return 0.0;
        }
        (&window[..l - lag], &template[lag..])
    };
    let overlap = w.len();
    if overlap == 0 {
        return 0.0;
    }
    let sum: f64 = w.iter().zip(t.iter()).map(|(a, b)| a * b).sum();
    sum / overlap as f64
}

/// Scores candidate windows against a learned template set.
#[derive(Debug, Clone)]
pub struct TemplateVerifier {
    templates: Vec<Vec<f64>>,
    template_length: usize,
    max_lag: usize,
    confidence_threshold: f64,
}

impl TemplateVerifier {
    pub fn new(template_length: usize, max_lag: usize, confidence_threshold: f64) -> Self {
        TemplateVerifier {
            templates: Vec::new(),
            template_length,
            max_lag,
            confidence_threshold,
        }
    }

    /// Loads a persisted bundle. A critical-config mismatch (> 0.1 in any
    /// field) is a warning, not a load failure.
    pub fn from_bundle(
        bundle: &TemplateBundle,
        current: &TemplateBundleConfig,
        warn_sink: &mut dyn WarnSink,
    ) -> Self {
        let deviations = bundle.config.deviations(current, 0.1);
        if !deviations.is_empty() {
            warn_sink.warn(Warning::new(
                WarnKind::TemplateMismatch,
                format!("template bundle config differs in: {}", deviations.join(", ")),
            ));
        }
        TemplateVerifier {
            templates: bundle.templates.clone(),
            template_length: bundle.template_length,
            max_lag: bundle.max_lag,
            confidence_threshold: bundle.confidence_threshold,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    pub fn template_count(&self) -> usize {
        self.templates.len()
    }

    /// Extracts, resamples, and normalizes a raw window as a new template.
    pub fn add_template(&mut self, raw_window: &[f64]) {
        let resampled = resample_linear(raw_window, self.template_length);
        self.templates.push(normalize(&resampled));
    }

    /// Scores `window` against every template over every lag in
    /// `[-max_lag, max_lag]`. With no templates loaded, returns `(0.0,
    /// false)` and never panics.
    pub fn verify(&self, window: &[f64]) -> (f64, bool) {
        if self.templates.is_empty() {
            return (0.0, false);
        }
        let resampled = if window.len() == self.template_length {
            window.to_vec()
        } else {
            resample_linear(window, self.template_length)
        };
        let normalized = normalize(&resampled);
        let max_lag = self.max_lag as i32;

        let mut best = f64::NEG_INFINITY;
        for template in &self.templates {
            for lag in -max_lag..=max_lag {
                let c = correlate_at_lag(&normalized, template, lag);
                if c > best {
                    best = c;
                }
            }
        }
        let valid = best >= self.confidence_threshold;
        (best, valid)
    }
}
