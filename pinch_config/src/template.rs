//! Template bundle persistence: a trained set of normalized templates,
//! saved as JSON alongside the configuration they were trained under.
//! `serde_json` is the wire format here; TOML remains reserved for
//! `DetectorConfig`.

use serde::{Deserialize, Serialize};

/// The critical configuration a template bundle was trained under. Loading
/// a bundle whose fields deviate from the current `TwoStageConfig` by more
/// than 0.1 is a warning, not a load failure.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TemplateBundleConfig {
    pub fs: f64,
    pub bandpass_low: f64,
    pub bandpass_high: f64,
    pub template_length: usize,
}

impl TemplateBundleConfig {
    /// Returns the field names that deviate from `other` by more than
    /// `tolerance`. An empty result means the bundle is consistent with
    /// the current run.
    pub fn deviations(&self, other: &TemplateBundleConfig, tolerance: f64) -> Vec<&'static str> {
        let mut out = Vec::new();
        if (self.fs - other.fs).abs() > tolerance {
            out.push("fs");
        }
        if (self.bandpass_low - other.bandpass_low).abs() > tolerance {
            out.push("bandpass_low");
        }
        if (self.bandpass_high - other.bandpass_high).abs() > tolerance {
            out.push("bandpass_high");
        }
        if self.template_length != other.template_length {
            out.push("template_length");
        }
        out
    }
}

/// Provenance metadata carried alongside a bundle, for human debugging only
/// — never consulted by the verifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplateProvenance {
    pub filename: String,
    pub duration_s: f64,
    pub fs: f64,
    /// ISO-8601 creation timestamp, stamped by the caller at save time.
    pub created: String,
}

/// A persisted set of templates plus the configuration they were trained
/// under.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplateBundle {
    /// K templates, each of length `template_length`.
    pub templates: Vec<Vec<f64>>,
    pub template_length: usize,
    pub confidence_threshold: f64,
    pub max_lag: usize,
    pub config: TemplateBundleConfig,
    pub provenance: TemplateProvenance,
}

impl TemplateBundle {
    pub fn to_json_string(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn from_json_str(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }
}
