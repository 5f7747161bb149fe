//! Deserializable detector configuration and template-bundle persistence.
//!
//! Every field carries a `#[serde(default)]` so a partial TOML document is
//! valid, and every default matches its documented reference value
//! exactly.

use serde::{Deserialize, Serialize};

pub mod error;
pub mod template;

pub use error::ConfigError;
pub use template::{TemplateBundle, TemplateBundleConfig, TemplateProvenance};

/// Offline (stationary) adaptive-z-score detector configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OfflineConfig {
    /// Centered moving-mean window, in seconds, used by `hp_moving_mean`.
    pub hp_win: f64,
    /// Rolling window, in seconds, used by `adaptive_threshold`.
    pub thr_win: f64,
    /// Threshold multiplier on the robust scale estimate.
    pub k_mad: f64,
    /// Minimum spacing enforced between a rejected candidate and the last
    /// accepted event, in seconds.
    pub refractory_s: f64,
    /// Half-width, in seconds, of the local-maximum test window.
    pub peakwin_s: f64,
    /// Half-width, in seconds, of the amplitude-gate window.
    pub gatewin_s: f64,
    /// Minimum inter-event interval enforced between consecutive events,
    /// in seconds.
    pub min_iei_s: f64,
    /// Minimum peak acceleration (after HP filtering), in g, within the
    /// gate window.
    pub acc_gate: f64,
    /// Minimum peak angular rate magnitude, in rad/s, within the gate
    /// window.
    pub gyro_gate: f64,
}

impl Default for OfflineConfig {
    fn default() -> Self {
        Self {
            hp_win: 0.5,
            thr_win: 3.0,
            k_mad: 5.5,
            refractory_s: 0.12,
            peakwin_s: 0.04,
            gatewin_s: 0.18,
            min_iei_s: 0.10,
            acc_gate: 0.025,
            gyro_gate: 0.10,
        }
    }
}

impl OfflineConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_positive("hp_win", self.hp_win)?;
        check_positive("thr_win", self.thr_win)?;
        check_positive("k_mad", self.k_mad)?;
        check_nonneg("refractory_s", self.refractory_s)?;
        check_positive("peakwin_s", self.peakwin_s)?;
        check_positive("gatewin_s", self.gatewin_s)?;
        check_nonneg("min_iei_s", self.min_iei_s)?;
        check_nonneg("acc_gate", self.acc_gate)?;
        check_nonneg("gyro_gate", self.gyro_gate)?;
        Ok(())
    }
}

/// Streaming (online) state-machine detector configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamingConfig {
    /// Physiological refractory: minimum spacing between confirmed events,
    /// in seconds.
    pub min_interval_s: f64,
    /// Maximum latency, in seconds, between a peak and its confirm/drop
    /// decision.
    pub decision_latency_s: f64,
    /// Liberal threshold multiplier used to open a candidate peak.
    pub k_mad_liberal: f64,
    /// Confirm threshold multiplier; a candidate must clear this to become
    /// an event.
    pub k_mad_confirm: f64,
    /// `BaselineTracker` EMA rate.
    pub baseline_alpha: f64,
    /// `BaselineTracker` Hampel gate multiplier.
    pub hampel_k: f64,
}

impl Default for StreamingConfig {
    fn default() -> Self {
        Self {
            min_interval_s: 0.300,
            decision_latency_s: 0.200,
            k_mad_liberal: 3.2,
            k_mad_confirm: 4.2,
            baseline_alpha: 1e-3,
            hampel_k: 3.0,
        }
    }
}

impl StreamingConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_nonneg("min_interval_s", self.min_interval_s)?;
        check_positive("decision_latency_s", self.decision_latency_s)?;
        check_positive("k_mad_liberal", self.k_mad_liberal)?;
        check_positive("k_mad_confirm", self.k_mad_confirm)?;
        if self.k_mad_confirm < self.k_mad_liberal {
            return Err(ConfigError::OutOfRange {
                field: "k_mad_confirm",
                detail: "must be >= k_mad_liberal".into(),
            });
        }
        if !(0.0..1.0).contains(&self.baseline_alpha) {
            return Err(ConfigError::OutOfRange {
                field: "baseline_alpha",
                detail: "must be in [0, 1)".into(),
            });
        }
        check_positive("hampel_k", self.hampel_k)?;
        Ok(())
    }
}

/// How the two-stage detector combines per-modality TKEO energy into a
/// single fusion score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FusionMethod {
    Additive,
    Multiplicative,
}

impl Default for FusionMethod {
    fn default() -> Self {
        FusionMethod::Additive
    }
}

/// Band-pass + TKEO + template-verified two-stage detector configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TwoStageConfig {
    /// Band-pass low edge, Hz.
    pub bandpass_low: f64,
    /// Band-pass high edge, Hz.
    pub bandpass_high: f64,
    /// `BaselineTracker` threshold multiplier for the acceleration TKEO
    /// channel.
    pub gate_k_accel: f64,
    /// `BaselineTracker` threshold multiplier for the gyroscope TKEO
    /// channel.
    pub gate_k_gyro: f64,
    /// `BaselineTracker` threshold multiplier for the fused channel; this
    /// is the gate actually used to open a candidate.
    pub gate_k_fusion: f64,
    /// Fusion weight applied to the acceleration TKEO channel.
    pub fusion_weight_accel: f64,
    /// Fusion weight applied to the gyroscope TKEO channel.
    pub fusion_weight_gyro: f64,
    pub fusion_method: FusionMethod,
    /// Template length in samples.
    pub template_length: usize,
    /// Maximum lag, in samples, searched during normalized
    /// cross-correlation.
    pub max_lag: usize,
    /// Minimum NCC score for a candidate to be promoted to an event.
    pub template_confidence: f64,
    /// Minimum spacing between consecutive events, in seconds.
    pub refractory_period_s: f64,
    /// Width, in seconds, of the window extracted around a candidate for
    /// template verification.
    pub verification_window_s: f64,
    /// Initial interval, in seconds, during which the gate cannot fire
    /// while baselines stabilize.
    pub warmup_s: f64,
}

impl Default for TwoStageConfig {
    fn default() -> Self {
        Self {
            bandpass_low: 3.0,
            bandpass_high: 20.0,
            gate_k_accel: 3.0,
            gate_k_gyro: 3.0,
            gate_k_fusion: 3.0,
            fusion_weight_accel: 1.0,
            fusion_weight_gyro: 1.5,
            fusion_method: FusionMethod::Additive,
            template_length: 16,
            max_lag: 3,
            template_confidence: 0.65,
            refractory_period_s: 0.2,
            verification_window_s: 0.16,
            warmup_s: 0.5,
        }
    }
}

impl TwoStageConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_positive("bandpass_low", self.bandpass_low)?;
        check_positive("bandpass_high", self.bandpass_high)?;
        if self.bandpass_high <= self.bandpass_low {
            return Err(ConfigError::OutOfRange {
                field: "bandpass_high",
                detail: "must be greater than bandpass_low".into(),
            });
        }
        check_positive("gate_k_accel", self.gate_k_accel)?;
        check_positive("gate_k_gyro", self.gate_k_gyro)?;
        check_positive("gate_k_fusion", self.gate_k_fusion)?;
        check_nonneg("fusion_weight_accel", self.fusion_weight_accel)?;
        check_nonneg("fusion_weight_gyro", self.fusion_weight_gyro)?;
        if self.template_length < 2 * self.max_lag + 1 {
            return Err(ConfigError::OutOfRange {
                field: "template_length",
                detail: "must be >= 2*max_lag + 1".into(),
            });
        }
        if !(0.0..=1.0).contains(&self.template_confidence) {
            return Err(ConfigError::OutOfRange {
                field: "template_confidence",
                detail: "must be in [0, 1]".into(),
            });
        }
        check_nonneg("refractory_period_s", self.refractory_period_s)?;
        check_positive("verification_window_s", self.verification_window_s)?;
        check_nonneg("warmup_s", self.warmup_s)?;
        Ok(())
    }
}

/// The tagged-variant `DetectorConfig` from the design notes: one of the
/// three detector kinds, carrying its own resolved configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "detector", rename_all = "kebab-case")]
pub enum DetectorConfig {
    Stationary(OfflineConfig),
    Streaming(StreamingConfig),
    TwoStage(TwoStageConfig),
}

impl DetectorConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        match self {
            DetectorConfig::Stationary(c) => c.validate(),
            DetectorConfig::Streaming(c) => c.validate(),
            DetectorConfig::TwoStage(c) => c.validate(),
        }
    }

    /// Parse a `DetectorConfig` from a TOML document, then validate it.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let cfg: DetectorConfig =
            toml::from_str(s).map_err(|e| ConfigError::Parse(e.to_string()))?;
        cfg.validate()?;
        Ok(cfg)
    }
}

fn check_positive(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::OutOfRange {
            field,
            detail: "must be finite and > 0".into(),
        })
    }
}

fn check_nonneg(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::OutOfRange {
            field,
            detail: "must be finite and >= 0".into(),
        })
    }
}
