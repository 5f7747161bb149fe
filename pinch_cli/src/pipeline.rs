//! The three subcommand pipelines: load a session, run the requested
//! detector or analysis over it, and hand the result to `pinch_io` (or
//! `pinch_config`) for persistence. Each subcommand is a plain function
//! rather than a trait object, since the set of subcommands is fixed and
//! small.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use eyre::{Result, WrapErr};
use pinch_config::{DetectorConfig, OfflineConfig, StreamingConfig, TemplateBundle, TemplateBundleConfig, TemplateProvenance, TwoStageConfig};
use pinch_core::{analyze_missed_peaks, Detector, TemplateVerifier};
use pinch_io::loader::ColumnMap;
use pinch_traits::TracingWarnSink;

use crate::cli::DetectorKindArg;

fn default_config_for(kind: DetectorKindArg) -> DetectorConfig {
    match kind {
        DetectorKindArg::Stationary => DetectorConfig::Stationary(OfflineConfig::default()),
        DetectorKindArg::Streaming => DetectorConfig::Streaming(StreamingConfig::default()),
        DetectorKindArg::TwoStage => DetectorConfig::TwoStage(TwoStageConfig::default()),
    }
}

/// Resolves a detector configuration from an optional TOML file, falling
/// back to `kind`'s defaults when no file is given.
fn load_detector_config(config: Option<&Path>, kind: DetectorKindArg) -> Result<DetectorConfig> {
    match config {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .wrap_err_with(|| format!("reading config file {path:?}"))?;
            DetectorConfig::from_toml_str(&text)
                .wrap_err_with(|| format!("parsing config file {path:?}"))
        }
        None => Ok(default_config_for(kind)),
    }
}

fn default_report_path(input: &Path) -> PathBuf {
    let mut out = input.as_os_str().to_owned();
    out.push(".report.json");
    PathBuf::from(out)
}

/// Runs `detect`: load the session, run the detector, write the report.
#[allow(clippy::too_many_arguments)]
pub fn run_detect(
    input: &Path,
    config: Option<&Path>,
    detector: DetectorKindArg,
    output: Option<&Path>,
    collect_rejections: bool,
    templates: Option<&Path>,
    expected_fs: f64,
) -> Result<PathBuf> {
    let cfg = load_detector_config(config, detector)?;
    let mut warn_sink = TracingWarnSink;
    let stream = Arc::new(pinch_io::load_session(
        input,
        &ColumnMap::default(),
        expected_fs,
        &mut warn_sink,
    )?);

    let verifier = match (templates, &cfg) {
        (Some(path), DetectorConfig::TwoStage(two_stage)) => {
            let text = std::fs::read_to_string(path)
                .wrap_err_with(|| format!("reading template bundle {path:?}"))?;
            let bundle = TemplateBundle::from_json_str(&text)
                .wrap_err_with(|| format!("parsing template bundle {path:?}"))?;
            let current = TemplateBundleConfig {
                fs: stream.fs,
                bandpass_low: two_stage.bandpass_low,
                bandpass_high: two_stage.bandpass_high,
                template_length: two_stage.template_length,
            };
            Some(TemplateVerifier::from_bundle(&bundle, &current, &mut warn_sink))
        }
        (Some(_), _) => None,
        (None, _) => None,
    };

    let detector = Detector::from_config(cfg);
    let result = detector.run(stream, verifier.as_ref(), collect_rejections)?;

    let out_path = output.map(Path::to_path_buf).unwrap_or_else(|| default_report_path(input));
    pinch_io::report::write_json(&result, input, &out_path)?;
    Ok(out_path)
}

/// Runs `debug-threshold`: always against the offline detector (the only
/// one with a single adaptive threshold the debugger's model fits).
pub fn run_debug_threshold(
    input: &Path,
    config: Option<&Path>,
    expected_fs: f64,
) -> Result<pinch_core::ThresholdDebugReport> {
    let cfg = load_detector_config(config, DetectorKindArg::Stationary)?;
    let offline_cfg = match cfg {
        DetectorConfig::Stationary(c) => c,
        _ => OfflineConfig::default(),
    };
    let mut warn_sink = TracingWarnSink;
    let stream = Arc::new(pinch_io::load_session(
        input,
        &ColumnMap::default(),
        expected_fs,
        &mut warn_sink,
    )?);

    let detector = Detector::from_config(DetectorConfig::Stationary(offline_cfg.clone()));
    let result = detector.run(stream.clone(), None, false)?;
    Ok(analyze_missed_peaks(
        &result.score,
        &result.threshold,
        &stream.t,
        stream.fs,
        offline_cfg.thr_win,
        offline_cfg.k_mad,
    ))
}

/// Runs `train-templates`: replay the two-stage detector's fusion score
/// with no verifier attached, extract a window around each supplied event
/// index, and persist the resulting bundle.
pub fn run_train_templates(
    input: &Path,
    config: Option<&Path>,
    event_indices: &[usize],
    output: &Path,
) -> Result<usize> {
    let cfg = load_detector_config(config, DetectorKindArg::TwoStage)?;
    let two_stage_cfg = match cfg {
        DetectorConfig::TwoStage(c) => c,
        _ => TwoStageConfig::default(),
    };
    let mut warn_sink = TracingWarnSink;
    let stream = Arc::new(pinch_io::load_session(
        input,
        &ColumnMap::default(),
        100.0,
        &mut warn_sink,
    )?);
    let duration_s = stream.t.last().copied().unwrap_or(0.0) - stream.t.first().copied().unwrap_or(0.0);
    let fs = stream.fs;

    let detector = Detector::from_config(DetectorConfig::TwoStage(two_stage_cfg.clone()));
    let result = detector.run(stream, None, false)?;
    let score = result.score;
    let n = score.len();
    let half_window = ((two_stage_cfg.verification_window_s * fs / 2.0).round().max(1.0)) as usize;

    let mut templates = Vec::with_capacity(event_indices.len());
    for &idx in event_indices {
        if idx >= n {
            return Err(eyre::eyre!("event index {idx} is out of range for a {n}-sample session"));
        }
        let lo = idx.saturating_sub(half_window);
        let hi = (idx + half_window).min(n - 1);
        let resampled = pinch_core::template::resample_linear(&score[lo..=hi], two_stage_cfg.template_length);
        templates.push(pinch_core::template::normalize(&resampled));
    }

    let bundle = TemplateBundle {
        templates,
        template_length: two_stage_cfg.template_length,
        confidence_threshold: two_stage_cfg.template_confidence,
        max_lag: two_stage_cfg.max_lag,
        config: TemplateBundleConfig {
            fs,
            bandpass_low: two_stage_cfg.bandpass_low,
            bandpass_high: two_stage_cfg.bandpass_high,
            template_length: two_stage_cfg.template_length,
        },
        provenance: TemplateProvenance {
            filename: pinch_io::loader::session_name(input),
            duration_s,
            fs,
            created: chrono::Utc::now().to_rfc3339(),
        },
    };
    let text = bundle.to_json_string().wrap_err("serializing template bundle")?;
    std::fs::write(output, text).wrap_err_with(|| format!("writing template bundle {output:?}"))?;
    Ok(event_indices.len())
}
