//! Human-readable error descriptions and structured JSON error formatting.
//!
//! Every caught error exits 1 regardless of kind, so there is no
//! per-reason exit-code table here — only a best-effort explanation for the
//! human and a stable JSON shape for scripts.

use std::error::Error as _;

use pinch_config::ConfigError;
use pinch_core::DetectorError;
use pinch_io::IoError;
use serde_json::json;

/// Maps an `eyre::Report` to a human-readable explanation, preferring typed
/// downcasts over string matching.
pub fn humanize(err: &eyre::Report) -> String {
    if let Some(de) = err.downcast_ref::<DetectorError>() {
        return match de {
            DetectorError::Precondition(detail) => format!(
                "What happened: the session data failed a precondition check ({detail}).\nLikely causes: too few samples, a non-finite timestamp, or a session shorter than min_duration_s.\nHow to fix: inspect the input file, or relax min_duration_s if the short session is expected."
            ),
            DetectorError::Configuration(detail) => format!(
                "What happened: the detector configuration was rejected ({detail}).\nHow to fix: fix the offending field in the config TOML and rerun."
            ),
        };
    }

    if let Some(ce) = err.downcast_ref::<ConfigError>() {
        return format!(
            "What happened: {ce}.\nHow to fix: check the config TOML against the documented fields and defaults."
        );
    }

    if let Some(ie) = err.downcast_ref::<IoError>() {
        return match ie {
            IoError::NotFound(path) => {
                format!("What happened: session file {path:?} does not exist.\nHow to fix: check the --input path.")
            }
            IoError::UnsupportedFormat(ext) => format!(
                "What happened: unsupported session file extension ({ext:?}).\nHow to fix: provide a .csv or .json session file."
            ),
            IoError::MissingColumns { path, columns } => format!(
                "What happened: {path:?} is missing column(s) {columns:?}.\nHow to fix: add the missing columns, or pass a custom column mapping."
            ),
            other => format!("What happened: {other}.\nHow to fix: see the message above for the underlying cause."),
        };
    }

    let mut cause = String::new();
    if let Some(src) = err.source() {
        cause = format!(" Cause: {src}");
    }
    format!("Something went wrong.{cause}\nHow to fix: rerun with --log-level=debug for more detail. Original: {err}")
}

/// Structured JSON for errors when `--json` is enabled.
pub fn format_error_json(err: &eyre::Report) -> String {
    let obj = json!({
        "ok": false,
        "message": humanize(err),
    });
    obj.to_string()
}
