//! Serializes a `DetectorOutput` to the dense JSON report document a
//! downstream plotting or reporting tool would consume. This crate stops at
//! producing that document — HTML/plot rendering is someone else's job.

use std::path::Path;

use pinch_config::DetectorConfig;
use pinch_core::{DetectorKind, DetectorOutput, RejectionLedger};
use serde_json::{json, Value};

use crate::error::IoError;

fn kind_name(kind: DetectorKind) -> &'static str {
    match kind {
        DetectorKind::Offline => "stationary",
        DetectorKind::Streaming => "streaming",
        DetectorKind::TwoStage => "two-stage",
    }
}

fn params_json(cfg: &DetectorConfig) -> Value {
    // `DetectorConfig` already derives `Serialize`; round-trip it through
    // `serde_json::to_value` rather than hand-mapping every field.
    serde_json::to_value(cfg).unwrap_or(Value::Null)
}

fn ledger_json(ledger: &RejectionLedger) -> Value {
    let bucket = |candidates: &[pinch_core::Candidate]| -> Value {
        Value::Array(
            candidates
                .iter()
                .map(|c| {
                    json!({
                        "index": c.index,
                        "time": c.time,
                        "score": c.score,
                        "threshold": c.threshold,
                        "acc_peak": c.acc_peak,
                        "gyro_peak": c.gyro_peak,
                    })
                })
                .collect(),
        )
    };
    json!({
        "refractory": bucket(&ledger.refractory),
        "not_peak": bucket(&ledger.not_peak),
        "acc_gates": bucket(&ledger.acc_gates),
        "gyro_gates": bucket(&ledger.gyro_gates),
        "min_iei": bucket(&ledger.min_iei),
    })
}

/// Builds the reporter-facing JSON document for one detector run. `source`
/// is the originating session file path, carried through for provenance
/// only (never re-read by this function).
pub fn to_json(output: &DetectorOutput, source: &Path) -> Value {
    let events: Vec<Value> = output
        .events
        .iter()
        .map(|e| {
            json!({
                "index": e.index,
                "time": e.time,
                "score": e.score,
                "threshold": e.threshold,
                "acc_peak": e.acc_peak,
                "gyro_peak": e.gyro_peak,
            })
        })
        .collect();

    let components = output.components.as_ref().map(|c| {
        json!({
            "a_hp": c.a_hp,
            "z_a": c.z_a,
            "z_g": c.z_g,
            "z_da": c.z_da,
            "z_dg": c.z_dg,
        })
    });

    json!({
        "detector_type": kind_name(output.detector_type),
        "source": crate::loader::session_name(source),
        "fs": output.stream.fs,
        "duration_s": output.stream.t.last().copied().unwrap_or(0.0) - output.stream.t.first().copied().unwrap_or(0.0),
        "events": events,
        "score": output.score,
        "threshold": output.threshold,
        "components": components,
        "rejected": output.rejected.as_ref().map(ledger_json),
        "params": params_json(&output.params),
    })
}

/// Writes the report document to `out_path` as pretty-printed JSON.
pub fn write_json(output: &DetectorOutput, source: &Path, out_path: &Path) -> Result<(), IoError> {
    let doc = to_json(output, source);
    let text = serde_json::to_string_pretty(&doc).unwrap_or_default();
    std::fs::write(out_path, text).map_err(|source_err| IoError::Write {
        path: out_path.to_path_buf(),
        source: source_err,
    })
}
