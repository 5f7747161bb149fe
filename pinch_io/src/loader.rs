//! Session file ingest. Its only obligation is to produce a `SensorStream`
//! meeting the core's invariants (or a precondition failure), and to route
//! non-fatal oddities through the caller's `WarnSink` rather than deciding
//! anything itself.
//!
//! CSV ingest tolerates `#`-prefixed comment/metadata lines and an
//! explicit column-role mapping; gravity columns are accepted but ignored.
//! Both formats warn, but never fail, when the measured sample rate
//! differs from what the caller expected.

use std::path::{Path, PathBuf};

use pinch_core::SensorStream;
use pinch_traits::{WarnKind, WarnSink, Warning};
use serde::Deserialize;

use crate::error::IoError;

/// Column name overrides for CSV ingest. Defaults match the wearable
/// wire names produced by common motion-capture export pipelines.
#[derive(Debug, Clone)]
pub struct ColumnMap {
    pub time: String,
    pub acc_x: String,
    pub acc_y: String,
    pub acc_z: String,
    pub gyro_x: String,
    pub gyro_y: String,
    pub gyro_z: String,
}

impl Default for ColumnMap {
    fn default() -> Self {
        ColumnMap {
            time: "time_s".into(),
            acc_x: "userAccelerationX".into(),
            acc_y: "userAccelerationY".into(),
            acc_z: "userAccelerationZ".into(),
            gyro_x: "rotationRateX".into(),
            gyro_y: "rotationRateY".into(),
            gyro_z: "rotationRateZ".into(),
        }
    }
}

/// Relative deviation, vs the caller's expected rate, that triggers the
/// sampling-rate-mismatch warning — the stream's effective `fs` is always
/// the measured one regardless.
const EXPECTED_FS_RELATIVE_TOLERANCE: f64 = 0.02;

struct RawSamples {
    t: Vec<f64>,
    a_xyz: Vec<[f64; 3]>,
    g_xyz: Vec<[f64; 3]>,
}

/// Loads a session file, dispatching on extension (`.csv` or `.json`), and
/// builds a `SensorStream`. `expected_fs` drives only the informational
/// sampling-rate warning; it never changes the computed `fs`.
pub fn load_session(
    path: &Path,
    columns: &ColumnMap,
    expected_fs: f64,
    warn_sink: &mut dyn WarnSink,
) -> Result<SensorStream, IoError> {
    if !path.exists() {
        return Err(IoError::NotFound(path.to_path_buf()));
    }
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());

    let raw = match ext.as_deref() {
        #[cfg(feature = "csv-format")]
        Some("csv") => load_csv(path, columns)?,
        #[cfg(feature = "json-format")]
        Some("json") => load_json(path, columns)?,
        other => return Err(IoError::UnsupportedFormat(other.map(str::to_string))),
    };

    if raw.t.is_empty() {
        return Err(IoError::EmptySession(path.to_path_buf()));
    }

    let measured_dt = {
        let mut diffs: Vec<f64> = raw.t.windows(2).map(|w| w[1] - w[0]).collect();
        diffs.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
        diffs.get(diffs.len() / 2).copied().unwrap_or(0.0)
    };
    let measured_fs = if measured_dt > 0.0 { 1.0 / measured_dt } else { 100.0 };
    if expected_fs > 0.0
        && (measured_fs - expected_fs).abs() / expected_fs > EXPECTED_FS_RELATIVE_TOLERANCE
    {
        warn_sink.warn(Warning::new(
            WarnKind::SamplingRateMismatch,
            format!("measured {measured_fs:.1} Hz differs from expected {expected_fs:.1} Hz"),
        ));
    }

    SensorStream::new(raw.t, raw.a_xyz, raw.g_xyz, warn_sink).map_err(IoError::from)
}

#[cfg(feature = "csv-format")]
fn load_csv(path: &Path, columns: &ColumnMap) -> Result<RawSamples, IoError> {
    let mut reader = csv::ReaderBuilder::new()
        .comment(Some(b'#'))
        .has_headers(true)
        .from_path(path)
        .map_err(|source| IoError::Csv {
            path: path.to_path_buf(),
            source,
        })?;

    let headers = reader
        .headers()
        .map_err(|source| IoError::Csv {
            path: path.to_path_buf(),
            source,
        })?
        .clone();

    let required = [
        &columns.time,
        &columns.acc_x,
        &columns.acc_y,
        &columns.acc_z,
        &columns.gyro_x,
        &columns.gyro_y,
        &columns.gyro_z,
    ];
    let missing: Vec<String> = required
        .iter()
        .filter(|name| !headers.iter().any(|h| h == name.as_str()))
        .map(|name| name.to_string())
        .collect();
    if !missing.is_empty() {
        return Err(IoError::MissingColumns {
            path: path.to_path_buf(),
            columns: missing,
        });
    }

    let col_index = |name: &str| headers.iter().position(|h| h == name).unwrap();
    let (it, ixa, iya, iza, ixg, iyg, izg) = (
        col_index(&columns.time),
        col_index(&columns.acc_x),
        col_index(&columns.acc_y),
        col_index(&columns.acc_z),
        col_index(&columns.gyro_x),
        col_index(&columns.gyro_y),
        col_index(&columns.gyro_z),
    );

    let mut t = Vec::new();
    let mut a_xyz = Vec::new();
    let mut g_xyz = Vec::new();
    for result in reader.records() {
        let record = result.map_err(|source| IoError::Csv {
            path: path.to_path_buf(),
            source,
        })?;
        let parse = |idx: usize| -> Result<f64, IoError> {
            record
                .get(idx)
                .and_then(|s| s.trim().parse::<f64>().ok())
                .ok_or_else(|| IoError::Csv {
                    path: path.to_path_buf(),
                    source: csv::Error::from(std::io::Error::new(
                        std::io::ErrorKind::InvalidData,
                        format!("non-numeric value in column {idx}"),
                    )),
                })
        };
        t.push(parse(it)?);
        a_xyz.push([parse(ixa)?, parse(iya)?, parse(iza)?]);
        g_xyz.push([parse(ixg)?, parse(iyg)?, parse(izg)?]);
    }

    Ok(RawSamples { t, a_xyz, g_xyz })
}

/// A top-level `sensorData` array of `{time_s, userAcceleration: {x,y,z},
/// rotationRate: {x,y,z}, gravity: {x,y,z}}` readings. `gravity` is
/// accepted and ignored — the core has no use for absolute orientation.
#[cfg(feature = "json-format")]
#[derive(Debug, Deserialize)]
struct JsonSession {
    #[serde(rename = "sensorData", default)]
    sensor_data: Vec<JsonReading>,
}

#[cfg(feature = "json-format")]
#[derive(Debug, Deserialize)]
struct Vec3 {
    #[serde(default)]
    x: f64,
    #[serde(default)]
    y: f64,
    #[serde(default)]
    z: f64,
}

#[cfg(feature = "json-format")]
#[derive(Debug, Deserialize)]
struct JsonReading {
    #[serde(default)]
    time_s: f64,
    #[serde(rename = "userAcceleration", default)]
    user_acceleration: Vec3,
    #[serde(rename = "rotationRate", default)]
    rotation_rate: Vec3,
}

#[cfg(feature = "json-format")]
impl Default for Vec3 {
    fn default() -> Self {
        Vec3 { x: 0.0, y: 0.0, z: 0.0 }
    }
}

#[cfg(feature = "json-format")]
fn load_json(path: &Path, _columns: &ColumnMap) -> Result<RawSamples, IoError> {
    let text = std::fs::read_to_string(path).map_err(|source| IoError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let session: JsonSession = serde_json::from_str(&text).map_err(|source| IoError::Json {
        path: path.to_path_buf(),
        source,
    })?;

    let mut t = Vec::with_capacity(session.sensor_data.len());
    let mut a_xyz = Vec::with_capacity(session.sensor_data.len());
    let mut g_xyz = Vec::with_capacity(session.sensor_data.len());
    for reading in &session.sensor_data {
        t.push(reading.time_s);
        a_xyz.push([
            reading.user_acceleration.x,
            reading.user_acceleration.y,
            reading.user_acceleration.z,
        ]);
        g_xyz.push([
            reading.rotation_rate.x,
            reading.rotation_rate.y,
            reading.rotation_rate.z,
        ]);
    }

    Ok(RawSamples { t, a_xyz, g_xyz })
}

/// Used only to report back where a file's provenance came from (for
/// `pinch_config::TemplateProvenance`, populated by the CLI after a
/// successful load).
pub fn session_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string_lossy().into_owned())
}

pub fn canonicalize_or_self(path: &Path) -> PathBuf {
    path.canonicalize().unwrap_or_else(|_| path.to_path_buf())
}
