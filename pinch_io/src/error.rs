//! Loader and reporter errors. `pinch_core` never sees these types — it
//! only sees the `SensorStream` a loader produced or the warnings it
//! reported along the way.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum IoError {
    #[error("session file not found: {0}")]
    NotFound(PathBuf),
    #[error("unsupported session file format: {0:?}")]
    UnsupportedFormat(Option<String>),
    #[error("failed to read {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse CSV {path:?}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
    #[error("failed to parse JSON {path:?}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("session {path:?} is missing required column(s): {columns:?}")]
    MissingColumns { path: PathBuf, columns: Vec<String> },
    #[error("session {0:?} has no sensor readings")]
    EmptySession(PathBuf),
    #[error(transparent)]
    Detector(#[from] pinch_core::DetectorError),
    #[error("failed to write report {path:?}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
