//! Core pinch-gesture detection algorithms: three interchangeable
//! detectors (offline, streaming, two-stage) built from a shared set of
//! numerical kernels, an online baseline tracker, and a fusion layer.
//!
//! This crate has no I/O. Input arrives as an in-memory `SensorStream`;
//! output is a `DetectorOutput` value. File loading, reporting, and the
//! CLI live in `pinch_io` and `pinch_cli`.

pub mod baseline;
pub mod debugger;
pub mod detector;
pub mod error;
pub mod fusion;
pub mod kernels;
pub mod model;
pub mod offline;
pub mod streaming;
pub mod template;
pub mod twostage;

pub use debugger::{analyze_missed_peaks, MissedPeak, RecommendationRisk, ThresholdDebugReport};
pub use detector::Detector;
pub use error::DetectorError;
pub use model::{
    Candidate, DetectorKind, DetectorOutput, Event, FusionComponents, RejectionBucket,
    RejectionLedger, SensorStream,
};
pub use template::TemplateVerifier;
