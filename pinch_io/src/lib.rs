//! External collaborators for the pinch-gesture core: session file ingest
//! (CSV/JSON → `SensorStream`) and detector-output reporting (`DetectorOutput`
//! → JSON document). This crate implements their I/O contract only — no
//! HTML/plot rendering, no simulator file copy. Format support is
//! feature-gated (`csv-format`, `json-format`) so a caller can build
//! against just the formats it needs.

pub mod error;
pub mod loader;
pub mod report;

pub use error::IoError;
pub use loader::{load_session, ColumnMap};
