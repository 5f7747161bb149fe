//! CLI argument definitions: a top-level `clap` derive struct carrying
//! global flags (`--json`, `--log-level`), a subcommand enum for the
//! distinct actions, and a process-wide `OnceLock` for state the error
//! formatter needs after the fact.

use std::path::PathBuf;
use std::sync::OnceLock;

use clap::{ArgAction, Parser, Subcommand, ValueEnum};

/// Whether the user asked for JSON-only stdout (controls error formatting).
pub static JSON_MODE: OnceLock<bool> = OnceLock::new();

#[derive(Parser, Debug)]
#[command(name = "pinch-cli", version, about = "Finger-pinch micro-gesture detector")]
pub struct Cli {
    /// Log as JSON lines instead of pretty-printed text
    #[arg(long, action = ArgAction::SetTrue)]
    pub json: bool,

    /// Console log level (error|warn|info|debug|trace)
    #[arg(long = "log-level", value_name = "LEVEL", default_value = "info")]
    pub log_level: String,

    /// Optional log file (appended, rotated daily)
    #[arg(long = "log-file", value_name = "FILE")]
    pub log_file: Option<PathBuf>,

    #[command(subcommand)]
    pub cmd: Commands,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum DetectorKindArg {
    Stationary,
    Streaming,
    TwoStage,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run a detector over a session file and write a report.
    Detect {
        /// Input session file (CSV or JSON).
        #[arg(long, short = 'i', value_name = "FILE")]
        input: PathBuf,
        /// Detector configuration TOML (optional; defaults are used for any
        /// field, or all fields, it omits).
        #[arg(long, short = 'c', value_name = "FILE")]
        config: Option<PathBuf>,
        /// Which detector subsystem to run.
        #[arg(long, value_enum, default_value = "stationary")]
        detector: DetectorKindArg,
        /// Where to write the JSON report (defaults to `<input>.report.json`).
        #[arg(long, short = 'o', value_name = "FILE")]
        output: Option<PathBuf>,
        /// Collect the full rejection ledger (offline detector only).
        #[arg(long, action = ArgAction::SetTrue)]
        collect_rejections: bool,
        /// Persisted template bundle to verify two-stage candidates against.
        #[arg(long, value_name = "FILE")]
        templates: Option<PathBuf>,
        /// Sample rate the session is expected to be at, for the
        /// measured-vs-expected warning only.
        #[arg(long, default_value_t = 100.0)]
        expected_fs: f64,
    },
    /// Explain why promising local maxima fell below the offline detector's
    /// adaptive threshold.
    DebugThreshold {
        #[arg(long, short = 'i', value_name = "FILE")]
        input: PathBuf,
        #[arg(long, short = 'c', value_name = "FILE")]
        config: Option<PathBuf>,
        #[arg(long, default_value_t = 100.0)]
        expected_fs: f64,
    },
    /// Extract a template bundle from event indices in an existing session,
    /// for later two-stage verification.
    TrainTemplates {
        #[arg(long, short = 'i', value_name = "FILE")]
        input: PathBuf,
        #[arg(long, short = 'c', value_name = "FILE")]
        config: Option<PathBuf>,
        /// Sample indices of known pinch events in `input`, comma-separated.
        #[arg(long, value_delimiter = ',', required = true)]
        event_indices: Vec<usize>,
        /// Where to write the JSON template bundle.
        #[arg(long, short = 'o', value_name = "FILE")]
        output: PathBuf,
    },
}
