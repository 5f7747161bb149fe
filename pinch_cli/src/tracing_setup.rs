//! `tracing` initialization: pretty or JSON console output, plus an
//! optional rotating file sink. The detector core never opens a log file
//! itself — warnings reach it only through `pinch_traits::TracingWarnSink`,
//! and this module is what decides where that output ultimately lands.

use std::path::Path;
use std::sync::OnceLock;

use tracing_subscriber::EnvFilter;

static FILE_GUARD: OnceLock<tracing_appender::non_blocking::WorkerGuard> = OnceLock::new();

/// Initializes the global `tracing` subscriber. `json` selects
/// newline-delimited JSON over human-readable formatting; `log_level` seeds
/// the default filter when `RUST_LOG` is unset; `log_file` optionally
/// duplicates output to a daily-rotated file.
pub fn init_tracing(json: bool, log_level: &str, log_file: Option<&Path>) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    if let Some(path) = log_file {
        let dir = path.parent().filter(|p| !p.as_os_str().is_empty());
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "pinch-cli.log".to_string());
        let appender = tracing_appender::rolling::daily(dir.unwrap_or_else(|| Path::new(".")), file_name);
        let (non_blocking, guard) = tracing_appender::non_blocking(appender);
        let _ = FILE_GUARD.set(guard);

        if json {
            let _ = builder.json().with_writer(non_blocking).try_init();
        } else {
            let _ = builder.with_ansi(false).with_writer(non_blocking).try_init();
        }
    } else if json {
        let _ = builder.json().try_init();
    } else {
        let _ = builder.try_init();
    }
}
