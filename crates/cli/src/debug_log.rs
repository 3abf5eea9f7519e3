//! Debug file logging for ftpwatch
//!
//! Creates a trace log file at `<tmp>/ftpwatch-{session_id}.log` for
//! debugging. The session ID is a UUID generated at startup.

use std::path::PathBuf;

use tracing_subscriber::Layer as _;
use tracing_subscriber::layer::SubscriberExt as _;
use tracing_subscriber::util::SubscriberInitExt as _;

use crate::progress;

/// Debug log guard - keeps the file logger alive
pub struct DebugLogGuard {
    _guard: tracing_appender::non_blocking::WorkerGuard,
}

/// Session info returned after initializing debug logging
pub struct SessionInfo {
    pub log_path: PathBuf,
    pub guard: DebugLogGuard,
}

/// Console filter: the binary's own events at INFO, libraries only when they
/// warn, everything at DEBUG when verbose.
fn console_directives(verbose: bool) -> &'static str {
    if verbose {
        "debug"
    } else {
        "warn,ftpwatch=info,ftpwatch_core=warn,ftpwatch_transport=warn"
    }
}

/// Initialize combined logging: file (detailed) + console (through MultiProgress).
///
/// Returns the session info including the log file path.
/// The guard must be kept alive for the duration of the program.
pub fn init(verbose: bool) -> SessionInfo {
    let session_id = uuid::Uuid::new_v4();
    let log_dir = std::env::temp_dir();
    let log_filename = format!("ftpwatch-{session_id}.log");
    let log_path = log_dir.join(&log_filename);

    let file_appender = tracing_appender::rolling::never(&log_dir, &log_filename);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    // File filter: everything from ftpwatch crates unless RUST_LOG says otherwise
    let file_filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        tracing_subscriber::EnvFilter::new(
            "warn,ftpwatch=trace,ftpwatch_core=trace,ftpwatch_transport=trace",
        )
    });
    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(non_blocking)
        .with_ansi(false)
        .with_target(true)
        .with_file(true)
        .with_line_number(true)
        .with_filter(file_filter);

    // Console layer: goes through ProgressWriter to coordinate with indicatif
    let console_layer = tracing_subscriber::fmt::layer()
        .with_writer(progress::ProgressWriter)
        .with_target(false)
        .with_filter(tracing_subscriber::EnvFilter::new(console_directives(verbose)));

    tracing_subscriber::registry()
        .with(file_layer)
        .with(console_layer)
        .init();

    SessionInfo {
        log_path,
        guard: DebugLogGuard { _guard: guard },
    }
}
