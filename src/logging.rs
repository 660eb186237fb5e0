//! File logging.
//!
//! The terminal belongs to the editor, so log lines go to
//! `<tmp>/ted/ted.log` through a non-blocking appender. `TED_LOG` takes an
//! `EnvFilter` directive string; without it only `info` and above from the
//! ted crates are kept.

use std::path::PathBuf;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Environment variable holding the filter directives.
pub const ENV_VAR: &str = "TED_LOG";

const DEFAULT_FILTER: &str = "ted=info,ted_term=info,ted_editor=info";

const LOG_FILE: &str = "ted.log";

/// Keeps the background writer alive. Dropping it flushes pending lines.
pub struct LoggingGuard {
    _guard: WorkerGuard,
}

/// Directory the log file is written to.
pub fn log_dir() -> PathBuf {
    std::env::temp_dir().join("ted")
}

fn filter_from(directives: Option<&str>) -> EnvFilter {
    directives
        .and_then(|d| EnvFilter::try_new(d).ok())
        .unwrap_or_else(|| EnvFilter::new(DEFAULT_FILTER))
}

/// Install the global subscriber. Returns `None` when the log directory
/// cannot be created or a subscriber is already set; the editor runs
/// without logs in that case.
pub fn init() -> Option<LoggingGuard> {
    let log_dir = log_dir();
    std::fs::create_dir_all(&log_dir).ok()?;

    let file_appender = tracing_appender::rolling::never(&log_dir, LOG_FILE);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let env_filter = filter_from(std::env::var(ENV_VAR).ok().as_deref());

    let subscriber = tracing_subscriber::registry().with(env_filter).with(
        tracing_subscriber::fmt::layer()
            .with_writer(non_blocking)
            .with_ansi(false)
            .with_target(true)
            .with_file(true)
            .with_line_number(true),
    );

    if subscriber.try_init().is_err() {
        return None;
    }

    let previous = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        tracing::error!(panic = %panic_info, "panic");
        previous(panic_info);
    }));

    tracing::info!(log_dir = %log_dir.display(), "tracing initialized");

    Some(LoggingGuard { _guard: guard })
}
