//! Logging setup: stderr plus, when backgrounded, a file sink
//!
//! The mode is fixed once at startup from the command line and passed in as
//! an immutable value. Debug and foreground modes log to stderr only; a
//! backgrounded process also writes to a log file so diagnostics survive the
//! loss of the terminal. Levels come from `RUST_LOG` when set.

use tracing_subscriber::Layer;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::constants::LOG_FILE;

/// Immutable logging configuration derived from the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogConfig {
    /// Verbose diagnostics (`-d`).
    pub debug: bool,
    /// Attached to the terminal; no file sink needed.
    pub foreground: bool,
}

impl LogConfig {
    fn default_filter(&self) -> &'static str {
        if self.debug { "debug" } else { "info" }
    }

    fn env_filter(&self) -> tracing_subscriber::EnvFilter {
        tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(self.default_filter()))
    }
}

/// Initialize the global subscriber.
///
/// The file appender is used synchronously rather than through the
/// non-blocking writer thread, because backgrounding forks after logging is
/// initialized and a forked child would lose that thread.
pub fn init(config: &LogConfig) {
    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_filter(config.env_filter());

    if config.foreground {
        tracing_subscriber::registry().with(stderr_layer).init();
        return;
    }

    let file_appender = tracing_appender::rolling::never(".", LOG_FILE);
    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(file_appender)
                .with_ansi(false)
                .with_filter(config.env_filter()),
        )
        .init();
}
