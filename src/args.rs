//! Command-line argument parsing for the connection front-end

use std::path::PathBuf;

use clap::Parser;

use crate::constants::DEFAULT_WORKER_NAME;
use crate::logging::LogConfig;

/// NNTP listener: accepts client connections and hands each one to an
/// external load-balancing worker process.
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Listen endpoints: host, port, or host:port; IPv6 literals in brackets
    #[arg(
        short = 'l',
        long = "listen",
        value_name = "SPEC",
        value_delimiter = ',',
        required = true
    )]
    pub listen: Vec<String>,

    /// Backend server list, forwarded verbatim to the worker's environment
    #[arg(short = 'r', long = "realservers", value_name = "LIST")]
    pub realservers: String,

    /// Stay attached to the controlling terminal
    #[arg(short = 'f', long)]
    pub foreground: bool,

    /// Debug mode: implies foreground, verbose diagnostics, no file sink
    #[arg(short = 'd', long)]
    pub debug: bool,

    /// Write the process id to this file after backgrounding
    #[arg(short = 'p', long = "pidfile", value_name = "FILE")]
    pub pidfile: Option<PathBuf>,

    /// Worker executable to run for each connection
    #[arg(short = 's', long = "worker", value_name = "FILE")]
    pub worker: Option<PathBuf>,
}

impl Args {
    /// Whether the backgrounding transition is skipped.
    #[must_use]
    pub fn is_foreground(&self) -> bool {
        self.foreground || self.debug
    }

    /// Logging configuration derived from the flags.
    #[must_use]
    pub fn log_config(&self) -> LogConfig {
        LogConfig {
            debug: self.debug,
            foreground: self.is_foreground(),
        }
    }

    /// Worker executable path: explicit `-s`, or the conventional name next
    /// to our own binary.
    #[must_use]
    pub fn worker_path(&self) -> PathBuf {
        self.worker.clone().unwrap_or_else(|| {
            std::env::current_exe()
                .ok()
                .and_then(|exe| exe.parent().map(|dir| dir.join(DEFAULT_WORKER_NAME)))
                .unwrap_or_else(|| PathBuf::from(DEFAULT_WORKER_NAME))
        })
    }
}
