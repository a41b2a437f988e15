//! Process lifecycle: backgrounding, pidfile, signal disposition
//!
//! Backgrounding happens after the listen sockets are bound, so configuration
//! errors still reach the invoking terminal. The launcher parent exits
//! immediately; the surviving child redirects its standard descriptors to
//! `/dev/null` and leads a fresh session. There is no graceful-shutdown
//! state: the running process is terminated externally, and workers are
//! independent processes that outlive nothing but themselves.

use std::fs::{self, OpenOptions};
use std::os::fd::AsRawFd;
use std::path::Path;
use std::process;

use anyhow::{Context, Result};
use nix::sys::signal::{SaFlags, SigAction, SigHandler, SigSet, Signal, sigaction, signal};
use nix::unistd::{ForkResult, dup2, fork, setsid};
use tracing::warn;

/// Detach from the controlling terminal.
pub fn daemonize() -> Result<()> {
    let devnull = OpenOptions::new()
        .read(true)
        .write(true)
        .open("/dev/null")
        .context("/dev/null")?;

    // SAFETY: the process is still single-threaded here (the logging file
    // sink is synchronous), and the child only continues the normal startup
    // path.
    match unsafe { fork() }.context("fork")? {
        ForkResult::Parent { .. } => process::exit(0),
        ForkResult::Child => {}
    }

    for target in 0..=2 {
        dup2(devnull.as_raw_fd(), target).context("dup2(/dev/null)")?;
    }
    setsid().context("setsid")?;
    Ok(())
}

/// Record our pid once, after any backgrounding. Failure is a warning, never
/// fatal.
pub fn write_pidfile(path: &Path) {
    if let Err(e) = fs::write(path, format!("{}\n", process::id())) {
        warn!("failed to write pidfile {}: {}", path.display(), e);
    }
}

/// Keep a worker's early exit on an inherited socket from killing the
/// parent. Worker exits themselves are reaped by the dispatcher, not here.
pub fn ignore_sigpipe() -> Result<()> {
    // SAFETY: installing SIG_IGN registers no handler code.
    unsafe { signal(Signal::SIGPIPE, SigHandler::SigIgn) }.context("signal(SIGPIPE)")?;
    Ok(())
}

extern "C" fn on_child_exit(_: libc::c_int) {}

/// Make worker exits interrupt the dispatcher's blocking wait.
///
/// The handler body does nothing; its only job is to exist, and to be
/// registered without SA_RESTART, so that a SIGCHLD arriving while the
/// dispatcher sits in `poll` surfaces as EINTR and triggers a sweep of
/// exited workers instead of leaving them unwaited until the next
/// connection.
pub fn notice_child_exits() -> Result<()> {
    let action = SigAction::new(
        SigHandler::Handler(on_child_exit),
        SaFlags::empty(),
        SigSet::empty(),
    );
    // SAFETY: the handler runs no code, which is trivially
    // async-signal-safe.
    unsafe { sigaction(Signal::SIGCHLD, &action) }.context("sigaction(SIGCHLD)")?;
    Ok(())
}
