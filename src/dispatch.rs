//! Readiness wait and per-connection worker dispatch
//!
//! The parent runs a single-threaded loop: block in `poll` across every
//! listening socket, drain each ready listener of all pending connections,
//! and hand every accepted connection to a freshly spawned worker process.
//! The worker gets the socket as its stdin/stdout/stderr, the backend list in
//! its environment, and the peer's reverse-resolved name as its only
//! argument. The parent never waits on a worker.

use std::io;
use std::os::fd::{AsFd, OwnedFd};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};

use anyhow::{Context, Result, bail};
use dns_lookup::lookup_addr;
use nix::errno::Errno;
use nix::poll::{PollFd, PollFlags, PollTimeout, poll};
use socket2::{SockAddr, Socket};
use tracing::{debug, warn};

use crate::constants::{BACKEND_ENV_VAR, UNKNOWN_PEER};
use crate::listener::ListenerSet;

/// Accept loop state: the listener set, the worker command line inputs, and
/// the handles of workers not yet known to have exited.
pub struct Dispatcher {
    listeners: ListenerSet,
    worker: PathBuf,
    backends: String,
    workers: Vec<Child>,
}

impl Dispatcher {
    #[must_use]
    pub fn new(listeners: ListenerSet, worker: PathBuf, backends: String) -> Self {
        Self {
            listeners,
            worker,
            backends,
            workers: Vec::new(),
        }
    }

    /// Run the accept loop until a fatal error. Under normal operation this
    /// never returns; the process is terminated externally.
    pub fn run(&mut self) -> Result<()> {
        loop {
            self.run_cycle()?;
        }
    }

    /// One wait/drain/reap cycle. Blocks until at least one listener is
    /// readable.
    pub fn run_cycle(&mut self) -> Result<()> {
        for idx in self.wait_ready()? {
            self.drain(idx)?;
        }
        self.reap();
        Ok(())
    }

    /// Block without timeout until listeners are readable; returns their
    /// indices in registration order. An interrupted wait sweeps exited
    /// workers before retrying, so a worker exit delivered as SIGCHLD during
    /// an idle stretch is collected right away rather than on the next
    /// connection. A listener reporting an error condition is fatal.
    fn wait_ready(&mut self) -> Result<Vec<usize>> {
        let Self {
            listeners, workers, ..
        } = self;
        let mut fds: Vec<PollFd<'_>> = listeners
            .iter()
            .map(|l| PollFd::new(l.socket().as_fd(), PollFlags::POLLIN))
            .collect();

        loop {
            match poll(&mut fds, PollTimeout::NONE) {
                Ok(_) => break,
                Err(Errno::EINTR) => {
                    sweep(workers);
                    continue;
                }
                Err(e) => return Err(e).context("poll"),
            }
        }

        let mut ready = Vec::new();
        for (idx, fd) in fds.iter().enumerate() {
            let revents = fd.revents().unwrap_or_else(PollFlags::empty);
            match classify(revents) {
                Readiness::Ready => ready.push(idx),
                Readiness::Idle => {}
                Readiness::Broken => bail!(
                    "poll({}): error condition on listening socket",
                    listeners.as_slice()[idx].label()
                ),
            }
        }
        Ok(ready)
    }

    /// Accept until the listener has no more pending connections, spawning
    /// one worker per connection. Draining the whole backlog here keeps a
    /// bursty listener from being serviced one connection per poll wakeup.
    fn drain(&mut self, idx: usize) -> Result<()> {
        loop {
            let accepted = {
                let listener = &self.listeners.as_slice()[idx];
                match listener.socket().accept() {
                    Ok(pair) => Some(pair),
                    Err(e)
                        if e.kind() == io::ErrorKind::WouldBlock
                            || e.kind() == io::ErrorKind::Interrupted =>
                    {
                        None
                    }
                    Err(e) => {
                        return Err(e).with_context(|| format!("accept({})", listener.label()));
                    }
                }
            };
            let Some((conn, peer)) = accepted else {
                return Ok(());
            };

            // The worker expects ordinary blocking I/O on its inherited
            // descriptors.
            if let Err(e) = conn.set_nonblocking(false) {
                warn!("failed to restore blocking mode on accepted socket: {}", e);
            }

            let peer_name = peer_name(&peer);
            match spawn_worker(&self.worker, &self.backends, &peer_name, conn) {
                Ok(child) => {
                    debug!(pid = child.id(), peer = %peer_name, "worker launched");
                    self.workers.push(child);
                }
                Err(e) => {
                    warn!("failed to launch worker {}: {}", self.worker.display(), e);
                }
            }
        }
    }

    /// Sweep worker handles without blocking, dropping any that have exited.
    fn reap(&mut self) {
        sweep(&mut self.workers);
    }

    /// Workers spawned and not yet reaped.
    #[must_use]
    pub fn worker_count(&self) -> usize {
        self.workers.len()
    }
}

/// What a poll wakeup reported for one listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Readiness {
    Idle,
    Ready,
    Broken,
}

/// POLLERR or POLLNVAL on a listening socket cannot be serviced by accepting;
/// left alone it would wake the loop forever, so it is treated as broken.
fn classify(revents: PollFlags) -> Readiness {
    if revents.intersects(PollFlags::POLLERR | PollFlags::POLLNVAL) {
        Readiness::Broken
    } else if revents.contains(PollFlags::POLLIN) {
        Readiness::Ready
    } else {
        Readiness::Idle
    }
}

/// Collect exited workers without blocking, keeping only live handles.
fn sweep(workers: &mut Vec<Child>) {
    workers.retain_mut(|child| match child.try_wait() {
        Ok(None) => true,
        Ok(Some(status)) => {
            debug!(pid = child.id(), %status, "worker exited");
            false
        }
        Err(e) => {
            warn!(pid = child.id(), "failed to poll worker: {}", e);
            false
        }
    });
}

/// Best-effort reverse resolution of an accepted peer address. Failure is
/// never fatal; the worker just sees the placeholder name.
#[must_use]
pub fn peer_name(peer: &SockAddr) -> String {
    peer.as_socket()
        .and_then(|addr| lookup_addr(&addr.ip()).ok())
        .unwrap_or_else(|| UNKNOWN_PEER.to_string())
}

/// Launch one worker for an accepted connection.
///
/// The connection descriptor becomes the worker's stdin, stdout, and stderr.
/// The parent's copies are dropped when the spawn expression ends, so the
/// parent holds no descriptor for the connection afterwards, whether or not
/// the launch succeeded. Listening sockets are close-on-exec and never reach
/// the worker.
pub fn spawn_worker(
    worker: &Path,
    backends: &str,
    peer: &str,
    conn: Socket,
) -> io::Result<Child> {
    let fd: OwnedFd = conn.into();
    let stdin = fd.try_clone()?;
    let stdout = fd.try_clone()?;
    Command::new(worker)
        .arg(peer)
        .env(BACKEND_ENV_VAR, backends)
        .stdin(Stdio::from(stdin))
        .stdout(Stdio::from(stdout))
        .stderr(Stdio::from(fd))
        .spawn()
}
