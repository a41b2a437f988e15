//! Listener set construction and socket configuration
//!
//! Turns a list of endpoint specifications into a fixed set of listening
//! sockets. Binding happens in one pass at startup; the set never changes
//! while the process runs.

use std::net::SocketAddr;

use anyhow::{Context, Result, ensure};
use socket2::{Domain, Protocol, Socket, Type};
use tracing::{debug, warn};

use crate::constants::DEFAULT_PORT;
use crate::constants::listener::BACKLOG;
use crate::resolver::{self, ResolveMode};

/// A bound socket paired with the specification text it came from, kept for
/// diagnostics when listen or accept fails later.
#[derive(Debug)]
pub struct Listener {
    socket: Socket,
    label: String,
}

impl Listener {
    #[must_use]
    pub fn socket(&self) -> &Socket {
        &self.socket
    }

    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }
}

/// The full set of listening sockets, in registration order.
#[derive(Debug)]
pub struct ListenerSet {
    listeners: Vec<Listener>,
}

impl ListenerSet {
    /// Resolve every specification and bind a socket per resolved address,
    /// up to `max` sockets total. Resolution and bind failures are fatal;
    /// hitting the cap only logs a warning and stops adding sockets.
    pub fn bind(specs: &[String], max: usize) -> Result<Self> {
        let mut listeners = Vec::new();
        'specs: for spec in specs {
            let addrs = resolver::resolve(spec, DEFAULT_PORT, ResolveMode::Listen)?;
            for addr in addrs {
                if listeners.len() >= max {
                    warn!(
                        "listener cap of {} reached, ignoring remaining addresses in {}",
                        max, spec
                    );
                    break 'specs;
                }
                listeners.push(Self::bind_one(addr, spec)?);
            }
        }
        ensure!(!listeners.is_empty(), "no usable listen addresses");
        Ok(Self { listeners })
    }

    fn bind_one(addr: SocketAddr, label: &str) -> Result<Listener> {
        let domain = if addr.is_ipv4() {
            Domain::IPV4
        } else {
            Domain::IPV6
        };
        let socket = Socket::new(domain, Type::STREAM, Some(Protocol::TCP)).context("socket")?;

        // An IPv6 listener must not implicitly serve v4-mapped addresses;
        // dual-stack specs get their own IPv4 socket instead.
        if addr.is_ipv6() {
            socket
                .set_only_v6(true)
                .with_context(|| format!("setsockopt(IPV6_V6ONLY): {}", label))?;
        }
        socket
            .set_reuse_address(true)
            .with_context(|| format!("setsockopt(SO_REUSEADDR): {}", label))?;
        socket
            .bind(&addr.into())
            .with_context(|| format!("bind({})", label))?;

        debug!("bound {} for {}", addr, label);
        Ok(Listener {
            socket,
            label: label.to_string(),
        })
    }

    /// Mark every socket non-blocking and put it into the listening state.
    /// Called once, after any backgrounding transition.
    pub fn start_listening(&self) -> Result<()> {
        for listener in &self.listeners {
            listener
                .socket
                .set_nonblocking(true)
                .with_context(|| format!("fcntl(O_NONBLOCK): {}", listener.label))?;
            listener
                .socket
                .listen(BACKLOG)
                .with_context(|| format!("listen({})", listener.label))?;
        }
        Ok(())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }

    #[must_use]
    pub fn as_slice(&self) -> &[Listener] {
        &self.listeners
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Listener> {
        self.listeners.iter()
    }

    /// The locally bound addresses, in registration order.
    pub fn local_addrs(&self) -> Result<Vec<SocketAddr>> {
        self.listeners
            .iter()
            .map(|l| {
                let addr = l
                    .socket
                    .local_addr()
                    .with_context(|| format!("getsockname({})", l.label))?;
                addr.as_socket()
                    .with_context(|| format!("{}: not an inet address", l.label))
            })
            .collect()
    }
}
