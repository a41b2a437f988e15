//! Endpoint specification parsing and resolution
//!
//! A specification token names where to listen (or whom to contact): `host`,
//! `port`, `host:port`, or a bracketed IPv6 literal with an optional trailing
//! `:port`. Parsing is a pure string split; resolution maps the split onto
//! concrete socket addresses via `getaddrinfo`.

use std::fmt;
use std::net::SocketAddr;

use dns_lookup::{AddrInfoHints, getaddrinfo};

/// Host rewritten in place of a `*` wildcard, and the default when a listen
/// spec has no host at all.
const IPV4_ANY: &str = "0.0.0.0";

/// Host/port split of one endpoint specification, before resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostPort {
    pub host: Option<String>,
    pub port: Option<String>,
}

/// Whether a specification is resolved for a listening socket or for an
/// outbound contact. Listening resolution is wildcard-capable and requires
/// numeric hosts; outbound resolution requires a host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolveMode {
    Listen,
    Connect,
}

/// Errors from endpoint resolution. Both are fatal configuration errors.
#[derive(Debug)]
pub enum ResolveError {
    /// A non-listening specification had no host part.
    MissingHost { spec: String },
    /// `getaddrinfo` rejected the specification.
    Lookup { spec: String, detail: String },
}

impl fmt::Display for ResolveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingHost { spec } => write!(f, "{}: host part missing", spec),
            Self::Lookup { spec, detail } => write!(f, "{}: {}", spec, detail),
        }
    }
}

impl std::error::Error for ResolveError {}

fn wildcard(host: &str) -> String {
    if host == "*" {
        IPV4_ANY.to_string()
    } else {
        host.to_string()
    }
}

/// Split one endpoint specification into host and port parts.
///
/// Bracketed IPv6 literals win first; otherwise the split happens at the
/// *last* colon, so an unbracketed IPv6 literal loses its final group to the
/// port. A token of all digits is a bare port; anything else is a bare host.
/// `*` as host becomes the IPv4 any-address.
#[must_use]
pub fn split_host_port(spec: &str) -> HostPort {
    if let Some(rest) = spec.strip_prefix('[') {
        if let Some(end) = rest.find(']') {
            let host = &rest[..end];
            let port = rest[end + 1..].strip_prefix(':').map(str::to_string);
            return HostPort {
                host: Some(wildcard(host)),
                port,
            };
        }
    }

    if let Some(idx) = spec.rfind(':') {
        return HostPort {
            host: Some(wildcard(&spec[..idx])),
            port: Some(spec[idx + 1..].to_string()),
        };
    }

    if spec.bytes().all(|b| b.is_ascii_digit()) {
        HostPort {
            host: None,
            port: Some(spec.to_string()),
        }
    } else {
        HostPort {
            host: Some(wildcard(spec)),
            port: None,
        }
    }
}

/// Resolve one endpoint specification to socket addresses.
///
/// The returned addresses preserve `getaddrinfo` order, which is stable for a
/// given host string. A missing port falls back to `default_port`; a missing
/// host falls back to the IPv4 any-address when listening and is an error
/// otherwise.
pub fn resolve(
    spec: &str,
    default_port: &str,
    mode: ResolveMode,
) -> Result<Vec<SocketAddr>, ResolveError> {
    let parts = split_host_port(spec);

    let host = match parts.host {
        Some(host) => host,
        None => match mode {
            ResolveMode::Listen => IPV4_ANY.to_string(),
            ResolveMode::Connect => {
                return Err(ResolveError::MissingHost {
                    spec: spec.to_string(),
                });
            }
        },
    };
    let port = parts.port.unwrap_or_else(|| default_port.to_string());

    let hints = AddrInfoHints {
        socktype: libc::SOCK_STREAM,
        protocol: libc::IPPROTO_TCP,
        flags: match mode {
            ResolveMode::Listen => libc::AI_PASSIVE | libc::AI_NUMERICHOST,
            ResolveMode::Connect => libc::AI_ADDRCONFIG,
        },
        ..AddrInfoHints::default()
    };

    // LookupError only renders through its io::Error coercion.
    let entries = getaddrinfo(Some(&host), Some(&port), Some(hints)).map_err(|e| {
        ResolveError::Lookup {
            spec: spec.to_string(),
            detail: std::io::Error::from(e).to_string(),
        }
    })?;

    let mut addrs = Vec::new();
    for entry in entries {
        let info = entry.map_err(|e| ResolveError::Lookup {
            spec: spec.to_string(),
            detail: std::io::Error::from(e).to_string(),
        })?;
        addrs.push(info.sockaddr);
    }
    Ok(addrs)
}
