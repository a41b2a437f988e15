//! Shared constants for the connection front-end

/// Well-known NNTP port, substituted when a listen spec omits one.
pub const DEFAULT_PORT: &str = "119";

/// Environment variable that carries the backend list into the worker.
pub const BACKEND_ENV_VAR: &str = "REALSERVERS";

/// Conventional worker executable name, looked up next to our own binary
/// when `-s` is not given.
pub const DEFAULT_WORKER_NAME: &str = "nntp-slb-worker";

/// Placeholder peer name handed to the worker when reverse resolution fails.
pub const UNKNOWN_PEER: &str = "unknown";

/// File sink written in the current directory when running in the background.
pub const LOG_FILE: &str = "nntp-slb.log";

/// Listener limits
pub mod listener {
    /// Soft cap on the total number of listening sockets.
    pub const MAX_LISTENERS: usize = 16;

    /// Accept backlog for each listening socket.
    pub const BACKLOG: i32 = 16;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_port_is_numeric() {
        assert!(DEFAULT_PORT.parse::<u16>().is_ok());
    }

    #[test]
    fn listener_cap_is_positive() {
        const _: () = assert!(listener::MAX_LISTENERS > 0);
        const _: () = assert!(listener::BACKLOG > 0);
    }
}
