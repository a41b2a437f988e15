//! NNTP connection front-end
//!
//! Listens on one or more addresses, accepts inbound client connections, and
//! hands each one to an external worker process: the accepted socket becomes
//! the worker's stdin/stdout/stderr, the backend list rides in its
//! environment (`REALSERVERS`), and its only argument is the peer's
//! reverse-resolved name. Load-balancing policy lives entirely in the
//! worker; this crate never interprets the application traffic.
//!
//! The parent is a single-threaded blocking loop: poll across the listening
//! sockets, drain every ready listener, spawn one worker per connection, and
//! sweep exited workers without ever blocking on them.

pub mod args;
pub mod constants;
pub mod dispatch;
pub mod lifecycle;
pub mod listener;
pub mod logging;
pub mod resolver;

pub use args::Args;
pub use dispatch::Dispatcher;
pub use listener::{Listener, ListenerSet};
pub use logging::LogConfig;
pub use resolver::{HostPort, ResolveError, ResolveMode};
