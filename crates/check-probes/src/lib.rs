//! The seven protocol-aware probes that sit on top of a bare TCP connection:
//! what to send, and how to read a reply as healthy, unhealthy, or
//! not-yet-complete.
//!
//! Nothing in this crate touches a socket. `check-runtime` drives the actual
//! connect/send/recv loop and feeds accumulated bytes into
//! [`Probe::parse`].

mod http;
mod imap;
mod mysql;
mod pop3;
mod probe;
mod registry;
mod smtp;
mod ssl_hello;
mod tcp;

pub use probe::{ParseOutcome, Probe};
pub use registry::probe_for;
pub use ssl_hello::CLIENT_HELLO as SSL_HELLO_CLIENT_HELLO;
