//! TCP/IP availability watchdog.
//!
//! Reads a list of hosts, starts one worker per host that repeatedly attempts
//! a TCP handshake on a fixed port, and logs whether each host answered. All
//! workers stop together when the [`ShutdownSignal`] is triggered.

pub mod config;
pub mod hosts;
pub mod monitoring;
pub mod pidfile;
pub mod shutdown;

pub use hosts::{HostEntry, HostList, LoadError};
pub use shutdown::ShutdownSignal;
