use std::fmt;
use std::time::SystemTime;

use thiserror::Error;

use crate::hosts::HostEntry;

/// Outcome of a single connection attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Reachable,
    Unreachable { reason: String },
}

impl Outcome {
    pub fn is_reachable(&self) -> bool {
        matches!(self, Outcome::Reachable)
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Reachable => write!(f, "reachable"),
            Outcome::Unreachable { .. } => write!(f, "unreachable"),
        }
    }
}

/// Errors that end a worker. A refused or timed out connection is not one of them.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CheckError {
    #[error("{host} is not a valid host name: {reason}")]
    HostUnresolvable { host: String, reason: String },
    #[error("socket unavailable for {host}: {reason}")]
    SocketUnavailable { host: String, reason: String },
}

/// Result of one monitoring cycle
#[derive(Debug, Clone)]
pub struct AvailabilityEvent {
    /// Host that was checked
    pub host: HostEntry,

    /// Port the connection was attempted on
    pub port: u16,

    pub outcome: Outcome,

    /// When the attempt finished
    pub timestamp: SystemTime,
}

impl AvailabilityEvent {
    pub fn new(host: HostEntry, port: u16, outcome: Outcome) -> Self {
        Self { host, port, outcome, timestamp: SystemTime::now() }
    }
}

/// Everything a worker reports to the sink.
#[derive(Debug, Clone)]
pub enum WorkerEvent {
    Availability(AvailabilityEvent),
    Fatal { host: HostEntry, error: CheckError },
}

impl WorkerEvent {
    pub fn host(&self) -> &HostEntry {
        match self {
            WorkerEvent::Availability(event) => &event.host,
            WorkerEvent::Fatal { host, .. } => host,
        }
    }
}

/// How a worker's loop ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkerExit {
    /// The shutdown signal was observed
    Shutdown,
    /// The host could not be checked at all
    Failed(CheckError),
}
