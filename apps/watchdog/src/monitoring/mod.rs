//! Monitoring engine module - runs the per-host check loops
//!
//! This module is responsible for:
//! - Probing hosts with a fresh TCP connection every cycle
//! - Running one worker per host until shutdown
//! - Reporting availability events to a sink

pub mod checker;
pub mod sink;
pub mod supervisor;
pub mod types;
pub mod worker;

pub use checker::{Checker, DEFAULT_PORT, TcpChecker};
pub use sink::{ChannelSink, EventSink, LogSink};
pub use supervisor::{ShutdownReport, SupervisorHandle, WorkerHandle, WorkerSupervisor};
pub use types::{AvailabilityEvent, CheckError, Outcome, WorkerEvent, WorkerExit};
pub use worker::HealthCheckWorker;
