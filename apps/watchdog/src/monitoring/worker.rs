use std::sync::Arc;
use std::time::Duration;

use tokio::time::sleep;
use tracing::debug;

use super::checker::Checker;
use super::sink::EventSink;
use super::types::{AvailabilityEvent, WorkerEvent, WorkerExit};
use crate::hosts::HostEntry;
use crate::shutdown::ShutdownSignal;

/// Check loop for a single host
///
/// Each cycle connects, reports the outcome, then sleeps for `interval`. The
/// loop only ends when the shutdown signal is seen after a cycle, or when the
/// host cannot be checked at all.
pub struct HealthCheckWorker {
    host: HostEntry,
    checker: Arc<dyn Checker>,
    sink: Arc<dyn EventSink>,
    interval: Duration,
}

impl HealthCheckWorker {
    pub fn new(
        host: HostEntry,
        checker: Arc<dyn Checker>,
        sink: Arc<dyn EventSink>,
        interval: Duration,
    ) -> Self {
        Self { host, checker, sink, interval }
    }

    /// Run until `shutdown` is triggered or the host turns out to be unusable.
    ///
    /// A connection attempt in flight is never cut short; the sleep between
    /// cycles is.
    pub async fn run(self, shutdown: ShutdownSignal) -> WorkerExit {
        let port = self.checker.port();
        debug!(host = %self.host, port, "worker started");

        loop {
            match self.checker.check(&self.host).await {
                Ok(outcome) => {
                    let event = AvailabilityEvent::new(self.host.clone(), port, outcome);
                    self.sink.emit(WorkerEvent::Availability(event));
                }
                Err(error) => {
                    self.sink.emit(WorkerEvent::Fatal {
                        host: self.host.clone(),
                        error: error.clone(),
                    });
                    return WorkerExit::Failed(error);
                }
            }

            tokio::select! {
                _ = sleep(self.interval) => {}
                _ = shutdown.triggered() => {}
            }

            if shutdown.is_triggered() {
                debug!(host = %self.host, "worker stopped");
                return WorkerExit::Shutdown;
            }
        }
    }
}
