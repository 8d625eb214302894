use tokio::sync::mpsc;
use tracing::{error, info, warn};

use super::types::{Outcome, WorkerEvent};

/// Destination for worker events.
///
/// `emit` is called from every worker task and must not block.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: WorkerEvent);
}

/// Writes every event to the process log
#[derive(Debug, Clone, Copy, Default)]
pub struct LogSink;

impl EventSink for LogSink {
    fn emit(&self, event: WorkerEvent) {
        match event {
            WorkerEvent::Availability(event) => match &event.outcome {
                Outcome::Reachable => info!(
                    host = %event.host,
                    port = event.port,
                    "http://{}:{} is alive!",
                    event.host,
                    event.port
                ),
                Outcome::Unreachable { reason } => warn!(
                    host = %event.host,
                    port = event.port,
                    %reason,
                    "Host {} is not responding",
                    event.host
                ),
            },
            WorkerEvent::Fatal { host, error } => {
                error!(%host, "{error}, stopping its worker")
            }
        }
    }
}

/// Forwards events into a channel, for callers that want to consume them.
///
/// Events are dropped once the receiver is gone.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<WorkerEvent>,
}

impl ChannelSink {
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<WorkerEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl EventSink for ChannelSink {
    fn emit(&self, event: WorkerEvent) {
        let _ = self.tx.send(event);
    }
}
