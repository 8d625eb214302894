//! Process-wide termination request.

use std::io;

use tokio::signal;
use tokio_util::sync::CancellationToken;
#[cfg(not(unix))]
use tracing::error;
use tracing::info;

/// Write-once shutdown flag shared by the supervisor and every worker.
///
/// Clones observe the same state. Once triggered it stays triggered.
#[derive(Debug, Clone, Default)]
pub struct ShutdownSignal {
    token: CancellationToken,
}

impl ShutdownSignal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request shutdown. Calling this again, from any thread, has no further effect.
    pub fn trigger(&self) {
        self.token.cancel();
    }

    pub fn is_triggered(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Resolves once [`trigger`](Self::trigger) has been called.
    pub async fn triggered(&self) {
        self.token.cancelled().await;
    }
}

/// OS termination requests, registered up front so none is missed.
///
/// SIGUSR1 is the watchdog's documented stop signal; SIGTERM and SIGINT are
/// honoured as well.
#[derive(Debug)]
pub struct TerminationListener {
    #[cfg(unix)]
    user1: signal::unix::Signal,
    #[cfg(unix)]
    terminate: signal::unix::Signal,
    #[cfg(unix)]
    interrupt: signal::unix::Signal,
}

impl TerminationListener {
    /// Install the handlers. Must be called from within a Tokio runtime.
    #[cfg(unix)]
    pub fn install() -> io::Result<Self> {
        use signal::unix::{SignalKind, signal};

        Ok(Self {
            user1: signal(SignalKind::user_defined1())?,
            terminate: signal(SignalKind::terminate())?,
            interrupt: signal(SignalKind::interrupt())?,
        })
    }

    #[cfg(not(unix))]
    pub fn install() -> io::Result<Self> {
        Ok(Self {})
    }

    /// Wait for a termination request and trigger `shutdown`. Returns early
    /// if `shutdown` is triggered some other way.
    #[cfg(unix)]
    pub async fn wait(mut self, shutdown: ShutdownSignal) {
        tokio::select! {
            _ = self.user1.recv() => info!("received SIGUSR1, stopping workers"),
            _ = self.terminate.recv() => info!("received SIGTERM, stopping workers"),
            _ = self.interrupt.recv() => info!("received SIGINT, stopping workers"),
            _ = shutdown.triggered() => return,
        }

        shutdown.trigger();
    }

    #[cfg(not(unix))]
    pub async fn wait(self, shutdown: ShutdownSignal) {
        tokio::select! {
            result = signal::ctrl_c() => match result {
                Ok(()) => info!("received Ctrl+C, stopping workers"),
                Err(err) => {
                    error!("failed to listen for Ctrl+C: {}", err);
                    return;
                }
            },
            _ = shutdown.triggered() => return,
        }

        shutdown.trigger();
    }
}
