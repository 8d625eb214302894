use std::io;
use std::time::Duration;

use tokio::net::{TcpSocket, lookup_host};
use tokio::time::timeout;
use tracing::debug;

use super::types::{CheckError, Outcome};
use crate::hosts::HostEntry;

/// Port every host is checked on unless configured otherwise
pub const DEFAULT_PORT: u16 = 80;

/// Checker trait for a single availability check
#[async_trait::async_trait]
pub trait Checker: Send + Sync {
    /// Port each check connects to
    fn port(&self) -> u16;

    /// Check the host once. `Err` means the host can never be checked and the
    /// worker should stop.
    async fn check(&self, host: &HostEntry) -> Result<Outcome, CheckError>;
}

/// TCP handshake checker
///
/// Every call resolves the host, opens a fresh socket and drops it again once
/// the handshake has succeeded or failed. Connections are never reused.
#[derive(Debug, Clone)]
pub struct TcpChecker {
    port: u16,
    timeout_duration: Duration,
}

impl TcpChecker {
    pub fn new(port: u16, connect_timeout: Duration) -> Self {
        Self { port, timeout_duration: connect_timeout }
    }
}

#[async_trait::async_trait]
impl Checker for TcpChecker {
    fn port(&self) -> u16 {
        self.port
    }

    async fn check(&self, host: &HostEntry) -> Result<Outcome, CheckError> {
        let unresolvable = |reason: String| CheckError::HostUnresolvable {
            host: host.to_string(),
            reason,
        };

        // Only the first resolved address is tried.
        let addr = lookup_host((host.as_str(), self.port))
            .await
            .map_err(|e| unresolvable(e.to_string()))?
            .next()
            .ok_or_else(|| unresolvable("no addresses returned".to_string()))?;

        let socket = (if addr.is_ipv4() { TcpSocket::new_v4() } else { TcpSocket::new_v6() })
            .map_err(|e| CheckError::SocketUnavailable {
                host: host.to_string(),
                reason: e.to_string(),
            })?;

        debug!(%host, %addr, "connecting");

        Ok(connect_within(self.timeout_duration, socket.connect(addr)).await)
    }
}

/// Drive a connection attempt for at most `limit`. The stream, if any, is
/// dropped straight away.
async fn connect_within<T>(
    limit: Duration,
    connect: impl Future<Output = io::Result<T>>,
) -> Outcome {
    match timeout(limit, connect).await {
        Ok(Ok(_stream)) => Outcome::Reachable,
        Ok(Err(e)) => Outcome::Unreachable { reason: e.to_string() },
        Err(_) => Outcome::Unreachable {
            reason: format!("connection timed out after {limit:?}"),
        },
    }
}
