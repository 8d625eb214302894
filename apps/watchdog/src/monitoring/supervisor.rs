use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use super::checker::Checker;
use super::sink::EventSink;
use super::types::WorkerExit;
use super::worker::HealthCheckWorker;
use crate::hosts::{HostEntry, HostList};
use crate::shutdown::ShutdownSignal;

/// A spawned worker and the host it watches
#[derive(Debug)]
pub struct WorkerHandle {
    host: HostEntry,
    task: JoinHandle<WorkerExit>,
}

impl WorkerHandle {
    pub fn host(&self) -> &HostEntry {
        &self.host
    }

    pub fn is_live(&self) -> bool {
        !self.task.is_finished()
    }
}

/// Summary of how the workers ended
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ShutdownReport {
    /// Workers that observed the shutdown signal
    pub stopped: usize,
    /// Workers that ended early because their host could not be checked
    pub failed: usize,
    /// Workers whose task panicked or was cancelled
    pub crashed: usize,
}

impl ShutdownReport {
    pub fn total(&self) -> usize {
        self.stopped + self.failed + self.crashed
    }
}

/// The set of workers started by [`WorkerSupervisor::start`]
#[derive(Debug)]
pub struct SupervisorHandle {
    workers: Vec<WorkerHandle>,
    shutdown: ShutdownSignal,
}

impl SupervisorHandle {
    /// Number of workers spawned, one per host entry
    pub fn len(&self) -> usize {
        self.workers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.workers.is_empty()
    }

    /// Number of workers whose loop has not ended yet
    pub fn live_workers(&self) -> usize {
        self.workers.iter().filter(|worker| worker.is_live()).count()
    }

    pub fn workers(&self) -> &[WorkerHandle] {
        &self.workers
    }

    /// Block until shutdown is requested, then wait for every worker to finish.
    pub async fn await_shutdown(self) -> ShutdownReport {
        self.shutdown.triggered().await;
        info!(workers = self.workers.len(), "waiting for workers to stop");

        let mut report = ShutdownReport::default();
        for WorkerHandle { host, task } in self.workers {
            match task.await {
                Ok(WorkerExit::Shutdown) => report.stopped += 1,
                Ok(WorkerExit::Failed(_)) => report.failed += 1,
                Err(e) => {
                    error!(%host, "worker task ended abnormally: {e}");
                    report.crashed += 1;
                }
            }
        }

        info!(
            stopped = report.stopped,
            failed = report.failed,
            crashed = report.crashed,
            "all workers stopped"
        );
        report
    }
}

/// Starts one [`HealthCheckWorker`] per host and tracks them until shutdown
pub struct WorkerSupervisor {
    checker: Arc<dyn Checker>,
    sink: Arc<dyn EventSink>,
    interval: Duration,
}

impl WorkerSupervisor {
    pub fn new(checker: Arc<dyn Checker>, sink: Arc<dyn EventSink>, interval: Duration) -> Self {
        Self { checker, sink, interval }
    }

    /// Spawn a worker for every entry, in list order.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn start(&self, hosts: HostList, shutdown: ShutdownSignal) -> SupervisorHandle {
        if hosts.is_empty() {
            warn!("host list is empty, nothing to monitor");
        }

        let mut workers = Vec::with_capacity(hosts.len());
        for host in hosts {
            let worker = HealthCheckWorker::new(
                host.clone(),
                self.checker.clone(),
                self.sink.clone(),
                self.interval,
            );
            let task = tokio::spawn(worker.run(shutdown.clone()));
            workers.push(WorkerHandle { host, task });
        }

        info!(
            workers = workers.len(),
            port = self.checker.port(),
            interval = ?self.interval,
            "monitoring started"
        );

        SupervisorHandle { workers, shutdown }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hosts;
    use crate::monitoring::sink::ChannelSink;
    use crate::monitoring::types::{CheckError, Outcome, WorkerEvent};
    use std::collections::HashMap;
    use std::io::Cursor;
    use std::path::Path;

    /// Hosts ending in `.invalid` cannot be resolved and hosts ending in
    /// `.nosocket` never get a socket. Everything else is up.
    struct FakeChecker;

    #[async_trait::async_trait]
    impl Checker for FakeChecker {
        fn port(&self) -> u16 {
            80
        }

        async fn check(&self, host: &HostEntry) -> Result<Outcome, CheckError> {
            if host.as_str().ends_with(".invalid") {
                Err(CheckError::HostUnresolvable {
                    host: host.to_string(),
                    reason: "nxdomain".into(),
                })
            } else if host.as_str().ends_with(".nosocket") {
                Err(CheckError::SocketUnavailable {
                    host: host.to_string(),
                    reason: "Too many open files (os error 24)".into(),
                })
            } else {
                Ok(Outcome::Reachable)
            }
        }
    }

    fn supervisor(sink: ChannelSink) -> WorkerSupervisor {
        WorkerSupervisor::new(Arc::new(FakeChecker), Arc::new(sink), Duration::from_secs(5))
    }

    fn host_list(input: &str) -> HostList {
        hosts::load(Cursor::new(input), Path::new("<memory>")).unwrap()
    }

    #[tokio::test(start_paused = true)]
    async fn test_one_worker_per_entry() {
        let (sink, _rx) = ChannelSink::channel();
        let shutdown = ShutdownSignal::new();
        let hosts = host_list("# hosts\na.example\n\n  b.example  \n   # skip   \na.example\n");

        let handle = supervisor(sink).start(hosts, shutdown.clone());
        assert_eq!(handle.len(), 3);
        let watched: Vec<_> = handle.workers().iter().map(|w| w.host().as_str()).collect();
        assert_eq!(watched, ["a.example", "b.example", "a.example"]);

        shutdown.trigger();
        let report = handle.await_shutdown().await;
        assert_eq!(report, ShutdownReport { stopped: 3, failed: 0, crashed: 0 });
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_worker_does_not_affect_others() {
        let (sink, mut rx) = ChannelSink::channel();
        let shutdown = ShutdownSignal::new();
        let hosts = host_list("up.example\nbad.invalid\nalso-up.example\n");

        let handle = supervisor(sink).start(hosts, shutdown.clone());

        let mut counts: HashMap<String, usize> = HashMap::new();
        let mut fatal = 0;
        while counts.values().filter(|&&n| n >= 3).count() < 2 {
            match rx.recv().await.unwrap() {
                WorkerEvent::Availability(event) => {
                    *counts.entry(event.host.to_string()).or_default() += 1
                }
                WorkerEvent::Fatal { host, .. } => {
                    assert_eq!(host.as_str(), "bad.invalid");
                    fatal += 1;
                }
            }
        }
        assert_eq!(fatal, 1);
        assert_eq!(handle.live_workers(), 2);

        shutdown.trigger();
        let report = handle.await_shutdown().await;
        assert_eq!(report, ShutdownReport { stopped: 2, failed: 1, crashed: 0 });
    }

    #[tokio::test(start_paused = true)]
    async fn test_socket_failure_does_not_affect_others() {
        let (sink, mut rx) = ChannelSink::channel();
        let shutdown = ShutdownSignal::new();
        let hosts = host_list("up.example
fd-starved.nosocket
also-up.example
");

        let handle = supervisor(sink).start(hosts, shutdown.clone());

        let mut counts: HashMap<String, usize> = HashMap::new();
        let mut fatal = Vec::new();
        while counts.values().filter(|&&n| n >= 3).count() < 2 {
            match rx.recv().await.unwrap() {
                WorkerEvent::Availability(event) => {
                    assert!(event.outcome.is_reachable());
                    *counts.entry(event.host.to_string()).or_default() += 1
                }
                WorkerEvent::Fatal { host, error } => fatal.push((host, error)),
            }
        }
        assert_eq!(fatal.len(), 1);
        assert_eq!(fatal[0].0.as_str(), "fd-starved.nosocket");
        assert!(matches!(fatal[0].1, CheckError::SocketUnavailable { .. }));
        assert!(!counts.contains_key("fd-starved.nosocket"));
        assert_eq!(handle.live_workers(), 2);

        shutdown.trigger();
        let report = handle.await_shutdown().await;
        assert_eq!(report, ShutdownReport { stopped: 2, failed: 1, crashed: 0 });
    }

    #[tokio::test(start_paused = true)]
    async fn test_start_with_interval_beyond_u64_millis() {
        let (sink, mut rx) = ChannelSink::channel();
        let shutdown = ShutdownSignal::new();
        let supervisor =
            WorkerSupervisor::new(Arc::new(FakeChecker), Arc::new(sink), Duration::MAX);

        let handle = supervisor.start(host_list("up.example\n"), shutdown.clone());
        assert!(matches!(rx.recv().await, Some(WorkerEvent::Availability(_))));

        shutdown.trigger();
        let report = handle.await_shutdown().await;
        assert_eq!(report, ShutdownReport { stopped: 1, failed: 0, crashed: 0 });
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_worker_outlives_await_shutdown() {
        let (sink, _rx) = ChannelSink::channel();
        let shutdown = ShutdownSignal::new();
        let input: String = (0..60).map(|i| format!("host-{i}.example\n")).collect();

        let handle = supervisor(sink).start(host_list(&input), shutdown.clone());
        assert_eq!(handle.len(), 60);

        let trigger = {
            let shutdown = shutdown.clone();
            tokio::spawn(async move {
                tokio::time::sleep(Duration::from_secs(12)).await;
                shutdown.trigger();
            })
        };

        let report = handle.await_shutdown().await;
        assert_eq!(report.total(), 60);
        assert_eq!(report.stopped, 60);
        trigger.await.unwrap();
    }

    #[tokio::test]
    async fn test_empty_host_list() {
        let (sink, _rx) = ChannelSink::channel();
        let shutdown = ShutdownSignal::new();

        let handle = supervisor(sink).start(HostList::new(), shutdown.clone());
        assert!(handle.is_empty());

        shutdown.trigger();
        assert_eq!(handle.await_shutdown().await.total(), 0);
    }
}
