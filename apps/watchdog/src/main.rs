#![warn(clippy::all, clippy::pedantic)]

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tracing::{error, info};

mod error;

use error::AppError;
use logger::{init_tracing, init_tracing_with_level};
use watchdogd::config::Config;
use watchdogd::hosts;
use watchdogd::monitoring::{LogSink, TcpChecker, WorkerSupervisor};
use watchdogd::pidfile::PidFile;
use watchdogd::shutdown::{ShutdownSignal, TerminationListener};

/// Continuously monitors a collection of TCP/IP hosts for availability.
///
/// Stop it with `kill -USR1 $(cat /tmp/watchdog.pid)`.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// Config file, created with defaults if missing
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Host list, one host per line
    #[arg(long)]
    hosts: Option<PathBuf>,

    #[arg(long)]
    pid_file: Option<PathBuf>,

    /// TCP port to check on every host
    #[arg(short, long)]
    port: Option<u16>,

    /// Milliseconds between checks of the same host
    #[arg(long)]
    interval_ms: Option<u64>,

    #[arg(long)]
    connect_timeout_ms: Option<u64>,

    /// Print the effective configuration and exit
    #[arg(long)]
    print_config: bool,
}

impl Args {
    fn load_config(&self) -> Result<Config, AppError> {
        let mut config = Config::from_config(self.config.as_deref())?;

        if let Some(hosts) = &self.hosts {
            config.watchdog.hosts_file.clone_from(hosts);
        }
        if let Some(pid_file) = &self.pid_file {
            config.watchdog.pid_file.clone_from(pid_file);
        }
        if let Some(port) = self.port {
            config.check.port = port;
        }
        if let Some(interval_ms) = self.interval_ms {
            config.check.interval_ms = interval_ms;
        }
        if let Some(connect_timeout_ms) = self.connect_timeout_ms {
            config.check.connect_timeout_ms = connect_timeout_ms;
        }

        config.validate()?;
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> Result<(), AppError> {
    let args = Args::parse();

    let config = match args.load_config() {
        Ok(config) => config,
        Err(err) => {
            init_tracing();
            error!("{err}");
            return Err(err);
        }
    };

    if args.print_config {
        print!("{config}");
        return Ok(());
    }

    init_tracing_with_level(&config.watchdog.log_level);

    run(config).await.inspect_err(|err| error!("{err}"))
}

async fn run(config: Config) -> Result<(), AppError> {
    info!("TCP/IP Watchdog started");

    // Handlers go in before the pid file advertises us as killable.
    let signals = TerminationListener::install().map_err(AppError::Signals)?;
    let shutdown = ShutdownSignal::new();
    let listener = tokio::spawn(signals.wait(shutdown.clone()));

    let pid_file = PidFile::create(&config.watchdog.pid_file)?;
    let hosts = hosts::load_file(&config.watchdog.hosts_file)?;
    info!(
        hosts = hosts.len(),
        path = %config.watchdog.hosts_file.display(),
        "host list loaded"
    );

    let checker = Arc::new(TcpChecker::new(config.check.port, config.check.connect_timeout()));
    let supervisor = WorkerSupervisor::new(checker, Arc::new(LogSink), config.check.interval());

    let workers = supervisor.start(hosts, shutdown);
    workers.await_shutdown().await;

    listener.abort();
    drop(pid_file);
    info!("TCP/IP Watchdog stopped");

    Ok(())
}
