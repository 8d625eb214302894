use std::io;

use thiserror::Error;

use watchdogd::LoadError;
use watchdogd::config::Error as ConfigError;
use watchdogd::pidfile::PidFileError;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    Config(#[from] ConfigError),
    #[error("{0}")]
    HostList(#[from] LoadError),
    #[error("{0}")]
    PidFile(#[from] PidFileError),
    #[error("failed to install signal handlers: {0}")]
    Signals(#[source] io::Error),
}
