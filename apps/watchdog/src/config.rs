use std::time::Duration;
use std::{env, fmt, fs, io, path};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::monitoring::DEFAULT_PORT;

/// Milliseconds between two checks of the same host
pub const WD_INTERVAL_MS: u64 = 5_000;

/// Upper bound on a single connection attempt
pub const DEFAULT_CONNECT_TIMEOUT_MS: u64 = 3_000;

pub const DEFAULT_HOSTS_FILE: &str = "/tmp/watchdog.dat";
pub const DEFAULT_PID_FILE: &str = "/tmp/watchdog.pid";

#[derive(Debug, Error)]
pub enum Error {
    #[error("failed to read config {}: {source}", .path.display())]
    ReadFailed {
        path: path::PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to write config {}: {source}", .path.display())]
    WriteFailed {
        path: path::PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to parse config: {0}")]
    ParseFailed(#[from] toml::de::Error),
    #[error("failed to serialize config: {0}")]
    SerializeFailed(#[from] toml::ser::Error),
    #[error("no config path available, set XDG_CONFIG_HOME or HOME")]
    ConfigPathUnavailable,
    #[error("invalid config: {0}")]
    Invalid(&'static str),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub watchdog: Watchdog,
    pub check: Check,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Watchdog {
    /// File listing one host per line
    pub hosts_file: path::PathBuf,
    /// Where the process id is recorded while running
    pub pid_file: path::PathBuf,
    /// Default log level when `RUST_LOG` is not set
    pub log_level: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Check {
    pub port: u16,
    pub interval_ms: u64,
    pub connect_timeout_ms: u64,
}

impl Default for Watchdog {
    fn default() -> Self {
        Self {
            hosts_file: DEFAULT_HOSTS_FILE.into(),
            pid_file: DEFAULT_PID_FILE.into(),
            log_level: "info".into(),
        }
    }
}

impl Default for Check {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            interval_ms: WD_INTERVAL_MS,
            connect_timeout_ms: DEFAULT_CONNECT_TIMEOUT_MS,
        }
    }
}

impl Check {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }
}

/// Used to ensure we are actually reading a toml file
fn normalize_toml_path(path: &path::Path) -> path::PathBuf {
    let mut path = path.to_path_buf();
    if path.extension().map(|ext| ext != "toml").unwrap_or(true) {
        path.set_extension("toml");
    }
    path
}

/// Get default config path ($XDG_CONFIG_HOME/watchdogd/config.toml or
/// $HOME/.config/...)
fn default_config_path() -> Result<path::PathBuf, Error> {
    let path = if let Ok(config_home) = env::var("XDG_CONFIG_HOME") {
        path::PathBuf::from(config_home)
    } else if let Some(home_dir) = env::home_dir() {
        home_dir.join(".config")
    } else {
        return Err(Error::ConfigPathUnavailable);
    };

    Ok(path.join("watchdogd/config.toml"))
}

impl fmt::Display for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let write_indented = |level: usize| {
            move |f: &mut fmt::Formatter<'_>, label: &str, value: &dyn fmt::Display| {
                writeln!(f, "  {:indent$}{}: {}", "", label, value, indent = level * 2)
            }
        };
        let write_title_indented = |level: usize| {
            move |f: &mut fmt::Formatter<'_>, label: &str| {
                writeln!(f, "{:indent$}{}", "", label, indent = level * 2)
            }
        };

        let write_title_1 = write_title_indented(1);
        let write_1 = write_indented(1);

        writeln!(f, "Current Internal Configuration State:")?;
        write_title_1(f, "Watchdog")?;
        write_1(f, "Hosts File", &self.watchdog.hosts_file.display())?;
        write_1(f, "PID File", &self.watchdog.pid_file.display())?;
        write_1(f, "Log Level", &self.watchdog.log_level)?;
        write_title_1(f, "Check")?;
        write_1(f, "Port", &self.check.port)?;
        write_1(f, "Interval (ms)", &self.check.interval_ms)?;
        write_1(f, "Connect Timeout (ms)", &self.check.connect_timeout_ms)?;

        Ok(())
    }
}

impl Config {
    /// Generate Config structure from file
    ///
    /// Creates a default config in ~/.config/watchdogd/config.toml
    ///  or the specified path, with the name config.toml if one does not exist
    ///
    /// ```no_run
    /// # use std::path;
    /// use watchdogd::config::Config;
    ///
    /// let cfg = Config::from_config(None::<&path::Path>)?;
    /// println!("{}", cfg);
    /// # Ok::<(), watchdogd::config::Error>(())
    /// ```
    pub fn from_config(optional_path: Option<impl AsRef<path::Path>>) -> Result<Self, Error> {
        let config_path: path::PathBuf = if let Some(path) = optional_path {
            normalize_toml_path(path.as_ref())
        } else {
            default_config_path()?
        };

        if config_path.exists() {
            let raw_string = fs::read_to_string(&config_path)
                .map_err(|source| Error::ReadFailed { path: config_path.clone(), source })?;
            Ok(toml::from_str(raw_string.as_str())?)
        } else {
            let config = Self::default();
            config.write_config(&config_path)?;
            Ok(config)
        }
    }

    /// Serialize and write a config to a file
    pub fn write_config(&self, path: &path::Path) -> Result<(), Error> {
        let config_str: String = toml::to_string_pretty(self)?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .map_err(|source| Error::WriteFailed { path: path.into(), source })?;
        }

        fs::write(path, config_str)
            .map_err(|source| Error::WriteFailed { path: path.into(), source })
    }

    /// Reject values the monitoring loop cannot run with
    pub fn validate(&self) -> Result<(), Error> {
        if self.check.port == 0 {
            return Err(Error::Invalid("check.port must not be 0"));
        }
        if self.check.interval_ms == 0 {
            return Err(Error::Invalid("check.interval_ms must be greater than 0"));
        }
        if self.check.connect_timeout_ms == 0 {
            return Err(Error::Invalid("check.connect_timeout_ms must be greater than 0"));
        }
        Ok(())
    }
}
