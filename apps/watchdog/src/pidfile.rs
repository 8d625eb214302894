//! PID file bookkeeping. The file lets `kill -USR1 $(cat watchdog.pid)` find us.

use std::path::{Path, PathBuf};
use std::{fs, io, process};

use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Error)]
#[error("failed to write pid file {}: {source}", .path.display())]
pub struct PidFileError {
    path: PathBuf,
    #[source]
    source: io::Error,
}

/// Removes the file again when dropped
#[derive(Debug)]
pub struct PidFile {
    path: PathBuf,
}

impl PidFile {
    /// Record the current process id at `path`, replacing any stale file.
    pub fn create(path: impl Into<PathBuf>) -> Result<Self, PidFileError> {
        let path = path.into();

        if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .map_err(|source| PidFileError { path: path.clone(), source })?;
        }
        fs::write(&path, process::id().to_string())
            .map_err(|source| PidFileError { path: path.clone(), source })?;

        debug!(path = %path.display(), "pid file written");
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for PidFile {
    fn drop(&mut self) {
        if let Err(err) = fs::remove_file(&self.path) {
            if err.kind() != io::ErrorKind::NotFound {
                warn!(path = %self.path.display(), "failed to remove pid file: {err}");
            }
        }
    }
}
