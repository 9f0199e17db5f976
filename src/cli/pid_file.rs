//! PID file guarding a single running recorder

use std::fs;
use std::path::{Path, PathBuf};
use std::process;

use nix::errno::Errno;
use nix::sys::signal::{kill, Signal};
use nix::unistd::Pid;

const PID_FILE_NAME: &str = "studio-recorder.pid";

/// PID file in the runtime directory
pub struct PidFile {
    path: PathBuf,
    owned: bool,
}

impl PidFile {
    /// `$XDG_RUNTIME_DIR/studio-recorder.pid`, or the temp dir
    pub fn new() -> Self {
        let dir = dirs::runtime_dir().unwrap_or_else(std::env::temp_dir);
        Self::with_path(dir.join(PID_FILE_NAME))
    }

    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            owned: false,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// PID of a live recorder holding the file, if any.
    ///
    /// A file naming a dead process is removed.
    pub fn running_pid(&self) -> Option<u32> {
        let contents = fs::read_to_string(&self.path).ok()?;
        let pid: u32 = contents.trim().parse().ok()?;

        // signal 0 only checks for existence
        match kill(Pid::from_raw(pid as i32), None::<Signal>) {
            Ok(()) => Some(pid),
            Err(Errno::ESRCH) => {
                let _ = fs::remove_file(&self.path);
                None
            }
            Err(Errno::EPERM) => Some(pid),
            Err(_) => None,
        }
    }

    pub fn acquire(&mut self) -> Result<(), PidFileError> {
        if let Some(pid) = self.running_pid() {
            if pid != process::id() {
                return Err(PidFileError::AlreadyRunning(pid));
            }
        }

        fs::write(&self.path, process::id().to_string())
            .map_err(|e| PidFileError::WriteFailed(e.to_string()))?;
        self.owned = true;
        Ok(())
    }

    pub fn release(&mut self) -> Result<(), PidFileError> {
        if self.owned && self.path.exists() {
            fs::remove_file(&self.path).map_err(|e| PidFileError::RemoveFailed(e.to_string()))?;
        }
        self.owned = false;
        Ok(())
    }
}

impl Default for PidFile {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for PidFile {
    fn drop(&mut self) {
        let _ = self.release();
    }
}

#[derive(Debug, thiserror::Error)]
pub enum PidFileError {
    #[error("Another recorder is already running (PID: {0})")]
    AlreadyRunning(u32),

    #[error("Failed to write PID file: {0}")]
    WriteFailed(String),

    #[error("Failed to remove PID file: {0}")]
    RemoveFailed(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_name() {
        assert!(PidFile::new().path().ends_with(PID_FILE_NAME));
    }

    #[test]
    fn missing_file_means_not_running() {
        let dir = tempfile::tempdir().unwrap();
        let pid_file = PidFile::with_path(dir.path().join("none.pid"));
        assert!(pid_file.running_pid().is_none());
    }

    #[test]
    fn acquire_writes_own_pid_and_release_removes_it() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rec.pid");
        let mut pid_file = PidFile::with_path(&path);

        pid_file.acquire().unwrap();
        assert_eq!(pid_file.running_pid(), Some(process::id()));

        pid_file.release().unwrap();
        assert!(!path.exists());
    }

    #[test]
    fn garbage_file_is_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rec.pid");
        fs::write(&path, "not a pid").unwrap();

        let mut pid_file = PidFile::with_path(&path);
        pid_file.acquire().unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), process::id().to_string());
    }

    #[test]
    fn release_leaves_foreign_file_alone() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rec.pid");
        fs::write(&path, "1").unwrap();

        let mut pid_file = PidFile::with_path(&path);
        pid_file.release().unwrap();
        assert!(path.exists());
    }
}
