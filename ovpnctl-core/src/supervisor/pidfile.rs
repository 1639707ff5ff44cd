//! PID file management
//!
//! Each running tunnel is tracked by `<pid_dir>/<name>.pid`, written by the
//! daemon itself. The supervisor only reads and removes these files.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

const PID_EXTENSION: &str = "pid";

/// A PID file on disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PidFile {
    /// Unit name, taken from the file stem
    pub name: String,
    path: PathBuf,
}

impl PidFile {
    /// Create a handle for an existing or future PID file
    pub fn new(path: PathBuf) -> Option<Self> {
        let name = path.file_stem()?.to_str()?.to_string();
        Some(Self { name, path })
    }

    /// PID file of a named unit inside the PID directory
    pub fn named(pid_dir: &Path, name: &str) -> Self {
        Self {
            name: name.to_string(),
            path: pid_dir.join(format!("{}.{}", name, PID_EXTENSION)),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the recorded process id
    ///
    /// Returns `None` for a missing or empty file. Content that is not a
    /// usable process id is logged and also treated as empty, so it is never
    /// used as a signal target.
    pub fn read_pid(&self) -> Option<i32> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return None,
            Err(e) => {
                warn!("Failed to read PID file {:?}: {}", self.path, e);
                return None;
            }
        };

        let trimmed = content.trim();
        if trimmed.is_empty() {
            return None;
        }

        match trimmed.parse::<i32>() {
            Ok(pid) if pid > 1 => Some(pid),
            Ok(pid) => {
                warn!("Ignoring unsafe process id {} in {:?}", pid, self.path);
                None
            }
            Err(_) => {
                warn!("Ignoring invalid PID file content in {:?}", self.path);
                None
            }
        }
    }

    /// Remove the file; a file that is already gone is not an error
    pub fn remove(&self) -> io::Result<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => {
                debug!("Removed PID file {:?}", self.path);
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e),
        }
    }
}

/// List the PID files in the PID directory
///
/// A missing directory simply holds no PID files.
pub fn list_pid_files(pid_dir: &Path) -> io::Result<Vec<PidFile>> {
    let entries = match fs::read_dir(pid_dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e),
    };

    let mut files = Vec::new();
    for entry in entries {
        let path = entry?.path();
        if path.is_file() && path.extension().and_then(|ext| ext.to_str()) == Some(PID_EXTENSION) {
            if let Some(pid_file) = PidFile::new(path) {
                files.push(pid_file);
            }
        }
    }

    Ok(files)
}

/// Remove every PID file in the PID directory
pub fn remove_all(pid_dir: &Path) -> io::Result<usize> {
    let files = list_pid_files(pid_dir)?;
    for file in &files {
        file.remove()?;
    }
    Ok(files.len())
}
