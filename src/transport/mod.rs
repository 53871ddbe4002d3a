//! Locating generator binaries and running them.
//!
//! `ToolProbe` is the seam between resolution and the host system: the
//! system probe searches `PATH` and spawns processes, tests substitute a fake.

pub mod local;

use std::path::{Path, PathBuf};

/// Output from running a program.
#[derive(Debug, Clone)]
pub struct ExecOutput {
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
}

impl ExecOutput {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

/// Finds executables and runs them.
pub trait ToolProbe: Send + Sync {
    /// Full path of an executable, if installed.
    fn locate(&self, executable: &str) -> Option<PathBuf>;

    /// Run `path args...` to completion.
    fn run(&self, path: &Path, args: &[&str]) -> Result<ExecOutput, String>;
}

/// Probe backed by the host `PATH` and local process execution.
#[derive(Debug, Clone)]
pub struct SystemProbe {
    search_path: Vec<PathBuf>,
}

impl SystemProbe {
    /// Search the directories of the current `PATH`.
    pub fn from_env() -> Self {
        let search_path = std::env::var_os("PATH")
            .map(|p| std::env::split_paths(&p).collect())
            .unwrap_or_default();
        Self { search_path }
    }

    /// Search only the given directories.
    pub fn with_search_path(search_path: Vec<PathBuf>) -> Self {
        Self { search_path }
    }
}

impl Default for SystemProbe {
    fn default() -> Self {
        Self::from_env()
    }
}

impl ToolProbe for SystemProbe {
    fn locate(&self, executable: &str) -> Option<PathBuf> {
        // Absolute or relative paths are taken as-is.
        let as_path = Path::new(executable);
        if as_path.components().count() > 1 {
            return is_executable(as_path).then(|| as_path.to_path_buf());
        }
        self.search_path.iter().find_map(|dir| {
            candidate_names(executable)
                .into_iter()
                .map(|name| dir.join(name))
                .find(|p| is_executable(p))
        })
    }

    fn run(&self, path: &Path, args: &[&str]) -> Result<ExecOutput, String> {
        local::exec_local(path, args)
    }
}

fn candidate_names(executable: &str) -> Vec<String> {
    if cfg!(windows) {
        vec![format!("{}.exe", executable), executable.to_string()]
    } else {
        vec![executable.to_string()]
    }
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    std::fs::metadata(path)
        .map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}
