//! Local process execution.

use super::ExecOutput;
use std::path::Path;
use std::process::{Command, Stdio};

/// Run a program directly (no shell) and capture its output.
/// Blocks until the process exits; there is no timeout.
pub fn exec_local(program: &Path, args: &[&str]) -> Result<ExecOutput, String> {
    let output = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .map_err(|e| format!("failed to spawn {}: {}", program.display(), e))?;

    Ok(ExecOutput {
        exit_code: output.status.code().unwrap_or(-1),
        stdout: String::from_utf8_lossy(&output.stdout).to_string(),
        stderr: String::from_utf8_lossy(&output.stderr).to_string(),
    })
}
