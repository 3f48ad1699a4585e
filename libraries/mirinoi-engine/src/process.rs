/// Helpers for running external programs
use crate::error::{EngineError, Result};
use std::path::Path;
use std::process::{Child, Command, Stdio};

/// Run `program` to completion and return its stdout
pub(crate) fn run_capture(program: &Path, args: &[&str]) -> Result<String> {
    let output = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .map_err(|e| EngineError::spawn(program, e))?;

    if !output.status.success() {
        return Err(EngineError::ToolFailed {
            program: program.display().to_string(),
            status: output.status.to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }

    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

/// Spawn a detached player process with no stdio attached
pub(crate) fn spawn_quiet(program: &Path, args: &[String]) -> Result<Child> {
    Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .map_err(|e| EngineError::spawn(program, e))
}

/// Kill and reap a child, ignoring a child that already exited
pub(crate) fn terminate(mut child: Child) {
    if let Err(err) = child.kill() {
        tracing::debug!(pid = child.id(), error = %err, "kill failed");
    }
    if let Err(err) = child.wait() {
        tracing::debug!(pid = child.id(), error = %err, "wait failed");
    }
}
