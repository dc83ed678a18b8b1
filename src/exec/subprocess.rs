//! Subprocess execution with captured output
//!
//! Every external invocation blocks until the child exits. There is no
//! timeout: a hung child hangs the caller.

use std::ffi::OsStr;
use std::path::Path;
use std::process::{Command, ExitStatus};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};

/// Result of a subprocess execution
#[derive(Debug, Clone)]
pub struct CommandResult {
    /// Whether the command succeeded (exit code 0)
    pub success: bool,

    /// Process exit code
    pub exit_code: i32,

    /// Captured standard output
    pub stdout: String,

    /// Captured standard error
    pub stderr: String,

    /// Execution duration
    pub duration: Duration,
}

impl CommandResult {
    /// Create a CommandResult from an exit status
    pub fn from_status(
        status: ExitStatus,
        stdout: String,
        stderr: String,
        duration: Duration,
    ) -> Self {
        let exit_code = status.code().unwrap_or(-1);
        Self {
            success: status.success(),
            exit_code,
            stdout,
            stderr,
            duration,
        }
    }

    /// Standard output followed by standard error
    pub fn combined_output(&self) -> String {
        let mut out = String::with_capacity(self.stdout.len() + self.stderr.len());
        out.push_str(&self.stdout);
        out.push_str(&self.stderr);
        out
    }

    /// True when the child printed anything on either stream
    pub fn has_output(&self) -> bool {
        !self.stdout.trim().is_empty() || !self.stderr.trim().is_empty()
    }

    /// A silent, zero-exit run. Any diagnostic output counts as failure.
    pub fn is_clean(&self) -> bool {
        self.success && !self.has_output()
    }
}

/// Run a prepared command, capturing both output streams
pub fn run_command(cmd: &mut Command) -> Result<CommandResult> {
    let program = cmd.get_program().to_string_lossy().to_string();
    let start = Instant::now();

    let output = cmd
        .output()
        .with_context(|| format!("Failed to execute {}", program))?;

    let duration = start.elapsed();
    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();

    Ok(CommandResult::from_status(
        output.status,
        stdout,
        stderr,
        duration,
    ))
}

/// Run a `/bin/sh -c` script in `working_dir`
///
/// Extra `args` are exposed to the script as `$1`, `$2`, ... so paths never
/// need quoting inside the script text.
pub fn run_shell<I, S>(working_dir: &Path, script: &str, args: I) -> Result<CommandResult>
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    if script.trim().is_empty() {
        anyhow::bail!("empty command");
    }

    let mut cmd = Command::new("/bin/sh");
    cmd.arg("-c").arg(script).arg("sh").args(args).current_dir(working_dir);
    tracing::debug!(dir = %working_dir.display(), script, "running shell command");
    run_command(&mut cmd)
}
