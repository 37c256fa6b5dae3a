//! Command runner port for invoking external tools.

use std::path::Path;
use std::time::Duration;

use thiserror::Error;

/// Why an external command produced no usable output.
#[derive(Debug, Error)]
pub enum RunError {
    /// The executable could not be found on `PATH`.
    #[error("command not found: {command}")]
    NotFound {
        /// The command that was looked up.
        command: String,
    },
    /// The process could not be started.
    #[error("failed to run {command}: {source}")]
    Spawn {
        /// The command that failed to start.
        command: String,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// The process ran but exited unsuccessfully.
    #[error("{command} exited with status {}", exit_label(.code))]
    Exit {
        /// The command that failed.
        command: String,
        /// Exit code, if the process was not killed by a signal.
        code: Option<i32>,
        /// Captured standard output (trimmed).
        stdout: String,
        /// Captured standard error (trimmed).
        stderr: String,
    },
    /// The process exceeded its deadline and was killed.
    #[error("{command} timed out after {}s", .timeout.as_secs())]
    TimedOut {
        /// The command that timed out.
        command: String,
        /// The deadline that was exceeded.
        timeout: Duration,
    },
    /// A scripted or replayed runner had no answer for this command.
    #[error("{0}")]
    Scripted(String),
}

fn exit_label(code: &Option<i32>) -> String {
    code.map_or_else(|| "signal".to_string(), |c| c.to_string())
}

impl RunError {
    /// Diagnostic text a failing process left behind, stdout first.
    ///
    /// Empty for every variant other than [`RunError::Exit`].
    #[must_use]
    pub fn diagnostics(&self) -> String {
        match self {
            Self::Exit { stdout, stderr, .. } => [stdout.as_str(), stderr.as_str()]
                .into_iter()
                .filter(|part| !part.is_empty())
                .collect::<Vec<_>>()
                .join("\n"),
            _ => String::new(),
        }
    }
}

/// Runs external commands and captures their standard output.
///
/// All tool access (git, bd, bv, gh, build tools) goes through this trait so
/// prompt assembly can be exercised against a lookup table instead of real
/// processes.
pub trait CommandRunner: Send + Sync {
    /// Runs `command` with `args` in `dir` and returns trimmed stdout.
    ///
    /// # Errors
    ///
    /// Returns an error if the process cannot be spawned or exits unsuccessfully.
    fn run(&self, dir: &Path, command: &str, args: &[&str]) -> Result<String, RunError>;

    /// Like [`CommandRunner::run`], but resolves `command` on `PATH` first and
    /// kills the process once `timeout` elapses.
    ///
    /// # Errors
    ///
    /// Returns an error if the command is not on `PATH`, cannot be spawned,
    /// exits unsuccessfully, or times out.
    fn run_with_timeout(
        &self,
        dir: &Path,
        timeout: Duration,
        command: &str,
        args: &[&str],
    ) -> Result<String, RunError>;
}

/// Renders a command and its arguments as a single space-separated line.
///
/// This is the key scripted runners and cassettes use to identify a call.
#[must_use]
pub fn command_line(command: &str, args: &[&str]) -> String {
    std::iter::once(command).chain(args.iter().copied()).collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_line_joins_with_spaces() {
        assert_eq!(command_line("git", &["log", "-5", "--oneline"]), "git log -5 --oneline");
        assert_eq!(command_line("bd", &[]), "bd");
    }

    #[test]
    fn diagnostics_combine_stdout_and_stderr() {
        let err = RunError::Exit {
            command: "go".into(),
            code: Some(1),
            stdout: "out".into(),
            stderr: "./main.go:3: undefined: x".into(),
        };
        assert_eq!(err.diagnostics(), "out\n./main.go:3: undefined: x");
    }

    #[test]
    fn diagnostics_empty_for_timeouts() {
        let err = RunError::TimedOut { command: "go".into(), timeout: Duration::from_secs(30) };
        assert!(err.diagnostics().is_empty());
        assert_eq!(err.to_string(), "go timed out after 30s");
    }
}
